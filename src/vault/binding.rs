//! Directory bindings: which profiles load automatically in a directory.
//!
//! Each bound directory gets `persist/<first 16 hex of sha256(dir)>.mapping`
//! holding one profile name per line. Only names are stored; nothing here
//! decrypts or touches secret values.
//!
//! Lookups are exact-path: a binding on `/work` does not apply in
//! `/work/sub`.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::crypto::encoding::short_hash;
use crate::errors::{AkError, Result};

use super::profile::{dedup_keep_first, read_name_list, validate_profile_name, write_name_list};
use super::secure_fs;
use super::store::VaultStore;

/// Mapping file for `dir`. `dir` must be absolute; it is normalized
/// lexically (`.`/`..` removed, trailing slash dropped) before hashing.
pub fn mapping_file_for_dir(config: &Config, dir: &Path) -> Result<PathBuf> {
    if !dir.is_absolute() {
        return Err(AkError::InvalidDirectory(dir.to_path_buf()));
    }
    let normalized = normalize_path(dir);
    let hash = short_hash(normalized.to_string_lossy().as_bytes());
    Ok(config.persist_dir.join(format!("{hash}.mapping")))
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl VaultStore {
    /// Profiles bound to `dir`. Unbound → empty list.
    pub fn read_dir_profiles(&self, dir: &Path) -> Result<Vec<String>> {
        read_name_list(&mapping_file_for_dir(&self.config, dir)?)
    }

    /// Replace the profiles bound to `dir`. An empty list removes the binding.
    pub fn write_dir_profiles(&self, dir: &Path, profiles: &[String]) -> Result<()> {
        for name in profiles {
            validate_profile_name(name)?;
        }
        let path = mapping_file_for_dir(&self.config, dir)?;

        if profiles.is_empty() {
            secure_fs::remove_if_exists(&path)?;
        } else {
            write_name_list(&path, &dedup_keep_first(profiles))?;
        }

        tracing::debug!(dir = %dir.display(), count = profiles.len(), "directory binding written");
        Ok(())
    }

    /// Append `profile` to the binding of `dir` if absent.
    /// Returns `true` if it was added.
    pub fn bind_dir_profile(&self, dir: &Path, profile: &str) -> Result<bool> {
        validate_profile_name(profile)?;
        let mut profiles = self.read_dir_profiles(dir)?;
        if profiles.iter().any(|p| p == profile) {
            return Ok(false);
        }
        profiles.push(profile.to_string());
        self.write_dir_profiles(dir, &profiles)?;
        self.audit.record("bind", &[profile]);
        Ok(true)
    }

    /// Remove `profiles` from the binding of `dir`; an empty slice removes
    /// all of them. Returns the names that were removed.
    pub fn unbind_dir_profiles(&self, dir: &Path, profiles: &[String]) -> Result<Vec<String>> {
        let current = self.read_dir_profiles(dir)?;
        if current.is_empty() {
            return Ok(Vec::new());
        }

        let (removed, kept): (Vec<String>, Vec<String>) = if profiles.is_empty() {
            (current, Vec::new())
        } else {
            current.into_iter().partition(|p| profiles.contains(p))
        };

        if !removed.is_empty() {
            self.write_dir_profiles(dir, &kept)?;
            let refs: Vec<&str> = removed.iter().map(String::as_str).collect();
            self.audit.record("unbind", &refs);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> VaultStore {
        VaultStore::new(Config::at(dir.path()).unwrap())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mapping_file_is_hashed_under_persist_dir() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::at(dir.path()).unwrap();

        let path = mapping_file_for_dir(&cfg, Path::new("/home/user/project")).unwrap();
        assert_eq!(path.parent(), Some(cfg.persist_dir.as_path()));
        let file = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(file, format!("{}.mapping", short_hash(b"/home/user/project")));
    }

    #[test]
    fn equivalent_spellings_share_a_mapping() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::at(dir.path()).unwrap();
        let a = mapping_file_for_dir(&cfg, Path::new("/home/user/project")).unwrap();
        let b = mapping_file_for_dir(&cfg, Path::new("/home/user/./other/../project/")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::at(dir.path()).unwrap();
        let err = mapping_file_for_dir(&cfg, Path::new("relative/dir")).unwrap_err();
        assert!(matches!(err, AkError::InvalidDirectory(_)));
    }

    #[test]
    fn bind_appends_once_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let project = Path::new("/srv/project");

        assert!(store.bind_dir_profile(project, "work").unwrap());
        assert!(store.bind_dir_profile(project, "db").unwrap());
        assert!(!store.bind_dir_profile(project, "work").unwrap());
        assert_eq!(store.read_dir_profiles(project).unwrap(), names(&["work", "db"]));
    }

    #[test]
    fn bindings_are_exact_path() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.bind_dir_profile(Path::new("/srv/project"), "work").unwrap();
        assert!(store
            .read_dir_profiles(Path::new("/srv/project/sub"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unbind_some_or_all() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let project = Path::new("/srv/project");
        store
            .write_dir_profiles(project, &names(&["a", "b", "c"]))
            .unwrap();

        let removed = store.unbind_dir_profiles(project, &names(&["b"])).unwrap();
        assert_eq!(removed, names(&["b"]));
        assert_eq!(store.read_dir_profiles(project).unwrap(), names(&["a", "c"]));

        let removed = store.unbind_dir_profiles(project, &[]).unwrap();
        assert_eq!(removed, names(&["a", "c"]));
        assert!(!mapping_file_for_dir(store.config(), project).unwrap().exists());
    }

    #[test]
    fn binding_rejects_bad_profile_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store
            .bind_dir_profile(Path::new("/srv/project"), "../escape")
            .is_err());
    }
}

//! Audit log: append-only text trail of vault operations.
//!
//! Each operation appends one line to `<config_dir>/audit.log`:
//!
//! ```text
//! 2026-01-31T12:00:00Z action=set instance=abc123... count=1 keys=3f2a9c...
//! ```
//!
//! Key names are never written; only their SHA-256 pseudonyms (first 16 hex
//! characters) appear. Recording is fire-and-forget: a failed append is
//! logged through `tracing` and the operation continues.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::crypto::hash_key_name;
use crate::errors::{AkError, Result};
use crate::vault::secure_fs;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Serializes appends from threads of this process.
static APPEND_LOCK: Mutex<()> = Mutex::new(());

/// A parsed audit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub instance: String,
    pub count: usize,
    /// Hashed key names.
    pub keys: Vec<String>,
}

impl AuditEntry {
    /// Parse one line written by [`format_entry`]. Returns `None` for lines
    /// that do not follow the format.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let ts = fields.next()?;
        let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
            .ok()?
            .and_utc();

        let mut action = None;
        let mut instance = None;
        let mut count = None;
        let mut keys = Vec::new();

        for field in fields {
            let (k, v) = field.split_once('=')?;
            match k {
                "action" => action = Some(v.to_string()),
                "instance" => instance = Some(v.to_string()),
                "count" => count = v.parse().ok(),
                "keys" => {
                    keys = v
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                _ => {}
            }
        }

        Some(Self {
            timestamp,
            action: action?,
            instance: instance?,
            count: count?,
            keys,
        })
    }
}

/// Render one audit line (without trailing newline).
pub fn format_entry(
    timestamp: DateTime<Utc>,
    action: &str,
    instance: &str,
    key_names: &[&str],
) -> String {
    let mut line = format!(
        "{} action={action} instance={instance} count={}",
        timestamp.format(TIMESTAMP_FORMAT),
        key_names.len()
    );
    if !key_names.is_empty() {
        let hashed: Vec<String> = key_names.iter().map(|k| hash_key_name(k)).collect();
        line.push_str(" keys=");
        line.push_str(&hashed.join(","));
    }
    line
}

/// Handle to the audit log file. `path == None` means auditing is disabled.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: Option<PathBuf>,
    instance_id: String,
}

impl AuditLog {
    pub fn new(path: Option<PathBuf>, instance_id: impl Into<String>) -> Self {
        Self {
            path,
            instance_id: instance_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.audit_log_path.clone(), config.instance_id.clone())
    }

    /// An audit log that records nothing.
    pub fn disabled() -> Self {
        Self::new(None, String::new())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append an entry, ignoring failures.
    pub fn record(&self, action: &str, key_names: &[&str]) {
        if let Err(e) = self.try_record(action, key_names) {
            tracing::warn!(action, error = %e, "failed to write audit entry");
        }
    }

    /// Append an entry, reporting failures.
    pub fn try_record(&self, action: &str, key_names: &[&str]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let line = format_entry(Utc::now(), action, &self.instance_id, key_names);

        let _guard = APPEND_LOCK
            .lock()
            .map_err(|_| AkError::CommandFailed("audit lock poisoned".into()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            secure_fs::ensure_secure_dir(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        // Single write of the whole line so O_APPEND keeps lines intact
        // across processes.
        file.write_all(format!("{line}\n").as_bytes())?;

        tracing::debug!(action, count = key_names.len(), "audit entry recorded");
        Ok(())
    }

    /// The last `limit` entries, oldest first, optionally only those at or
    /// after `since`. Unparseable lines are skipped.
    pub fn tail(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<AuditEntry> = text
            .lines()
            .filter_map(AuditEntry::parse)
            .filter(|e| since.map_or(true, |s| e.timestamp >= s))
            .collect();

        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn log_in(dir: &TempDir) -> AuditLog {
        AuditLog::new(Some(dir.path().join("audit.log")), "testinstance")
    }

    #[test]
    fn format_matches_line_layout() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let line = format_entry(ts, "set", "inst", &["API_KEY"]);
        assert_eq!(
            line,
            format!(
                "2026-01-31T12:00:00Z action=set instance=inst count=1 keys={}",
                hash_key_name("API_KEY")
            )
        );
    }

    #[test]
    fn format_without_keys_omits_field() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let line = format_entry(ts, "list", "inst", &[]);
        assert!(line.ends_with("count=0"));
        assert!(!line.contains("keys="));
    }

    #[test]
    fn names_never_appear_in_plaintext() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        log.record("set", &["SUPER_SECRET_NAME", "OTHER_NAME"]);

        let text = fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(!text.contains("SUPER_SECRET_NAME"));
        assert!(!text.contains("OTHER_NAME"));
        assert!(text.contains(&hash_key_name("SUPER_SECRET_NAME")));
        assert!(text.contains("count=2"));
    }

    #[test]
    fn record_appends_and_tail_returns_latest() {
        let dir = TempDir::new().unwrap();
        let log = log_in(&dir);
        for action in ["set", "get", "rm"] {
            log.record(action, &["K"]);
        }

        let entries = log.tail(2, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "get");
        assert_eq!(entries[1].action, "rm");
        assert_eq!(entries[1].instance, "testinstance");
        assert_eq!(entries[1].keys, vec![hash_key_name("K")]);
    }

    #[test]
    fn tail_filters_by_since() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        fs::write(
            &path,
            format!(
                "{}\n{}\n",
                format_entry(old, "set", "i", &[]),
                format_entry(new, "get", "i", &[])
            ),
        )
        .unwrap();

        let log = AuditLog::new(Some(path), "i");
        let since = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let entries = log.tail(10, Some(since)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "get");
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = AuditLog::disabled();
        assert!(!log.is_enabled());
        log.try_record("set", &["A"]).unwrap();
        assert!(log.tail(10, None).unwrap().is_empty());
    }

    #[test]
    fn missing_file_tails_empty() {
        let dir = TempDir::new().unwrap();
        assert!(log_in(&dir).tail(5, None).unwrap().is_empty());
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let line = "not an audit line";
        assert!(AuditEntry::parse(line).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn audit_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        log_in(&dir).record("set", &["A"]);
        let mode = fs::metadata(dir.path().join("audit.log"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

use crate::store::{check_size, KeyValueStore, StoreError, WriteOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Cookie {
    value: String,
    path: String,
    expires_at: DateTime<Utc>,
}

/// File-backed store with cookie semantics: every value carries a path and
/// an expiry, and expired values read as absent.
///
/// The file is replaced atomically on write. A jar that fails to parse is
/// copied to `<file>.corrupt` and reported from `read`.
#[derive(Debug)]
pub struct CookieJar {
    file: PathBuf,
    max_value_bytes: Option<usize>,
}

impl CookieJar {
    pub fn open(file: impl Into<PathBuf>) -> Self {
        CookieJar {
            file: file.into(),
            max_value_bytes: None,
        }
    }

    pub fn with_max_value_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_value_bytes = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.file.with_file_name(name)
    }

    fn load(&self) -> Result<BTreeMap<String, Cookie>, StoreError> {
        let raw = match fs::read_to_string(&self.file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %self.file.display(), "no cookie jar yet");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|source| {
            let backup = self.back_up();
            error!(file = %self.file.display(), error = %source, "cookie jar is corrupt");
            StoreError::Corrupt {
                file: self.file.clone(),
                backup,
                source,
            }
        })
    }

    fn back_up(&self) -> Option<PathBuf> {
        let backup = self.backup_path();
        match fs::copy(&self.file, &backup) {
            Ok(_) => Some(backup),
            Err(e) => {
                warn!(backup = %backup.display(), error = %e, "could not keep a copy of the corrupt jar");
                None
            }
        }
    }

    fn read_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, StoreError> {
        let mut cookies = self.load()?;
        Ok(match cookies.remove(key) {
            Some(cookie) if cookie.expires_at > now => Some(cookie.value),
            Some(_) => {
                debug!(key, "cookie expired");
                None
            }
            None => None,
        })
    }

    fn write_at(
        &mut self,
        key: &str,
        value: &str,
        options: &WriteOptions,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        check_size(key, value, self.max_value_bytes)?;

        let mut cookies = match self.load() {
            Ok(cookies) => cookies,
            Err(StoreError::Corrupt { .. }) => {
                warn!(file = %self.file.display(), "replacing corrupt cookie jar");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        cookies.retain(|_, cookie| cookie.expires_at > now);
        cookies.insert(
            key.to_string(),
            Cookie {
                value: value.to_string(),
                path: options.path.clone(),
                expires_at: now + options.max_age,
            },
        );

        let dir = match self.file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let serialized = serde_json::to_string_pretty(&cookies)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.file).map_err(|e| e.error)?;
        debug!(key, bytes = value.len(), "cookie written");
        Ok(())
    }
}

impl KeyValueStore for CookieJar {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read_at(key, Utc::now())
    }

    fn write(&mut self, key: &str, value: &str, options: &WriteOptions) -> Result<(), StoreError> {
        self.write_at(key, value, options, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use crate::page_store::{LoadOutcome, PAGES_KEY};
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopening() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("cookies.json");

        let mut jar = CookieJar::open(&file);
        jar.write("journalPages", "[]", &WriteOptions::long_lived())
            .unwrap();

        let reopened = CookieJar::open(&file);
        assert_eq!(
            reopened.read("journalPages").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(reopened.read("other").unwrap(), None);
    }

    #[test]
    fn expired_values_read_as_absent() {
        let dir = tempdir().unwrap();
        let mut jar = CookieJar::open(dir.path().join("cookies.json"));
        let written = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let options = WriteOptions {
            path: "/".to_string(),
            max_age: Duration::seconds(60),
        };
        jar.write_at("k", "v", &options, written).unwrap();

        assert_eq!(
            jar.read_at("k", written + Duration::seconds(59))
                .unwrap()
                .as_deref(),
            Some("v")
        );
        assert_eq!(
            jar.read_at("k", written + Duration::seconds(60)).unwrap(),
            None
        );
    }

    #[test]
    fn corrupt_file_is_reported_and_kept() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cookies.json");
        fs::write(&file, "{\"journalPages\": {\"value\": \"[{\\\"id\\\"").unwrap();

        let mut jar = CookieJar::open(&file);
        let err = jar.read("k").unwrap_err();
        match err {
            StoreError::Corrupt { backup, .. } => {
                assert_eq!(backup.as_deref(), Some(jar.backup_path().as_path()));
            }
            other => panic!("unexpected error: {other}"),
        }
        let kept = fs::read_to_string(jar.backup_path()).unwrap();
        assert!(kept.starts_with("{\"journalPages\""));

        jar.write("k", "v", &WriteOptions::long_lived()).unwrap();
        assert_eq!(jar.read("k").unwrap().as_deref(), Some("v"));
        assert!(jar.backup_path().exists());
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let mut jar = CookieJar::open(dir.path().join("cookies.json"));
        jar.write("a", "1", &WriteOptions::long_lived()).unwrap();
        jar.write("b", "2", &WriteOptions::long_lived()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cookies.json")]);
    }

    #[test]
    fn oversized_write_leaves_previous_value() {
        let dir = tempdir().unwrap();
        let mut jar = CookieJar::open(dir.path().join("cookies.json")).with_max_value_bytes(Some(3));
        jar.write("k", "abc", &WriteOptions::long_lived()).unwrap();

        let err = jar.write("k", "abcd", &WriteOptions::long_lived()).unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLarge { .. }));
        assert_eq!(jar.read("k").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn journal_survives_restart() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cookies.json");
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();

        let (mut journal, outcome) = Journal::load(CookieJar::open(&file), None);
        assert!(matches!(outcome, LoadOutcome::Empty));
        let (first, _) = journal.add_page_at(now);
        let _ = journal.update_page(first, "first page");
        assert!(journal.save_page().unwrap().is_written());
        let (second, written) = journal.add_page_at(now + Duration::minutes(5));
        assert!(written.is_written());
        let before = journal.pages().to_vec();
        drop(journal);

        let (journal, outcome) = Journal::load(CookieJar::open(&file), None);
        assert!(matches!(outcome, LoadOutcome::Restored(2)));
        assert_eq!(journal.pages(), &before[..]);
        assert_eq!(journal.page(first).unwrap().content, "first page");
        assert_eq!(journal.page(second).unwrap().content, "");
    }

    #[test]
    fn truncated_jar_is_not_mistaken_for_empty() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cookies.json");
        let (mut journal, _) = Journal::load(CookieJar::open(&file), None);
        let _ = journal.add_page_at(Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap());
        drop(journal);

        let full = fs::read_to_string(&file).unwrap();
        fs::write(&file, &full[..full.len() / 2]).unwrap();

        let (journal, outcome) = Journal::load(CookieJar::open(&file), None);
        assert!(matches!(
            outcome,
            LoadOutcome::Unavailable(StoreError::Corrupt { .. })
        ));
        assert!(journal.pages().is_empty());
        assert_eq!(
            fs::read_to_string(CookieJar::open(&file).backup_path()).unwrap(),
            full[..full.len() / 2]
        );
        assert!(CookieJar::open(&file)
            .read(PAGES_KEY)
            .is_err());
    }
}

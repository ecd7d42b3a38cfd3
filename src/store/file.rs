//! FileStore - session keys in a small JSON file (native)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{SessionStore, StoreError, StoreResult};
use crate::core::paths::env;

const FILE_NAME: &str = "session.json";

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$BEECONNECT_ROOT/<app>/session.json`, else under the platform data dir.
    pub fn for_app(app: &str) -> StoreResult<Self> {
        let root = match std::env::var_os(env::ROOT) {
            Some(root) => PathBuf::from(root),
            None => dirs::data_dir()
                .ok_or_else(|| StoreError::Unavailable("no data directory".into()))?
                .join("beeconnect"),
        };
        Ok(Self::new(root.join(app).join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StoreResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn persists_across_instances() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("app").join(FILE_NAME);

        FileStore::new(&path).set("connectedAccount", "0xab").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("connectedAccount").unwrap().as_deref(), Some("0xab"));
        assert_eq!(reopened.get("connectedChain").unwrap(), None);
    }

    #[test]
    fn removing_last_key_deletes_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileStore::new(dir.path().join(FILE_NAME));
        store.set("connectedAccount", "0xab").unwrap();
        assert!(store.path().exists());
        store.remove("connectedAccount").unwrap();
        assert!(!store.path().exists());
        store.remove("connectedAccount").unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::new(&path).get("connectedAccount"), Err(StoreError::Serialization(_))));
    }
}

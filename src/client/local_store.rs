use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

const STORE_FILE: &str = "local_storage.json";

/// Per-profile string key/value store persisted as one JSON object, so values
/// survive restarts of the admin client the way browser local storage does.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn open(profile_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(profile_dir)?;
        Ok(Self { path: profile_dir.join(STORE_FILE), lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn read_all(&self) -> io::Result<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> io::Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let _g = self.lock.lock();
        self.read_all().ok()?.remove(key)
    }

    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let _g = self.lock.lock();
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        let _g = self.lock.lock();
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let tmp = tempdir().unwrap();
        let a = LocalStore::open(tmp.path()).unwrap();
        a.set("k", "v").unwrap();
        drop(a);
        let b = LocalStore::open(tmp.path()).unwrap();
        assert_eq!(b.get("k").as_deref(), Some("v"));
        b.remove("k").unwrap();
        assert_eq!(b.get("k"), None);
        // removing twice is fine
        b.remove("k").unwrap();
    }

    #[test]
    fn corrupt_file_reads_as_missing() {
        let tmp = tempdir().unwrap();
        let s = LocalStore::open(tmp.path()).unwrap();
        std::fs::write(s.path(), b"{not json").unwrap();
        assert_eq!(s.get("k"), None);
        assert!(s.set("k", "v").is_err());
    }
}

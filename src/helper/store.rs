use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Keyed-bytes store with ordered prefix iteration. The chain-side keeper
/// lays out queries, datapoints and height counters under key prefixes on
/// top of this.
pub trait Store {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&mut self, key: &[u8], value: &[u8]);
    fn remove(&mut self, key: &[u8]);
    /// All entries whose key starts with `prefix`, in key order.
    fn prefix_iter(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Sled-backed store, one named database per concern under the app home.
pub struct DefaultStore {
    db: sled::Db,
}

impl DefaultStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let db = sled::open(path).expect("unable to open database");
        Self { db }
    }
}

impl Store for DefaultStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.db.get(key) {
            Ok(Some(value)) => Some(value.to_vec()),
            _ => None,
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        let _ = self.db.insert(key, value);
    }

    fn remove(&mut self, key: &[u8]) {
        let _ = self.db.remove(key);
    }

    fn prefix_iter(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.db
            .scan_prefix(prefix)
            .filter_map(|entry| entry.ok())
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect()
    }
}

/// In-memory store used by tests and single-process hosts.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
    }

    fn remove(&mut self, key: &[u8]) {
        self.inner.lock().unwrap().remove(key);
    }

    fn prefix_iter(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner
            .lock()
            .unwrap()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_store_prefix_iter_is_ordered() {
        let mut store = MemStore::new();
        store.set(b"queries/b", b"2");
        store.set(b"queries/a", b"1");
        store.set(b"datapoints/x", b"9");
        store.set(b"queries/c", b"3");

        let entries = store.prefix_iter(b"queries/");
        let keys: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"queries/a"[..], b"queries/b", b"queries/c"]);
    }

    #[test]
    fn test_mem_store_remove() {
        let mut store = MemStore::new();
        store.set(b"k", b"v");
        assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
        store.remove(b"k");
        assert_eq!(store.get(b"k"), None);
    }
}

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A small expiring cache. The relayer uses one for the query-id dedup
/// window, the per-chain current-height lookups, and connection-to-client-id
/// resolution.
pub struct TtlCache<V> {
    inner: Mutex<BTreeMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut map = self.inner.lock().unwrap();
        match map.get(key) {
            Some((expiry, value)) if *expiry > Instant::now() => Some(value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut map = self.inner.lock().unwrap();
        map.insert(key.to_string(), (Instant::now() + ttl, value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

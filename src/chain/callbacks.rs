use std::collections::BTreeMap;

use super::error::Error;
use crate::proto::interchainquery::v1::Query;

/// The callback contract implemented by consumer modules. A module exposes a
/// set of named callbacks; the verifier invokes the one named by the query
/// when a response is accepted. Returning [`Error::SucceededNoDelete`]
/// signals that the callback re-issued the query and the registry must keep
/// the record alive.
pub trait QueryCallbacks: Send + Sync {
    fn has(&self, id: &str) -> bool;
    fn call(&self, id: &str, payload: &[u8], query: &Query) -> Result<(), Error>;
}

/// Per-module callback registry. Populated once at startup; a module may
/// register at most once. The registry outlives all registrants.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: BTreeMap<String, Box<dyn QueryCallbacks>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: &str, handler: Box<dyn QueryCallbacks>) -> Result<(), Error> {
        if self.handlers.contains_key(module) {
            return Err(Error::DuplicateCallbackHandler(module.to_string()));
        }
        self.handlers.insert(module.to_string(), handler);
        Ok(())
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.handlers.contains_key(module)
    }

    pub fn module(&self, module: &str) -> Option<&dyn QueryCallbacks> {
        self.handlers.get(module).map(|h| h.as_ref())
    }

    /// Modules in deterministic (name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn QueryCallbacks)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

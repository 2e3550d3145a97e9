use std::sync::Arc;

use prost::Message;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::callbacks::{CallbackRegistry, QueryCallbacks};
use super::error::Error;
use super::proof::ClientKeeper;
use crate::helper::store::Store;
use crate::proto::interchainquery::v1::{DataPoint, Query};

pub const KEY_PREFIX_QUERY: &[u8] = b"queries/";
pub const KEY_PREFIX_DATA: &[u8] = b"datapoints/";
pub const KEY_PREFIX_LATEST_HEIGHT: &[u8] = b"heights/";

/// Deterministic query identity. Registering the same request twice yields
/// the same id, which is what makes registration idempotent.
pub fn generate_query_hash(
    connection_id: &str,
    chain_id: &str,
    query_type: &str,
    request: &[u8],
    module: &str,
    callback_id: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(module.as_bytes());
    hasher.update(connection_id.as_bytes());
    hasher.update(chain_id.as_bytes());
    hasher.update(query_type.as_bytes());
    hasher.update(callback_id.as_bytes());
    hasher.update(request);
    hex::encode(hasher.finalize())
}

/// Keeper of the query registry: the durable store of Query records, the
/// DataPoint cache, per-chain latest-height counters, and the sealed
/// callback registry.
pub struct Keeper<S: Store> {
    store: S,
    callbacks: CallbackRegistry,
    clients: Arc<dyn ClientKeeper>,
}

impl<S: Store> Keeper<S> {
    pub fn new(store: S, clients: Arc<dyn ClientKeeper>) -> Self {
        Self {
            store,
            callbacks: CallbackRegistry::new(),
            clients,
        }
    }

    /// Register a consumer module's callbacks. Called once per module at
    /// startup; a second registration for the same module is a fatal
    /// configuration error surfaced as `Err`.
    pub fn set_callback_handler(
        &mut self,
        module: &str,
        handler: Box<dyn QueryCallbacks>,
    ) -> Result<(), Error> {
        self.callbacks.register(module, handler)
    }

    pub(crate) fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub(crate) fn clients(&self) -> Arc<dyn ClientKeeper> {
        self.clients.clone()
    }

    /// Register an interchain query, or re-arm an existing one.
    ///
    /// Registering against an unregistered module or callback id panics:
    /// that is a code defect in the consumer module, not a runtime
    /// condition.
    #[allow(clippy::too_many_arguments)]
    pub fn make_request(
        &mut self,
        connection_id: &str,
        chain_id: &str,
        query_type: &str,
        request: &[u8],
        period: i64,
        module: &str,
        callback_id: &str,
        ttl: u64,
    ) {
        debug!(
            connection_id,
            chain_id,
            query_type,
            period,
            module,
            callback = callback_id,
            ttl,
            "MakeRequest"
        );
        let id = generate_query_hash(
            connection_id,
            chain_id,
            query_type,
            request,
            module,
            callback_id,
        );
        match self.get_query(&id) {
            None => {
                if !module.is_empty() && !callback_id.is_empty() {
                    match self.callbacks.module(module) {
                        Some(handler) if handler.has(callback_id) => {}
                        Some(_) => panic!(
                            "{}",
                            Error::UnknownCallback {
                                module: module.to_string(),
                                id: callback_id.to_string(),
                            }
                        ),
                        None => panic!("{}", Error::UnknownCallbackModule(module.to_string())),
                    }
                }
                let query = Query {
                    id,
                    connection_id: connection_id.to_string(),
                    chain_id: chain_id.to_string(),
                    query_type: query_type.to_string(),
                    request: request.to_vec(),
                    period,
                    last_height: 0,
                    callback_id: callback_id.to_string(),
                    ttl,
                    last_emission: 0,
                };
                self.set_query(query);
            }
            Some(mut existing) => {
                // a re-request of an existing query resets the height to
                // trigger an immediate re-fire.
                debug!(last_height = existing.last_height, "re-request");
                existing.last_height = 0;
                self.set_query(existing);
            }
        }
    }

    // Queries

    pub fn get_query(&self, id: &str) -> Option<Query> {
        let key = [KEY_PREFIX_QUERY, id.as_bytes()].concat();
        let bz = self.store.get(&key)?;
        Query::decode(bz.as_slice()).ok()
    }

    pub fn set_query(&mut self, query: Query) {
        let key = [KEY_PREFIX_QUERY, query.id.as_bytes()].concat();
        self.store.set(&key, &query.encode_to_vec());
    }

    pub fn delete_query(&mut self, id: &str) {
        let key = [KEY_PREFIX_QUERY, id.as_bytes()].concat();
        self.store.remove(&key);
    }

    /// Every stored query, in store key order.
    pub fn all_queries(&self) -> Vec<Query> {
        self.store
            .prefix_iter(KEY_PREFIX_QUERY)
            .iter()
            .filter_map(|(_, v)| Query::decode(v.as_slice()).ok())
            .collect()
    }

    /// Queries for `chain_id` that are currently unanswered: every one-shot
    /// query, every freshly-registered or re-armed query (`last_height` 0
    /// fires immediately), plus recurring queries due or overdue at
    /// `current_height`. This backs the relayer's backfill read.
    pub fn pending_queries(&self, chain_id: &str, current_height: u64) -> Vec<Query> {
        self.all_queries()
            .into_iter()
            .filter(|q| q.chain_id == chain_id)
            .filter(|q| {
                q.period < 0
                    || q.last_height == 0
                    || q.last_height + q.period as u64 <= current_height
            })
            .collect()
    }

    // Datapoints

    pub fn set_datapoint_for_id(
        &mut self,
        id: &str,
        result: &[u8],
        remote_height: u64,
        local_height: u64,
    ) {
        let mapping = DataPoint {
            id: id.to_string(),
            remote_height,
            local_height,
            value: result.to_vec(),
        };
        let key = [KEY_PREFIX_DATA, id.as_bytes()].concat();
        self.store.set(&key, &mapping.encode_to_vec());
    }

    pub fn get_datapoint_for_id(&self, id: &str) -> Result<DataPoint, Error> {
        let key = [KEY_PREFIX_DATA, id.as_bytes()].concat();
        let bz = self
            .store
            .get(&key)
            .ok_or_else(|| Error::DatapointNotFound(id.to_string()))?;
        DataPoint::decode(bz.as_slice()).map_err(|_| Error::DatapointNotFound(id.to_string()))
    }

    pub fn delete_datapoint(&mut self, id: &str) {
        let key = [KEY_PREFIX_DATA, id.as_bytes()].concat();
        self.store.remove(&key);
    }

    pub fn get_datapoint(
        &self,
        module: &str,
        connection_id: &str,
        chain_id: &str,
        query_type: &str,
        request: &[u8],
    ) -> Result<DataPoint, Error> {
        let id = generate_query_hash(connection_id, chain_id, query_type, request, module, "");
        self.get_datapoint_for_id(&id)
    }

    /// The cached result if present and fresh enough, otherwise fire a
    /// one-shot query for it and report that the data is on its way.
    #[allow(clippy::too_many_arguments)]
    pub fn get_datapoint_or_request(
        &mut self,
        module: &str,
        connection_id: &str,
        chain_id: &str,
        query_type: &str,
        request: &[u8],
        max_age: u64,
        current_height: u64,
    ) -> Result<DataPoint, Error> {
        match self.get_datapoint(module, connection_id, chain_id, query_type, request) {
            Err(_) => {
                self.make_request(connection_id, chain_id, query_type, request, -1, "", "", max_age);
                Err(Error::NoData)
            }
            Ok(val) => {
                if val.local_height < current_height.saturating_sub(max_age) {
                    self.make_request(
                        connection_id,
                        chain_id,
                        query_type,
                        request,
                        -1,
                        "",
                        "",
                        max_age,
                    );
                    return Err(Error::StaleData);
                }
                Ok(val)
            }
        }
    }

    // Heights

    pub fn set_latest_height(&mut self, chain_id: &str, height: u64) {
        let key = [KEY_PREFIX_LATEST_HEIGHT, chain_id.as_bytes()].concat();
        self.store.set(&key, &height.to_be_bytes());
    }

    pub fn get_latest_height(&self, chain_id: &str) -> u64 {
        let key = [KEY_PREFIX_LATEST_HEIGHT, chain_id.as_bytes()].concat();
        match self.store.get(&key) {
            Some(bz) if bz.len() == 8 => u64::from_be_bytes(bz.try_into().unwrap()),
            _ => 0,
        }
    }
}

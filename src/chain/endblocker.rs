use tracing::debug;

use super::events::{query_event, Event};
use super::keeper::Keeper;
use crate::helper::store::Store;

/// Re-emission cadence, in blocks, for one-shot queries that have not yet
/// received an accepted response.
pub const RETRY_INTERVAL: u64 = 25;

impl<S: Store> Keeper<S> {
    /// Once-per-block scan of the registry. Emits one event per due query
    /// and advances its `last_emission`; the whole block's emissions are
    /// returned as a single batch for the host to publish.
    ///
    /// Recurring queries fire on the exact block `last_height + period`; a
    /// missed exact block is caught by the relayer's backfill read, not
    /// re-fired here. One-shot queries keep re-emitting every
    /// [`RETRY_INTERVAL`] blocks until a response deletes them.
    ///
    /// This step only mutates local state and cannot fail in a way that
    /// should halt the block.
    pub fn end_blocker(&mut self, height: u64) -> Vec<Event> {
        let mut events = vec![];
        for mut query in self.all_queries() {
            let due = if query.period >= 0 {
                query.last_height + query.period as u64 == height
            } else {
                query.last_emission == 0 || query.last_emission + RETRY_INTERVAL <= height
            };
            if !due {
                continue;
            }

            debug!(id = %query.id, query_type = %query.query_type, height, "emitting query");
            events.push(query_event(&query));
            query.last_emission = height;
            self.set_query(query);
        }
        events
    }
}

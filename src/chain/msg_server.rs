use tracing::{debug, error};

use super::error::Error;
use super::events::{message_processed_event, Event};
use super::keeper::Keeper;
use super::proof::validate_proof_ops;
use crate::helper::store::Store;
use crate::proto::interchainquery::v1::MsgSubmitQueryResponse;

/// Query types exempt from the stale-result guard: both carry their own
/// verifiable material rather than a state proof at a fresh height.
const QUERY_TYPE_TX: &str = "tendermint.Tx";
const QUERY_TYPE_CLIENT_UPDATE: &str = "ibc.ClientUpdate";

impl<S: Store> Keeper<S> {
    /// Handle a submitted query response.
    ///
    /// Unknown queries and in-block duplicates are silent no-ops: racing
    /// relayers are expected and a single bad message must not fail a whole
    /// batch. Proof and callback failures fail this message only.
    pub fn submit_query_response(
        &mut self,
        msg: &MsgSubmitQueryResponse,
        block_height: u64,
    ) -> Result<Vec<Event>, Error> {
        let query = match self.get_query(&msg.query_id) {
            Some(q) => q,
            None => {
                debug!(query_id = %msg.query_id, "query not found");
                return Ok(vec![]);
            }
        };

        if msg.height < 0 {
            error!(height = msg.height, "negative height in message");
            return Err(Error::NegativeHeight(msg.height));
        }

        let latest = self.get_latest_height(&msg.chain_id);
        if latest > msg.height as u64
            && query.query_type != QUERY_TYPE_TX
            && query.query_type != QUERY_TYPE_CLIENT_UPDATE
        {
            error!(
                id = %query.id,
                query_type = %query.query_type,
                latest,
                msg_height = msg.height,
                "ignoring stale query result"
            );
            return Ok(vec![]);
        }

        // a response for this query was already accepted in this block
        if query.last_height == block_height {
            debug!(id = %query.id, query_type = %query.query_type, "ignoring duplicate query");
            return Ok(vec![]);
        }

        let path_parts: Vec<&str> = query.query_type.split('/').collect();
        let proof_required = path_parts.last() == Some(&"key");
        if proof_required {
            let store_prefix = path_parts.get(1).ok_or_else(|| {
                Error::ProofVerification(format!("malformed query type {}", query.query_type))
            })?;
            let proof_ops = msg
                .proof_ops
                .as_ref()
                .ok_or_else(|| Error::ProofVerification("missing proof ops".to_string()))?;
            let clients = self.clients();
            validate_proof_ops(
                clients.as_ref(),
                &query.connection_id,
                msg.height as u64,
                store_prefix,
                &query.request,
                &msg.result,
                proof_ops,
            )
            .map_err(|e| {
                error!(id = %query.id, query_type = %query.query_type, "failed to validate proof ops");
                e
            })?;
        }

        let mut no_delete = false;
        let mut callback_executed = false;
        if !query.callback_id.is_empty() {
            // only a single callback is expected per request
            for (_, handler) in self.callbacks().iter() {
                if handler.has(&query.callback_id) {
                    callback_executed = true;
                    match handler.call(&query.callback_id, &msg.result, &query) {
                        Ok(()) => {}
                        // the callback has re-issued the same query;
                        // suppress the deletion step below.
                        Err(Error::SucceededNoDelete) => no_delete = true,
                        Err(e) => {
                            error!(
                                error = %e,
                                query_id = %msg.query_id,
                                query_type = %query.query_type,
                                "error in callback"
                            );
                            return Err(e);
                        }
                    }
                    break;
                }
            }
        }

        if proof_required {
            self.set_latest_height(&msg.chain_id, msg.height as u64);
        }

        if !callback_executed && !query.callback_id.is_empty() {
            error!(
                callback_id = %query.callback_id,
                query_id = %msg.query_id,
                "callback expected but not found"
            );
            return Err(Error::MissingCallback(query.callback_id.clone()));
        }

        if query.ttl > 0 {
            self.set_datapoint_for_id(&query.id, &msg.result, msg.height as u64, block_height);
        }

        // delete non-repeating queries unless a re-query was raised, update
        // any other
        if query.period < 0 {
            if no_delete {
                let mut query = query;
                query.last_height = 0;
                self.set_query(query);
            } else {
                self.delete_query(&msg.query_id);
            }
        } else {
            let mut query = query;
            query.last_height = block_height;
            self.set_query(query);
        }

        Ok(vec![message_processed_event()])
    }
}

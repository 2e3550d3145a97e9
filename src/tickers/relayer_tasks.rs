use std::time::Duration;

use anyhow::anyhow;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{GetTxRequest, GetTxsEventRequest, OrderBy};
use prost::Message;
use tendermint_rpc::{Client, Paging};
use tendermint_proto::v0_34::crypto::{Proof as ProofProto, ProofOps};
use tendermint_proto::v0_34::types::TxProof;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::relayer::QueryJob;
use crate::app::relayer::{ChainClient, RelayMsg, Relayer};
use crate::helper::client_side;
use crate::proto::ibc::lightclients::tendermint::v1::Header;
use crate::proto::interchainquery::v1::{GetTxWithProofResponse, MsgSubmitQueryResponse};

const CURRENT_BLOCK_TTL: Duration = Duration::from_secs(6);
const CLIENT_ID_TTL: Duration = Duration::from_secs(3600);
const MAX_LIGHT_BLOCK_ATTEMPTS: u64 = 5;

const QUERY_TYPE_GET_TXS_EVENT: &str = "cosmos.tx.v1beta1.Service/GetTxsEvent";
const QUERY_TYPE_TX: &str = "tendermint.Tx";
const QUERY_TYPE_CLIENT_UPDATE: &str = "ibc.ClientUpdate";

/// Per-query-type execution strategy. Most types fall through to a raw
/// application-level query; a few named ones receive bespoke handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QueryStrategy {
    /// Rewrite pagination/ordering, then run the generic path.
    TxsEventRewrite,
    /// Fetch a transaction plus its block and bundle proof + header.
    TxWithProof,
    /// Refresh the light client only; settle with an empty result.
    ClientUpdateOnly,
    Generic,
}

impl QueryStrategy {
    pub fn for_type(query_type: &str) -> Self {
        match query_type {
            QUERY_TYPE_GET_TXS_EVENT => Self::TxsEventRewrite,
            QUERY_TYPE_TX => Self::TxWithProof,
            QUERY_TYPE_CLIENT_UPDATE => Self::ClientUpdateOnly,
            _ => Self::Generic,
        }
    }

    /// A query whose path ends in `key` is answered with a Merkle proof.
    pub fn needs_proof(query_type: &str) -> bool {
        query_type.split('/').next_back() == Some("key")
    }
}

/// Execute one query job end to end. Every failure is fatal to this job
/// only: the underlying query re-fires on its own schedule.
pub async fn do_request(relayer: &Relayer, mut job: QueryJob) {
    let Some(client) = relayer.client_for(&job.chain_id) else {
        return;
    };

    info!(query_type = %job.query_type, id = %job.query_id, height = job.height, "Handling request");

    // pin height 0 to the target's latest committed height minus one, and
    // never re-resolve it for the rest of the job's lifetime.
    if job.height == 0 {
        job.height = match current_height(relayer, client).await {
            Ok(height) => height,
            Err(e) => {
                error!(chain = %job.chain_id, "Could not resolve current height: {e}");
                return;
            }
        };
    }

    let prove = QueryStrategy::needs_proof(&job.query_type);

    match QueryStrategy::for_type(&job.query_type) {
        QueryStrategy::TxsEventRewrite => {
            if let Err(e) = rewrite_txs_event_request(&mut job) {
                error!(id = %job.query_id, "Failed to rewrite GetTxsEvent request: {e}");
                return;
            }
            debug!(id = %job.query_id, height = job.height, "Handling GetTxsEvents");
            run_generic_query(relayer, client, job, prove).await;
        }
        QueryStrategy::Generic => run_generic_query(relayer, client, job, prove).await,
        QueryStrategy::TxWithProof => run_tx_with_proof(relayer, client, job).await,
        QueryStrategy::ClientUpdateOnly => run_client_update(relayer, job).await,
    }
}

/// "Latest committed height minus one": old enough to be provable, young
/// enough to be fresh. Cached briefly per chain so an event batch resolves
/// against one height.
async fn current_height(relayer: &Relayer, client: &ChainClient) -> anyhow::Result<i64> {
    let cache_key = format!("currentblock/{}", client.chain_id);
    if let Some(height) = relayer.height_cache.get(&cache_key) {
        debug!(height, "using cached currentblock");
        return Ok(height);
    }

    let block = client.rpc.latest_block().await?;
    let committed = match block.block.last_commit.as_ref() {
        Some(commit) => commit.height.value() as i64,
        None => block.block.header.height.value() as i64,
    };
    let height = committed - 1;

    relayer
        .height_cache
        .set(&cache_key, height, CURRENT_BLOCK_TTL);
    debug!(height, "caching currentblock");
    Ok(height)
}

/// The chain binary's tx-event pagination and ordering are unreliable for
/// historic heights, so the relayer pins them here before executing.
pub(crate) fn rewrite_txs_event_request(job: &mut QueryJob) -> anyhow::Result<()> {
    let mut request = GetTxsEventRequest::decode(job.request.as_slice())?;
    request.order_by = OrderBy::Desc as i32;
    request.limit = 200;
    if let Some(pagination) = request.pagination.as_mut() {
        pagination.limit = 200;
    }
    job.request = request.encode_to_vec();
    Ok(())
}

async fn run_generic_query(relayer: &Relayer, client: &ChainClient, job: QueryJob, prove: bool) {
    let path = format!("/{}", job.query_type);
    let height = match tendermint::block::Height::try_from(job.height) {
        Ok(height) => height,
        Err(e) => {
            error!(id = %job.query_id, height = job.height, "invalid query height: {e}");
            return;
        }
    };

    let res = match client
        .rpc
        .abci_query(Some(path), job.request.clone(), Some(height), prove)
        .await
    {
        Ok(res) => res,
        Err(e) => {
            error!(query_type = %job.query_type, id = %job.query_id, "Failed in abci query: {e}");
            return;
        }
    };
    if res.code.is_err() {
        error!(query_type = %job.query_type, id = %job.query_id, "query failed: {}", res.log);
        return;
    }

    if prove {
        if res.proof.is_none() {
            error!(id = %job.query_id, "proof requested but response carries none");
            return;
        }
        // the update must precede the response in the same queue so the
        // verifier trusts the claimed height by the time it runs.
        if let Err(e) = enqueue_client_update(relayer, &job, res.height.value() as i64).await {
            error!(id = %job.query_id, "Could not get header: {e}");
            return;
        }
    }

    let msg = MsgSubmitQueryResponse {
        chain_id: job.chain_id.clone(),
        query_id: job.query_id.clone(),
        result: res.value.clone(),
        proof_ops: res.proof.as_ref().map(convert_proof_ops),
        height: res.height.value() as i64,
        from_address: relayer.sender().to_string(),
    };
    relayer.enqueue(&job.source_chain_id, RelayMsg::QueryResponse(msg));
}

async fn run_tx_with_proof(relayer: &Relayer, client: &ChainClient, job: QueryJob) {
    let request = match GetTxRequest::decode(job.request.as_slice()) {
        Ok(request) => request,
        Err(e) => {
            error!(id = %job.query_id, "undecodable tx request: {e}");
            return;
        }
    };
    let hash_bytes = match hex::decode(&request.hash) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(id = %job.query_id, "Could not decode hash: {e}");
            return;
        }
    };
    let hash = match tendermint::Hash::from_bytes(tendermint::hash::Algorithm::Sha256, &hash_bytes)
    {
        Ok(hash) => hash,
        Err(e) => {
            error!(id = %job.query_id, "invalid tx hash: {e}");
            return;
        }
    };

    let tx = match client.rpc.tx(hash, true).await {
        Ok(tx) => tx,
        Err(e) => {
            error!(id = %job.query_id, "Could not fetch proof: {e}");
            return;
        }
    };
    let Some(proof) = tx.proof else {
        error!(id = %job.query_id, "transaction response carries no proof");
        return;
    };
    let height = tx.height.value() as i64;

    let client_id = match resolve_client_id(relayer, &job.connection_id).await {
        Ok(client_id) => client_id,
        Err(e) => {
            error!(id = %job.query_id, "Could not get connection from chain: {e}");
            return;
        }
    };
    let header = match get_header(relayer, &job, &client_id, height - 1, true).await {
        Ok(Some(header)) => header,
        Ok(None) => {
            error!(id = %job.query_id, "no header for historic transaction");
            return;
        }
        Err(e) => {
            error!(id = %job.query_id, "Could not get header: {e}");
            return;
        }
    };

    let bundle = GetTxWithProofResponse {
        proof: Some(convert_tx_proof(&proof)),
        header: Some(header),
    };
    let msg = MsgSubmitQueryResponse {
        chain_id: job.chain_id.clone(),
        query_id: job.query_id.clone(),
        result: bundle.encode_to_vec(),
        proof_ops: None,
        height: 0,
        from_address: relayer.sender().to_string(),
    };
    relayer.enqueue(&job.source_chain_id, RelayMsg::QueryResponse(msg));
}

/// A pure light-client refresh: advance trust to the height named in the
/// request bytes, then settle the query with a synthetic empty result.
async fn run_client_update(relayer: &Relayer, job: QueryJob) {
    let bytes: [u8; 8] = match job.request.as_slice().try_into() {
        Ok(bytes) => bytes,
        Err(_) => {
            error!(id = %job.query_id, "client update request must be 8 bytes");
            return;
        }
    };
    let height = u64::from_be_bytes(bytes) as i64;

    if let Err(e) = enqueue_client_update(relayer, &job, height).await {
        error!(id = %job.query_id, "Could not get header: {e}");
        return;
    }

    let msg = MsgSubmitQueryResponse {
        chain_id: job.chain_id.clone(),
        query_id: job.query_id.clone(),
        result: vec![],
        proof_ops: Some(ProofOps::default()),
        height,
        from_address: relayer.sender().to_string(),
    };
    relayer.enqueue(&job.source_chain_id, RelayMsg::QueryResponse(msg));
}

async fn resolve_client_id(relayer: &Relayer, connection_id: &str) -> anyhow::Result<String> {
    let cache_key = format!("clientId/{connection_id}");
    if let Some(client_id) = relayer.client_id_cache.get(&cache_key) {
        return Ok(client_id);
    }
    let client_id =
        client_side::connection_client_id(&relayer.home_client().rpc, connection_id).await?;
    relayer
        .client_id_cache
        .set(&cache_key, client_id.clone(), CLIENT_ID_TTL);
    Ok(client_id)
}

/// Build and enqueue the light-client update backing a proof at
/// `proof_height`, unless the home chain already trusts far enough.
async fn enqueue_client_update(
    relayer: &Relayer,
    job: &QueryJob,
    proof_height: i64,
) -> anyhow::Result<()> {
    let client_id = resolve_client_id(relayer, &job.connection_id).await?;
    let Some(header) = get_header(relayer, job, &client_id, proof_height, false).await? else {
        return Ok(());
    };

    let update_height = header
        .signed_header
        .as_ref()
        .and_then(|sh| sh.header.as_ref())
        .map(|h| h.height as u64)
        .unwrap_or_default();

    relayer.enqueue(
        &job.source_chain_id,
        RelayMsg::ClientUpdate {
            client_id,
            header,
            signer: relayer.sender().to_string(),
            height: update_height,
        },
    );
    Ok(())
}

/// Assemble the header advancing trust to `request_height + 1`: the new
/// light block plus the validator set at the currently trusted height.
/// Returns `None` when trust is already sufficient (skipping the update is
/// an optimization; the verifier re-checks trust independently).
async fn get_header(
    relayer: &Relayer,
    job: &QueryJob,
    client_id: &str,
    request_height: i64,
    historic_ok: bool,
) -> anyhow::Result<Option<Header>> {
    let state = client_side::client_state(&relayer.home_client().rpc, client_id).await?;
    let trusted_height = state
        .latest_height
        .ok_or_else(|| anyhow!("client {client_id} has no latest height"))?;

    if !historic_ok && trusted_height.revision_height >= (request_height + 1) as u64 {
        debug!(client = %client_id, "trusted height >= request height");
        return Ok(None);
    }

    let target = relayer
        .client_for(&job.chain_id)
        .ok_or_else(|| anyhow!("no client for chain {}", job.chain_id))?;

    info!(height = request_height + 1, "Fetching client update for height");
    let new_block = retry_light_block(target, request_height + 1, MAX_LIGHT_BLOCK_ATTEMPTS).await?;
    let trusted_block = retry_light_block(
        target,
        trusted_height.revision_height as i64 + 1,
        MAX_LIGHT_BLOCK_ATTEMPTS,
    )
    .await?;

    Ok(Some(Header {
        signed_header: Some(new_block.signed_header.into()),
        validator_set: Some(new_block.validators.into()),
        trusted_height: Some(trusted_height),
        trusted_validators: Some(trusted_block.validators.into()),
    }))
}

pub(crate) struct LightBlock {
    pub signed_header: tendermint::block::signed_header::SignedHeader,
    pub validators: tendermint::validator::Set,
}

/// Fetch a light block with linear backoff; a chain that cannot serve one
/// within the allowed attempts fails the calling job only.
async fn retry_light_block(
    client: &ChainClient,
    height: i64,
    max_attempts: u64,
) -> anyhow::Result<LightBlock> {
    let height = tendermint::block::Height::try_from(height)?;
    let mut attempt = 1u64;
    loop {
        debug!(%height, attempt, "Querying lightblock");
        match fetch_light_block(client, height).await {
            Ok(light_block) => return Ok(light_block),
            Err(e) => {
                attempt += 1;
                if attempt > max_attempts {
                    return Err(anyhow!(
                        "unable to query light block, max attempts exceeded: {e}"
                    ));
                }
                sleep(Duration::from_secs(attempt)).await;
            }
        }
    }
}

async fn fetch_light_block(
    client: &ChainClient,
    height: tendermint::block::Height,
) -> anyhow::Result<LightBlock> {
    let commit = client.rpc.commit(height).await?;
    let validators = client.rpc.validators(height, Paging::All).await?;
    Ok(LightBlock {
        signed_header: commit.signed_header,
        validators: tendermint::validator::Set::without_proposer(validators.validators),
    })
}

pub(crate) fn convert_proof_ops(ops: &tendermint::merkle::proof::ProofOps) -> ProofOps {
    ProofOps {
        ops: ops
            .ops
            .iter()
            .map(|op| tendermint_proto::v0_34::crypto::ProofOp {
                r#type: op.field_type.clone(),
                key: op.key.clone(),
                data: op.data.clone(),
            })
            .collect(),
    }
}

pub(crate) fn convert_tx_proof(proof: &tendermint::tx::Proof) -> TxProof {
    TxProof {
        root_hash: proof.root_hash.as_bytes().to_vec(),
        data: proof.data.clone(),
        proof: Some(ProofProto {
            total: proof.proof.total as i64,
            index: proof.proof.index as i64,
            leaf_hash: proof.proof.leaf_hash.as_bytes().to_vec(),
            aunts: proof.proof.aunts.iter().map(|a| a.as_bytes().to_vec()).collect(),
        }),
    }
}

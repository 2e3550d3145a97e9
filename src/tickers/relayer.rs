use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use prost_types::Any;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::app::relayer::{RelayMsg, Relayer};
use crate::chain::events::{
    ATTRIBUTE_KEY_CHAIN_ID, ATTRIBUTE_KEY_CONNECTION_ID, ATTRIBUTE_KEY_HEIGHT,
    ATTRIBUTE_KEY_MODULE, ATTRIBUTE_KEY_QUERY_ID, ATTRIBUTE_KEY_REQUEST, ATTRIBUTE_KEY_TYPE,
    EVENT_TYPE_MESSAGE, MODULE_NAME,
};
use crate::helper::client_side::{self, send_cosmos_transaction};
use crate::helper::websocket::WebSocketClient;
use crate::proto::ibc::core::client::v1::MsgUpdateClient;
use crate::proto::interchainquery::v1::Query;
use crate::tickers::relayer_tasks::do_request;

const QUERY_DEDUP_TTL: Duration = Duration::from_secs(10);
const BACKFILL_READ_TIMEOUT: Duration = Duration::from_secs(10);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(15);

/// Depth of each per-chain job queue; a full queue applies backpressure to
/// the intake paths instead of fanning out unboundedly.
const JOB_QUEUE_DEPTH: usize = 64;

/// An ephemeral query job, constructed from an event or a backfill poll.
/// Lives until it has produced zero or one outbound message.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryJob {
    pub source_chain_id: String,
    pub connection_id: String,
    pub chain_id: String,
    pub query_id: String,
    pub query_type: String,
    pub height: i64,
    pub request: Vec<u8>,
}

/// Start relayer tasks:
/// 1. one flush loop per submission target
/// 2. a bounded query-worker pool per configured chain
/// 3. the home-chain event subscription
/// 4. one historic backfill loop per counterparty chain
pub async fn start_relayer_tasks(
    relayer: Arc<Relayer>,
    mut receivers: HashMap<String, UnboundedReceiver<RelayMsg>>,
) {
    let mut handles: Vec<JoinHandle<()>> = vec![];

    for (chain_id, rx) in receivers.drain() {
        handles.push(tokio::spawn(flush_send_queue(
            relayer.clone(),
            chain_id,
            rx,
        )));
    }

    let mut job_queues: HashMap<String, mpsc::Sender<QueryJob>> = HashMap::new();
    let mut chain_ids: Vec<String> = relayer
        .config()
        .chains
        .iter()
        .map(|c| c.chain_id.clone())
        .collect();
    chain_ids.push(relayer.config().home_chain.chain_id.clone());
    for chain_id in &chain_ids {
        let (tx, rx) = mpsc::channel::<QueryJob>(JOB_QUEUE_DEPTH);
        job_queues.insert(chain_id.clone(), tx);
        let rx = Arc::new(Mutex::new(rx));
        for _ in 0..relayer.config().relay.query_workers {
            let relayer = relayer.clone();
            let rx = rx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let job = rx.lock().await.recv().await;
                    match job {
                        Some(job) => do_request(&relayer, job).await,
                        None => break,
                    }
                }
            }));
        }
    }
    let job_queues = Arc::new(job_queues);

    handles.push(tokio::spawn(subscription_loop(
        relayer.clone(),
        job_queues.clone(),
    )));

    for chain in &relayer.config().chains {
        handles.push(tokio::spawn(historic_loop(
            relayer.clone(),
            chain.chain_id.clone(),
            job_queues.clone(),
        )));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<RpcResult>,
}

#[derive(Deserialize)]
struct RpcResult {
    #[serde(default)]
    events: Option<HashMap<String, Vec<String>>>,
}

/// Event-stream intake. The live subscription is best effort: it can
/// double-fire (the dedup cache absorbs that) and can silently miss; the
/// historic backfill loops are the durable catch-up path.
async fn subscription_loop(
    relayer: Arc<Relayer>,
    job_queues: Arc<HashMap<String, mpsc::Sender<QueryJob>>>,
) {
    let conf = relayer.config();
    let subscription = format!("{EVENT_TYPE_MESSAGE}.{ATTRIBUTE_KEY_MODULE}='{MODULE_NAME}'");
    let delay = Duration::from_secs(conf.relay.reconnect_delay);

    loop {
        let mut client =
            WebSocketClient::new(conf.home_chain.ws.clone(), subscription.clone());
        if let Err(e) = client.connect().await {
            error!("Connection attempt failed: {e}");
            sleep(delay).await;
            continue;
        }

        while let Some(msg) = client.receive_message().await {
            if let WsMessage::Text(text) = msg {
                let Some(events) = parse_event_attributes(&text) else {
                    continue;
                };
                let jobs = unpack_event_jobs(
                    &conf.home_chain.chain_id,
                    &events,
                    &conf.allowed_queries,
                );
                for job in jobs {
                    dispatch_job(&relayer, &job_queues, job).await;
                }
            }
        }

        client.close().await;
        error!("Connection exited, and reconnecting...");
        sleep(delay).await;
    }
}

/// Extract the attribute-array map from one subscription frame. Frames
/// without events (the subscribe confirmation, keepalives) yield `None`.
pub(crate) fn parse_event_attributes(text: &str) -> Option<HashMap<String, Vec<String>>> {
    let envelope: RpcEnvelope = serde_json::from_str(text).ok()?;
    envelope.result?.events
}

/// Unpack an event batch into jobs. The attribute arrays are positionally
/// aligned across the batch and must be read by index, never by single-key
/// lookup.
pub(crate) fn unpack_event_jobs(
    source_chain_id: &str,
    events: &HashMap<String, Vec<String>>,
    allowed_queries: &[String],
) -> Vec<QueryJob> {
    let key = |attribute: &str| format!("{EVENT_TYPE_MESSAGE}.{attribute}");
    let empty: Vec<String> = vec![];
    let query_ids = events.get(&key(ATTRIBUTE_KEY_QUERY_ID)).unwrap_or(&empty);
    let chains = events.get(&key(ATTRIBUTE_KEY_CHAIN_ID)).unwrap_or(&empty);
    let connections = events
        .get(&key(ATTRIBUTE_KEY_CONNECTION_ID))
        .unwrap_or(&empty);
    let types = events.get(&key(ATTRIBUTE_KEY_TYPE)).unwrap_or(&empty);
    let requests = events.get(&key(ATTRIBUTE_KEY_REQUEST)).unwrap_or(&empty);
    let heights = events.get(&key(ATTRIBUTE_KEY_HEIGHT)).unwrap_or(&empty);

    let mut jobs = vec![];
    for (i, query_id) in query_ids.iter().enumerate() {
        let (Some(chain_id), Some(connection_id), Some(query_type), Some(request), Some(height)) = (
            chains.get(i),
            connections.get(i),
            types.get(i),
            requests.get(i),
            heights.get(i),
        ) else {
            warn!(id = %query_id, "ragged event attribute arrays");
            continue;
        };

        if !allowed_queries.is_empty() && !allowed_queries.contains(query_type) {
            debug!(id = %query_id, query_type = %query_type, "Ignoring current query; not a permitted type");
            continue;
        }

        let Ok(request) = hex::decode(request) else {
            warn!(id = %query_id, "undecodable request attribute");
            continue;
        };
        let Ok(height) = height.parse::<i64>() else {
            warn!(id = %query_id, "undecodable height attribute");
            continue;
        };

        jobs.push(QueryJob {
            source_chain_id: source_chain_id.to_string(),
            connection_id: connection_id.clone(),
            chain_id: chain_id.clone(),
            query_id: query_id.clone(),
            query_type: query_type.clone(),
            height,
            request,
        });
    }
    jobs
}

async fn dispatch_job(
    relayer: &Relayer,
    job_queues: &HashMap<String, mpsc::Sender<QueryJob>>,
    job: QueryJob,
) {
    // chains we are not connected to are skipped, not errors
    let Some(queue) = job_queues.get(&job.chain_id) else {
        return;
    };

    let cache_key = format!("query/{}", job.query_id);
    if relayer.query_cache.contains(&cache_key) {
        debug!(id = %job.query_id, "avoiding duplicate");
        return;
    }
    relayer.query_cache.set(&cache_key, true, QUERY_DEDUP_TTL);

    info!(id = %job.query_id, query_type = %job.query_type, "Handling query");
    let _ = queue.send(job).await;
}

/// Durable catch-up for one counterparty chain: poll the registry's pending
/// queries and dispatch the most time-starved ones.
async fn historic_loop(
    relayer: Arc<Relayer>,
    chain_id: String,
    job_queues: Arc<HashMap<String, mpsc::Sender<QueryJob>>>,
) {
    let conf = relayer.config();
    let interval = Duration::from_secs(conf.relay.historic_query_interval);

    loop {
        sleep(interval).await;

        let result = timeout(
            BACKFILL_READ_TIMEOUT,
            client_side::pending_queries(&relayer.home_client().rpc, &chain_id),
        )
        .await;
        let queries = match result {
            Err(_) => {
                warn!(chain = %chain_id, "timeout fetching historic queries");
                continue;
            }
            Ok(Err(e)) => {
                // a non-timeout failure here is a wire-format or
                // configuration defect; the backfill path is the durability
                // guarantee, so do not limp on without it.
                panic!("unrecoverable historic query read for {chain_id}: {e}");
            }
            Ok(Ok(queries)) => queries,
        };

        info!(chain = %chain_id, count = queries.len(), "fetched historic queries for chain");
        if queries.is_empty() {
            continue;
        }

        for query in rank_historic_queries(queries, conf.relay.max_historic_queries) {
            if !relayer.is_query_allowed(&query.query_type) {
                debug!(id = %query.id, query_type = %query.query_type, "Ignoring existing query; not a permitted type");
                continue;
            }
            let job = QueryJob {
                source_chain_id: conf.home_chain.chain_id.clone(),
                connection_id: query.connection_id,
                chain_id: query.chain_id,
                query_id: query.id,
                query_type: query.query_type,
                height: 0,
                request: query.request,
            };
            dispatch_job(&relayer, &job_queues, job).await;
        }
    }
}

/// The `max` most time-starved pending queries, oldest emission first. The
/// shuffle before the stable sort breaks ties randomly so equal emission
/// heights do not always replay in store order.
pub(crate) fn rank_historic_queries(mut queries: Vec<Query>, max: usize) -> Vec<Query> {
    queries.shuffle(&mut rand::thread_rng());
    queries.sort_by_key(|q| q.last_emission);
    queries.truncate(max);
    queries
}

/// Drain one chain's send queue: buffer until the batch cap or the wait
/// interval, dedup, submit as one transaction.
pub async fn flush_send_queue(
    relayer: Arc<Relayer>,
    chain_id: String,
    mut ch: UnboundedReceiver<RelayMsg>,
) {
    let wait = Duration::from_secs(relayer.config().relay.wait_interval);
    let max_msgs = relayer.config().relay.max_tx_msgs;
    sleep(wait).await;

    let mut to_send: Vec<RelayMsg> = vec![];
    loop {
        if to_send.len() > max_msgs {
            flush(&relayer, &chain_id, std::mem::take(&mut to_send)).await;
        }
        tokio::select! {
            maybe = ch.recv() => match maybe {
                Some(msg) => to_send.push(msg),
                None => {
                    flush(&relayer, &chain_id, std::mem::take(&mut to_send)).await;
                    return;
                }
            },
            _ = sleep(wait) => {
                flush(&relayer, &chain_id, std::mem::take(&mut to_send)).await;
            }
        }
    }
}

async fn flush(relayer: &Relayer, chain_id: &str, to_send: Vec<RelayMsg>) {
    if to_send.is_empty() {
        return;
    }
    info!(chain = %chain_id, "Sending batch of {} messages", to_send.len());

    let msgs = unique(to_send);
    let any_msgs: Vec<Any> = msgs.iter().filter_map(to_any).collect();
    if any_msgs.is_empty() {
        return;
    }
    let count = any_msgs.len();

    match submit_batch(relayer, any_msgs.clone()).await {
        Ok(()) => info!(chain = %chain_id, "Sent batch of {count} (deduplicated) messages"),
        Err(e) if e.code() == tonic::Code::DeadlineExceeded => {
            warn!("Failed to submit in time, retrying");
            match submit_batch(relayer, any_msgs).await {
                Ok(()) => info!(chain = %chain_id, "Sent batch of {count} (deduplicated) messages"),
                Err(e) if e.code() == tonic::Code::DeadlineExceeded => {
                    warn!("Failed to submit in time, bailing");
                }
                Err(e) => {
                    error!("Failed to submit after retry; nevermind, we'll try again! {e}");
                }
            }
        }
        Err(e) => error!("Failed to submit; nevermind, we'll try again! {e}"),
    }
}

async fn submit_batch(relayer: &Relayer, msgs: Vec<Any>) -> Result<(), tonic::Status> {
    let result = timeout(
        FLUSH_TIMEOUT,
        send_cosmos_transaction(relayer.config(), msgs),
    )
    .await;
    let response = match result {
        Err(_) => {
            return Err(tonic::Status::deadline_exceeded(
                "batch submission timed out",
            ))
        }
        Ok(Err(status)) => return Err(status),
        Ok(Ok(response)) => response,
    };

    if let Some(tx_response) = response.into_inner().tx_response {
        match (tx_response.code, tx_response.codespace.as_str()) {
            (0, _) => debug!(txhash = %tx_response.txhash, "batch accepted"),
            (19, "sdk") => info!("Tx already in mempool"),
            (12, "sdk") => info!("Not enough gas"),
            (code, codespace) => {
                warn!(code, codespace, log = %tx_response.raw_log, "batch rejected")
            }
        }
    }
    Ok(())
}

/// Dedup a batch before submission: client updates by target height (one
/// update per height is sufficient), responses by query id (the verifier is
/// idempotent, so later duplicates are redundant).
pub(crate) fn unique(msgs: Vec<RelayMsg>) -> Vec<RelayMsg> {
    let mut query_ids: HashSet<String> = HashSet::new();
    let mut client_update_heights: HashSet<u64> = HashSet::new();

    let mut list = vec![];
    for entry in msgs {
        match &entry {
            RelayMsg::ClientUpdate { height, .. } => {
                if client_update_heights.insert(*height) {
                    debug!(height, "Added ClientUpdate message");
                    list.push(entry);
                }
            }
            RelayMsg::QueryResponse(msg) => {
                if query_ids.insert(msg.query_id.clone()) {
                    debug!(id = %msg.query_id, "Added SubmitResponse message");
                    list.push(entry);
                }
            }
        }
    }
    list
}

fn to_any(msg: &RelayMsg) -> Option<Any> {
    match msg {
        RelayMsg::QueryResponse(m) => Any::from_msg(m).ok(),
        RelayMsg::ClientUpdate {
            client_id,
            header,
            signer,
            ..
        } => {
            let client_message = Any::from_msg(header).ok()?;
            let update = MsgUpdateClient {
                client_id: client_id.clone(),
                client_message: Some(client_message),
                signer: signer.clone(),
            };
            Any::from_msg(&update).ok()
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tendermint_rpc::HttpClient;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::config::Config;
use crate::helper::cache::TtlCache;
use crate::proto::ibc::lightclients::tendermint::v1::Header;
use crate::proto::interchainquery::v1::MsgSubmitQueryResponse;

/// A connected chain: its id and Tendermint RPC handle.
pub struct ChainClient {
    pub chain_id: String,
    pub rpc: HttpClient,
}

impl ChainClient {
    pub fn new(chain_id: &str, rpc_url: &str) -> anyhow::Result<Self> {
        let rpc = HttpClient::new(rpc_url)?;
        Ok(Self {
            chain_id: chain_id.to_string(),
            rpc,
        })
    }
}

/// One outbound message awaiting batch submission. Client updates carry the
/// header height so the batcher can dedup them: one update per height is
/// sufficient.
pub enum RelayMsg {
    QueryResponse(MsgSubmitQueryResponse),
    ClientUpdate {
        client_id: String,
        header: Header,
        signer: String,
        height: u64,
    },
}

/// The relay context. Built once at process start and passed as an `Arc` to
/// every task: chain clients, per-chain send queues, and the small TTL
/// caches the intake paths share.
pub struct Relayer {
    config: Config,
    sender: String,
    clients: HashMap<String, ChainClient>,
    send_queues: HashMap<String, UnboundedSender<RelayMsg>>,
    pub query_cache: TtlCache<bool>,
    pub height_cache: TtlCache<i64>,
    pub client_id_cache: TtlCache<String>,
}

impl Relayer {
    /// Build the context and hand back the receiving end of each send
    /// queue; exactly one flush loop consumes each receiver.
    #[allow(clippy::type_complexity)]
    pub fn new(
        config: Config,
    ) -> anyhow::Result<(Self, HashMap<String, UnboundedReceiver<RelayMsg>>)> {
        let sender = config.relayer_address()?;

        let mut clients = HashMap::new();
        let home = ChainClient::new(&config.home_chain.chain_id, &config.home_chain.rpc)?;
        info!(chain = %home.chain_id, "configured home chain");
        clients.insert(home.chain_id.clone(), home);
        for chain in &config.chains {
            let client = ChainClient::new(&chain.chain_id, &chain.rpc)?;
            info!(chain = %chain.chain_id, "configured chain");
            clients.insert(chain.chain_id.clone(), client);
        }

        let mut send_queues = HashMap::new();
        let mut receivers = HashMap::new();
        let (tx, rx) = mpsc::unbounded_channel();
        send_queues.insert(config.home_chain.chain_id.clone(), tx);
        receivers.insert(config.home_chain.chain_id.clone(), rx);

        Ok((
            Self {
                config,
                sender,
                clients,
                send_queues,
                query_cache: TtlCache::new(),
                height_cache: TtlCache::new(),
                client_id_cache: TtlCache::new(),
            },
            receivers,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address of the relayer account; the `from_address` on every
    /// submitted response.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn client_for(&self, chain_id: &str) -> Option<&ChainClient> {
        self.clients.get(chain_id)
    }

    pub fn home_client(&self) -> &ChainClient {
        self.clients
            .get(&self.config.home_chain.chain_id)
            .expect("home chain client")
    }

    pub fn enqueue(&self, chain_id: &str, msg: RelayMsg) {
        if let Some(queue) = self.send_queues.get(chain_id) {
            let _ = queue.send(msg);
        }
    }

    pub fn is_query_allowed(&self, query_type: &str) -> bool {
        self.config.allowed_queries.is_empty()
            || self.config.allowed_queries.iter().any(|t| t == query_type)
    }
}

pub async fn run_relayer_daemon(conf: Config) {
    info!("Starting relayer daemon");

    let (relayer, receivers) = match Relayer::new(conf) {
        Ok(built) => built,
        Err(e) => {
            error!("Failed to initialize relayer: {e}");
            return;
        }
    };
    crate::tickers::relayer::start_relayer_tasks(Arc::new(relayer), receivers).await;
}

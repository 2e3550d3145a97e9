use anyhow::anyhow;
use bip39::Mnemonic;
use cosmrs::crypto::secp256k1::SigningKey;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// BIP-44 path for the relayer account key.
const DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(skip_serializing, skip_deserializing)]
    pub home: PathBuf,
    /// logger level
    pub log_level: String,
    /// mnemonic of the relayer account used to sign submitted responses
    pub mnemonic: String,
    pub address_prefix: String,

    pub home_chain: HomeChain,
    pub chains: Vec<CounterpartyChain>,

    /// when non-empty, only these query types are relayed
    #[serde(default)]
    pub allowed_queries: Vec<String>,

    #[serde(default)]
    pub relay: RelayOptions,
}

/// The chain hosting the query registry. Events are consumed from and
/// responses are submitted to this chain.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HomeChain {
    pub chain_id: String,
    /// the cosmos grpc endpoint, e.g. http://localhost:9090
    pub grpc: String,
    /// the tendermint rpc endpoint, e.g. http://localhost:26657
    pub rpc: String,
    /// the tendermint websocket endpoint, e.g. ws://localhost:26657/websocket
    pub ws: String,
    /// Transaction gas
    pub gas: usize,
    pub fee: Fee,
}

/// A counterparty chain queries are executed against.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CounterpartyChain {
    pub chain_id: String,
    /// the tendermint rpc endpoint
    pub rpc: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Fee {
    pub amount: usize,
    pub denom: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RelayOptions {
    /// seconds the batcher waits before flushing a partial batch
    #[serde(default = "default_wait_interval")]
    pub wait_interval: u64,
    /// seconds between backfill polls per counterparty chain
    #[serde(default = "default_historic_query_interval")]
    pub historic_query_interval: u64,
    /// backfill entries dispatched per poll, oldest emission first
    #[serde(default = "default_max_historic_queries")]
    pub max_historic_queries: usize,
    /// flush once this many messages are buffered
    #[serde(default = "default_max_tx_msgs")]
    pub max_tx_msgs: usize,
    /// concurrent query workers per counterparty chain
    #[serde(default = "default_query_workers")]
    pub query_workers: usize,
    /// seconds between websocket reconnection attempts
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,
}

fn default_wait_interval() -> u64 {
    6
}
fn default_historic_query_interval() -> u64 {
    15
}
fn default_max_historic_queries() -> usize {
    12
}
fn default_max_tx_msgs() -> usize {
    12
}
fn default_query_workers() -> usize {
    4
}
fn default_reconnect_delay() -> u64 {
    5
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            wait_interval: default_wait_interval(),
            historic_query_interval: default_historic_query_interval(),
            max_historic_queries: default_max_historic_queries(),
            max_tx_msgs: default_max_tx_msgs(),
            query_workers: default_query_workers(),
            reconnect_delay: default_reconnect_delay(),
        }
    }
}

impl Config {
    pub fn from_file(app_home: &str) -> Result<Self, std::io::Error> {
        let home = home_dir(app_home);
        if !home.join(CONFIG_FILE).exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Config file not found",
            ));
        }
        let contents = fs::read_to_string(home.join(CONFIG_FILE))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        config.home = home;
        Ok(config)
    }

    pub fn default(app_home: &str) -> Self {
        let mut entropy = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy).expect("failed to generate mnemonic");

        Self {
            home: home_dir(app_home),
            log_level: "debug".to_string(),
            mnemonic: mnemonic.to_string(),
            address_prefix: "cosmos".to_string(),
            home_chain: HomeChain {
                chain_id: "home-1".to_string(),
                grpc: "http://localhost:9090".to_string(),
                rpc: "http://localhost:26657".to_string(),
                ws: "ws://localhost:26657/websocket".to_string(),
                gas: 1_000_000,
                fee: Fee {
                    amount: 1000,
                    denom: "uatom".to_string(),
                },
            },
            chains: vec![CounterpartyChain {
                chain_id: "remote-1".to_string(),
                rpc: "http://localhost:36657".to_string(),
            }],
            allowed_queries: vec![],
            relay: RelayOptions::default(),
        }
    }

    pub fn to_string(&self) -> String {
        toml::to_string(self).unwrap()
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if !self.home.exists() {
            fs::create_dir_all(&self.home)?;
        }
        fs::write(self.home.join(CONFIG_FILE), self.to_string())
    }

    pub fn get_database_with_name(&self, name: &str) -> PathBuf {
        self.home.join(name)
    }

    /// The signing key of the relayer account, derived from the configured
    /// mnemonic.
    pub fn relayer_key(&self) -> anyhow::Result<SigningKey> {
        let mnemonic = Mnemonic::parse(self.mnemonic.trim())?;
        let seed = mnemonic.to_seed("");
        let path = DERIVATION_PATH
            .parse::<cosmrs::bip32::DerivationPath>()
            .map_err(|e| anyhow!("invalid derivation path: {e}"))?;
        SigningKey::derive_from_path(seed, &path).map_err(|e| anyhow!("key derivation: {e}"))
    }

    /// Bech32 address of the relayer account on the home chain.
    pub fn relayer_address(&self) -> anyhow::Result<String> {
        let key = self.relayer_key()?;
        let account = key
            .public_key()
            .account_id(&self.address_prefix)
            .map_err(|e| anyhow!("account id: {e}"))?;
        Ok(account.to_string())
    }
}

pub fn home_dir(app_home: &str) -> PathBuf {
    dirs::home_dir()
        .map(|path| path.join(app_home))
        .expect("home directory not found")
}

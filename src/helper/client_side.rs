use cosmrs::{
    tx::{self, Fee, SignDoc, SignerInfo},
    Coin,
};

use cosmos_sdk_proto::cosmos::{
    auth::v1beta1::{query_client::QueryClient as AuthQueryClient, BaseAccount, QueryAccountRequest},
    base::query::v1beta1::PageRequest,
    base::tendermint::v1beta1::{
        service_client::ServiceClient as TendermintServiceClient, GetLatestBlockRequest,
    },
    tx::v1beta1::{
        service_client::ServiceClient as TxServiceClient, BroadcastMode, BroadcastTxRequest,
        BroadcastTxResponse,
    },
};
use prost::Message;
use prost_types::Any;
use tendermint_rpc::{Client, HttpClient};
use tonic::{Response, Status};

use crate::config::Config;
use crate::proto::ibc::core::client::v1::{QueryClientStateRequest, QueryClientStateResponse};
use crate::proto::ibc::core::connection::v1::{QueryConnectionRequest, QueryConnectionResponse};
use crate::proto::ibc::lightclients::tendermint::v1::ClientState;
use crate::proto::interchainquery::v1::{Query, QueryRequestsRequest, QueryRequestsResponse};

pub const TX_MEMO: &str = "icqd/v0.4.0";

pub const PENDING_QUERIES_PATH: &str = "/icq.interchainquery.v1.QuerySrvr/Queries";
const IBC_CONNECTION_PATH: &str = "/ibc.core.connection.v1.Query/Connection";
const IBC_CLIENT_STATE_PATH: &str = "/ibc.core.client.v1.Query/ClientState";

const PENDING_QUERIES_PAGE_LIMIT: u64 = 500;

/// The relayer account on the home chain. This account signs every submitted
/// batch and must exist (and be funded) before the daemon starts.
pub async fn get_relayer_account(conf: &Config) -> Result<BaseAccount, Status> {
    let address = conf
        .relayer_address()
        .map_err(|e| Status::internal(format!("relayer key unavailable: {e}")))?;

    let mut client = AuthQueryClient::connect(conf.home_chain.grpc.clone())
        .await
        .map_err(|e| Status::cancelled(format!("Failed to create auth query client: {e}")))?;

    let response = client.account(QueryAccountRequest { address }).await?;
    let any = response.into_inner().account.ok_or_else(|| {
        Status::not_found("relayer account does not exist on the home chain")
    })?;

    BaseAccount::decode(any.value.as_slice())
        .map_err(|e| Status::internal(format!("failed to decode relayer account: {e}")))
}

/// Sign `msgs` as one transaction with the relayer key and broadcast it to
/// the home chain.
pub async fn send_cosmos_transaction(
    conf: &Config,
    msgs: Vec<Any>,
) -> Result<Response<BroadcastTxResponse>, Status> {
    if conf.home_chain.grpc.is_empty() {
        return Err(Status::cancelled("GRPC URL is empty"));
    }

    let sender_private_key = conf
        .relayer_key()
        .map_err(|e| Status::internal(format!("relayer key unavailable: {e}")))?;

    let base_account = get_relayer_account(conf).await?;

    let mut base_client = TendermintServiceClient::connect(conf.home_chain.grpc.clone())
        .await
        .map_err(|e| Status::cancelled(format!("Failed to create tendermint client: {e}")))?;

    let latest_block = base_client
        .get_latest_block(GetLatestBlockRequest {})
        .await?
        .into_inner();
    let chain_id = latest_block
        .block
        .and_then(|b| b.header)
        .ok_or_else(|| Status::internal("latest block has no header"))?
        .chain_id
        .parse::<cosmrs::tendermint::chain::Id>()
        .map_err(|e| Status::internal(format!("invalid chain id: {e}")))?;

    let account_number = base_account.account_number;
    let sequence_number = base_account.sequence;
    let gas = conf.home_chain.gas;
    let fee = Coin::new(
        conf.home_chain.fee.amount as u128,
        conf.home_chain.fee.denom.as_str(),
    )
    .map_err(|e| Status::internal(format!("invalid fee: {e}")))?;
    let timeout_height = 0u16;

    let cosmrs_msgs: Vec<cosmrs::Any> = msgs
        .into_iter()
        .map(|m| cosmrs::Any {
            type_url: m.type_url,
            value: m.value,
        })
        .collect();
    let tx_body = tx::Body::new(cosmrs_msgs, TX_MEMO, timeout_height);
    let signer_info =
        SignerInfo::single_direct(Some(sender_private_key.public_key()), sequence_number);
    let auth_info = signer_info.auth_info(Fee::from_amount_and_gas(fee, gas as u64));

    let sign_doc = SignDoc::new(&tx_body, &auth_info, &chain_id, account_number)
        .map_err(|e| Status::internal(format!("failed to build sign doc: {e}")))?;
    let tx_signed = sign_doc
        .sign(&sender_private_key)
        .map_err(|e| Status::internal(format!("failed to sign transaction: {e}")))?;
    let tx_bytes = tx_signed
        .to_bytes()
        .map_err(|e| Status::internal(format!("failed to encode transaction: {e}")))?;

    let mut tx_client = TxServiceClient::connect(conf.home_chain.grpc.clone())
        .await
        .map_err(|e| Status::cancelled(format!("Failed to create tx client: {e}")))?;

    tx_client
        .broadcast_tx(BroadcastTxRequest {
            tx_bytes,
            mode: BroadcastMode::Sync.into(),
        })
        .await
}

/// Read the registry's pending queries for one counterparty chain from the
/// home chain. The relayer ranks these by staleness before dispatching.
pub async fn pending_queries(rpc: &HttpClient, chain_id: &str) -> anyhow::Result<Vec<Query>> {
    let request = QueryRequestsRequest {
        pagination: Some(PageRequest {
            limit: PENDING_QUERIES_PAGE_LIMIT,
            ..Default::default()
        }),
        chain_id: chain_id.to_string(),
    };

    let res = rpc
        .abci_query(
            Some(PENDING_QUERIES_PATH.to_string()),
            request.encode_to_vec(),
            None,
            false,
        )
        .await?;
    if res.code.is_err() {
        anyhow::bail!("pending queries read failed: {}", res.log);
    }

    let out = QueryRequestsResponse::decode(res.value.as_slice())?;
    Ok(out.queries)
}

/// Resolve the client id behind an IBC connection on the home chain.
pub async fn connection_client_id(rpc: &HttpClient, connection_id: &str) -> anyhow::Result<String> {
    let request = QueryConnectionRequest {
        connection_id: connection_id.to_string(),
    };
    let res = rpc
        .abci_query(
            Some(IBC_CONNECTION_PATH.to_string()),
            request.encode_to_vec(),
            None,
            false,
        )
        .await?;
    if res.code.is_err() {
        anyhow::bail!("connection query failed: {}", res.log);
    }

    let out = QueryConnectionResponse::decode(res.value.as_slice())?;
    out.connection
        .map(|c| c.client_id)
        .ok_or_else(|| anyhow::anyhow!("connection {connection_id} not found"))
}

/// The home chain's view of a counterparty light client.
pub async fn client_state(rpc: &HttpClient, client_id: &str) -> anyhow::Result<ClientState> {
    let request = QueryClientStateRequest {
        client_id: client_id.to_string(),
    };
    let res = rpc
        .abci_query(
            Some(IBC_CLIENT_STATE_PATH.to_string()),
            request.encode_to_vec(),
            None,
            false,
        )
        .await?;
    if res.code.is_err() {
        anyhow::bail!("client state query failed: {}", res.log);
    }

    let out = QueryClientStateResponse::decode(res.value.as_slice())?;
    let any = out
        .client_state
        .ok_or_else(|| anyhow::anyhow!("client {client_id} has no state"))?;
    Ok(ClientState::decode(any.value.as_slice())?)
}

use std::collections::HashMap;

use prost::Message;

use crate::app::relayer::RelayMsg;
use crate::proto::ibc::lightclients::tendermint::v1::Header;
use crate::proto::interchainquery::v1::{MsgSubmitQueryResponse, Query};
use crate::tickers::relayer::{parse_event_attributes, rank_historic_queries, unique, unpack_event_jobs};
use crate::tickers::relayer_tasks::{
    convert_proof_ops, rewrite_txs_event_request, QueryStrategy,
};

fn response_msg(query_id: &str) -> RelayMsg {
    RelayMsg::QueryResponse(MsgSubmitQueryResponse {
        chain_id: "testchain-1".to_string(),
        query_id: query_id.to_string(),
        result: vec![1],
        proof_ops: None,
        height: 10,
        from_address: "cosmos1relayer".to_string(),
    })
}

fn client_update_msg(height: u64) -> RelayMsg {
    RelayMsg::ClientUpdate {
        client_id: "07-tendermint-0".to_string(),
        header: Header::default(),
        signer: "cosmos1relayer".to_string(),
        height,
    }
}

#[test]
fn test_batch_dedups_responses_by_query_id() {
    let batch = vec![
        response_msg("a"),
        response_msg("b"),
        response_msg("a"),
        response_msg("c"),
        response_msg("d"),
    ];
    let deduped = unique(batch);
    assert_eq!(deduped.len(), 4);
}

#[test]
fn test_batch_dedups_client_updates_by_height() {
    let batch = vec![
        client_update_msg(100),
        response_msg("a"),
        client_update_msg(100),
        client_update_msg(101),
        response_msg("b"),
    ];
    let deduped = unique(batch);
    assert_eq!(deduped.len(), 4);

    // the update for a height stays ahead of the response that depends on it
    assert!(matches!(
        deduped[0],
        RelayMsg::ClientUpdate { height: 100, .. }
    ));
    assert!(matches!(&deduped[1], RelayMsg::QueryResponse(m) if m.query_id == "a"));
}

#[test]
fn test_backfill_ranking_prefers_oldest_emission() {
    let queries: Vec<Query> = (0u64..10)
        .map(|i| Query {
            id: format!("query-{i}"),
            chain_id: "testchain-1".to_string(),
            last_emission: 100 - i,
            ..Default::default()
        })
        .collect();

    let selected = rank_historic_queries(queries, 4);
    assert_eq!(selected.len(), 4);
    let emissions: Vec<u64> = selected.iter().map(|q| q.last_emission).collect();
    assert_eq!(emissions, vec![91, 92, 93, 94], "oldest emissions win");
}

#[test]
fn test_backfill_ranking_handles_short_lists() {
    let queries = vec![Query {
        id: "only".to_string(),
        ..Default::default()
    }];
    assert_eq!(rank_historic_queries(queries, 12).len(), 1);
}

#[test]
fn test_event_unpacking_by_index() {
    let mut events: HashMap<String, Vec<String>> = HashMap::new();
    events.insert(
        "message.query_id".to_string(),
        vec!["id-0".to_string(), "id-1".to_string()],
    );
    events.insert(
        "message.chain_id".to_string(),
        vec!["chain-a".to_string(), "chain-b".to_string()],
    );
    events.insert(
        "message.connection_id".to_string(),
        vec!["connection-0".to_string(), "connection-1".to_string()],
    );
    events.insert(
        "message.type".to_string(),
        vec![
            "store/bank/key".to_string(),
            "cosmos.staking.v1beta1.Query/Validators".to_string(),
        ],
    );
    events.insert(
        "message.request".to_string(),
        vec!["dead".to_string(), "beef".to_string()],
    );
    events.insert(
        "message.height".to_string(),
        vec!["0".to_string(), "12".to_string()],
    );

    let jobs = unpack_event_jobs("home-1", &events, &[]);
    assert_eq!(jobs.len(), 2);

    assert_eq!(jobs[0].query_id, "id-0");
    assert_eq!(jobs[0].chain_id, "chain-a");
    assert_eq!(jobs[0].connection_id, "connection-0");
    assert_eq!(jobs[0].request, vec![0xde, 0xad]);
    assert_eq!(jobs[0].height, 0);
    assert_eq!(jobs[0].source_chain_id, "home-1");

    assert_eq!(jobs[1].query_id, "id-1");
    assert_eq!(jobs[1].chain_id, "chain-b");
    assert_eq!(jobs[1].request, vec![0xbe, 0xef]);
    assert_eq!(jobs[1].height, 12);
}

#[test]
fn test_event_unpacking_applies_allowed_queries_filter() {
    let mut events: HashMap<String, Vec<String>> = HashMap::new();
    events.insert("message.query_id".to_string(), vec!["id-0".to_string()]);
    events.insert("message.chain_id".to_string(), vec!["chain-a".to_string()]);
    events.insert(
        "message.connection_id".to_string(),
        vec!["connection-0".to_string()],
    );
    events.insert(
        "message.type".to_string(),
        vec!["store/bank/key".to_string()],
    );
    events.insert("message.request".to_string(), vec!["dead".to_string()]);
    events.insert("message.height".to_string(), vec!["0".to_string()]);

    let allowed = vec!["cosmos.staking.v1beta1.Query/Validators".to_string()];
    assert!(unpack_event_jobs("home-1", &events, &allowed).is_empty());

    let allowed = vec!["store/bank/key".to_string()];
    assert_eq!(unpack_event_jobs("home-1", &events, &allowed).len(), 1);
}

#[test]
fn test_event_unpacking_skips_ragged_entries() {
    let mut events: HashMap<String, Vec<String>> = HashMap::new();
    events.insert(
        "message.query_id".to_string(),
        vec!["id-0".to_string(), "id-1".to_string()],
    );
    events.insert("message.chain_id".to_string(), vec!["chain-a".to_string()]);
    events.insert(
        "message.connection_id".to_string(),
        vec!["connection-0".to_string()],
    );
    events.insert(
        "message.type".to_string(),
        vec!["store/bank/key".to_string()],
    );
    events.insert("message.request".to_string(), vec!["dead".to_string()]);
    events.insert("message.height".to_string(), vec!["0".to_string()]);

    let jobs = unpack_event_jobs("home-1", &events, &[]);
    assert_eq!(jobs.len(), 1, "the ragged second entry is dropped");
}

#[test]
fn test_subscription_frame_parsing() {
    let frame = r#"{
        "jsonrpc": "2.0",
        "id": 0,
        "result": {
            "query": "message.module='interchainquery'",
            "data": {"type": "tendermint/event/NewBlock", "value": {}},
            "events": {
                "message.query_id": ["abc123"],
                "message.chain_id": ["testchain-1"]
            }
        }
    }"#;
    let events = parse_event_attributes(frame).expect("frame carries events");
    assert_eq!(events["message.query_id"], vec!["abc123".to_string()]);

    // the subscribe confirmation has an empty result
    let confirmation = r#"{"jsonrpc": "2.0", "id": 0, "result": {}}"#;
    assert!(parse_event_attributes(confirmation).is_none());

    assert!(parse_event_attributes("not json").is_none());
}

#[test]
fn test_strategy_selection() {
    assert_eq!(
        QueryStrategy::for_type("cosmos.tx.v1beta1.Service/GetTxsEvent"),
        QueryStrategy::TxsEventRewrite
    );
    assert_eq!(
        QueryStrategy::for_type("tendermint.Tx"),
        QueryStrategy::TxWithProof
    );
    assert_eq!(
        QueryStrategy::for_type("ibc.ClientUpdate"),
        QueryStrategy::ClientUpdateOnly
    );
    assert_eq!(
        QueryStrategy::for_type("store/bank/key"),
        QueryStrategy::Generic
    );

    assert!(QueryStrategy::needs_proof("store/bank/key"));
    assert!(!QueryStrategy::needs_proof(
        "cosmos.staking.v1beta1.Query/Validators"
    ));
}

#[test]
fn test_txs_event_request_rewrite() {
    use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
    use cosmos_sdk_proto::cosmos::tx::v1beta1::{GetTxsEventRequest, OrderBy};

    let original = GetTxsEventRequest {
        order_by: OrderBy::Asc as i32,
        limit: 10,
        pagination: Some(PageRequest {
            limit: 10,
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut job = crate::tickers::relayer::QueryJob {
        source_chain_id: "home-1".to_string(),
        connection_id: "connection-0".to_string(),
        chain_id: "testchain-1".to_string(),
        query_id: "id-0".to_string(),
        query_type: "cosmos.tx.v1beta1.Service/GetTxsEvent".to_string(),
        height: 40,
        request: original.encode_to_vec(),
    };
    rewrite_txs_event_request(&mut job).unwrap();

    let rewritten = GetTxsEventRequest::decode(job.request.as_slice()).unwrap();
    assert_eq!(rewritten.order_by, OrderBy::Desc as i32);
    assert_eq!(rewritten.limit, 200);
    assert_eq!(rewritten.pagination.unwrap().limit, 200);
}

#[test]
fn test_proof_ops_conversion_preserves_ops() {
    let domain = tendermint::merkle::proof::ProofOps {
        ops: vec![tendermint::merkle::proof::ProofOp {
            field_type: "ics23:iavl".to_string(),
            key: b"key".to_vec(),
            data: vec![1, 2, 3],
        }],
    };
    let proto = convert_proof_ops(&domain);
    assert_eq!(proto.ops.len(), 1);
    assert_eq!(proto.ops[0].r#type, "ics23:iavl");
    assert_eq!(proto.ops[0].key, b"key".to_vec());
    assert_eq!(proto.ops[0].data, vec![1, 2, 3]);
}

use tendermint_proto::v0_34::crypto::ProofOps;

use super::common::{proof_ops_for, MockClientKeeper, TEST_CONNECTION};
use crate::chain::error::Error;
use crate::chain::proof::validate_proof_ops;

const STORE: &str = "bank";
const KEY: &[u8] = b"balances/cosmos1abc";
const VALUE: &[u8] = b"250uatom";
const HEIGHT: u64 = 41;

#[test]
fn test_valid_membership_proof() {
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, VALUE, &ops)
        .expect("valid proof verifies");
}

#[test]
fn test_mismatched_value_fails() {
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err = validate_proof_ops(
        &clients,
        TEST_CONNECTION,
        HEIGHT,
        STORE,
        KEY,
        b"9999uatom",
        &ops,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_mismatched_root_fails() {
    let (ops, mut root) = proof_ops_for(STORE, KEY, VALUE);
    root[0] ^= 0xff;
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err =
        validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, VALUE, &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_wrong_store_prefix_fails() {
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err = validate_proof_ops(
        &clients,
        TEST_CONNECTION,
        HEIGHT,
        "staking",
        KEY,
        VALUE,
        &ops,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_wrong_op_count_fails() {
    let (mut ops, root) = proof_ops_for(STORE, KEY, VALUE);
    ops.ops.truncate(1);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err =
        validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, VALUE, &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_unknown_connection_fails() {
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err =
        validate_proof_ops(&clients, "connection-99", HEIGHT, STORE, KEY, VALUE, &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_missing_consensus_state_fails() {
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    // root recorded at the wrong height
    let clients = MockClientKeeper::with_root(HEIGHT + 10, root);

    let err =
        validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, VALUE, &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_empty_value_requires_non_membership_proof() {
    // an existence proof cannot stand in for a non-membership claim
    let (ops, root) = proof_ops_for(STORE, KEY, VALUE);
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err =
        validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, b"", &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_undecodable_proof_fails() {
    let (mut ops, root) = proof_ops_for(STORE, KEY, VALUE);
    ops.ops[0].data = vec![0xff, 0xff, 0xff];
    let clients = MockClientKeeper::with_root(HEIGHT + 1, root);

    let err =
        validate_proof_ops(&clients, TEST_CONNECTION, HEIGHT, STORE, KEY, VALUE, &ops).unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

#[test]
fn test_default_proof_ops_fail() {
    let clients = MockClientKeeper::with_root(HEIGHT + 1, vec![0u8; 32]);
    let err = validate_proof_ops(
        &clients,
        TEST_CONNECTION,
        HEIGHT,
        STORE,
        KEY,
        VALUE,
        &ProofOps::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ProofVerification(_)));
}

use ics23::{commitment_proof::Proof as Ics23Proof, CommitmentProof, HostFunctionsManager};
use prost::Message;
use tendermint_proto::v0_34::crypto::ProofOps;

use super::error::Error;

/// The host's light-client view. The registry never manages clients itself;
/// it only needs to resolve a connection to its client and look up the
/// committed state root a proof claims to be anchored in.
pub trait ClientKeeper: Send + Sync {
    fn client_id(&self, connection_id: &str) -> Option<String>;
    /// The app-hash root recorded in the client's consensus state at
    /// `height`. Per IBC convention, proofs generated at height H verify
    /// against the consensus state stored for H + 1.
    fn consensus_root(&self, client_id: &str, height: u64) -> Option<Vec<u8>>;
}

/// Verify a two-op Tendermint store proof against the light client behind
/// `connection_id`: op 0 proves `(key, value)` inside the substore, op 1
/// proves the substore's root under the app hash at the claimed height.
#[allow(clippy::too_many_arguments)]
pub fn validate_proof_ops(
    clients: &dyn ClientKeeper,
    connection_id: &str,
    height: u64,
    store_prefix: &str,
    key: &[u8],
    value: &[u8],
    proof_ops: &ProofOps,
) -> Result<(), Error> {
    if proof_ops.ops.len() != 2 {
        return Err(Error::ProofVerification(format!(
            "expected 2 proof ops, got {}",
            proof_ops.ops.len()
        )));
    }

    let client_id = clients.client_id(connection_id).ok_or_else(|| {
        Error::ProofVerification(format!("no client for connection {connection_id}"))
    })?;
    let root = clients
        .consensus_root(&client_id, height + 1)
        .ok_or_else(|| {
            Error::ProofVerification(format!(
                "no consensus state for client {client_id} at height {}",
                height + 1
            ))
        })?;

    let store_op = &proof_ops.ops[0];
    let root_op = &proof_ops.ops[1];

    if store_op.key != key {
        return Err(Error::ProofVerification(
            "store proof key does not match request".to_string(),
        ));
    }
    if root_op.key != store_prefix.as_bytes() {
        return Err(Error::ProofVerification(format!(
            "root proof key does not match store {store_prefix}"
        )));
    }

    let store_proof = CommitmentProof::decode(store_op.data.as_slice())
        .map_err(|e| Error::ProofVerification(format!("undecodable store proof: {e}")))?;
    let root_proof = CommitmentProof::decode(root_op.data.as_slice())
        .map_err(|e| Error::ProofVerification(format!("undecodable root proof: {e}")))?;

    let subroot = calculate_root(&store_proof)?;

    if value.is_empty() {
        if !ics23::verify_non_membership::<HostFunctionsManager>(
            &store_proof,
            &ics23::iavl_spec(),
            &subroot,
            key,
        ) {
            return Err(Error::ProofVerification(
                "non-membership verification failed".to_string(),
            ));
        }
    } else if !ics23::verify_membership::<HostFunctionsManager>(
        &store_proof,
        &ics23::iavl_spec(),
        &subroot,
        key,
        value,
    ) {
        return Err(Error::ProofVerification(format!(
            "membership verification failed for key {}",
            hex::encode(key)
        )));
    }

    if !ics23::verify_membership::<HostFunctionsManager>(
        &root_proof,
        &ics23::tendermint_spec(),
        &root,
        store_prefix.as_bytes(),
        &subroot,
    ) {
        return Err(Error::ProofVerification(format!(
            "store {store_prefix} is not committed under the app root"
        )));
    }

    Ok(())
}

/// The subtree root a commitment proof resolves to. Non-existence proofs
/// resolve through whichever neighbor they carry.
pub(crate) fn calculate_root(proof: &CommitmentProof) -> Result<Vec<u8>, Error> {
    match proof.proof.as_ref() {
        Some(Ics23Proof::Exist(ep)) => ics23::calculate_existence_root::<HostFunctionsManager>(ep)
            .map_err(|e| Error::ProofVerification(format!("root calculation: {e}"))),
        Some(Ics23Proof::Nonexist(nep)) => {
            let ep = nep
                .left
                .as_ref()
                .or(nep.right.as_ref())
                .ok_or_else(|| Error::ProofVerification("empty non-existence proof".to_string()))?;
            ics23::calculate_existence_root::<HostFunctionsManager>(ep)
                .map_err(|e| Error::ProofVerification(format!("root calculation: {e}")))
        }
        _ => Err(Error::ProofVerification(
            "unsupported proof type".to_string(),
        )),
    }
}

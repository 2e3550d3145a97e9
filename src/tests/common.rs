use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ics23::{commitment_proof::Proof, CommitmentProof, ExistenceProof, HostFunctionsManager};
use prost::Message;
use tendermint_proto::v0_34::crypto::{ProofOp, ProofOps};

use crate::chain::callbacks::QueryCallbacks;
use crate::chain::error::Error;
use crate::chain::keeper::Keeper;
use crate::chain::proof::ClientKeeper;
use crate::helper::store::MemStore;
use crate::proto::interchainquery::v1::Query;

pub const TEST_CONNECTION: &str = "connection-0";
pub const TEST_CLIENT: &str = "07-tendermint-0";
pub const TEST_CHAIN: &str = "testchain-1";

#[derive(Default)]
pub struct MockClientKeeper {
    pub connections: BTreeMap<String, String>,
    pub roots: BTreeMap<(String, u64), Vec<u8>>,
}

impl MockClientKeeper {
    /// A keeper that knows `TEST_CONNECTION` and commits to `root` at
    /// `height`.
    pub fn with_root(height: u64, root: Vec<u8>) -> Self {
        let mut keeper = Self::default();
        keeper
            .connections
            .insert(TEST_CONNECTION.to_string(), TEST_CLIENT.to_string());
        keeper.roots.insert((TEST_CLIENT.to_string(), height), root);
        keeper
    }
}

impl ClientKeeper for MockClientKeeper {
    fn client_id(&self, connection_id: &str) -> Option<String> {
        self.connections.get(connection_id).cloned()
    }

    fn consensus_root(&self, client_id: &str, height: u64) -> Option<Vec<u8>> {
        self.roots.get(&(client_id.to_string(), height)).cloned()
    }
}

pub fn new_keeper() -> Keeper<MemStore> {
    Keeper::new(MemStore::new(), Arc::new(MockClientKeeper::default()))
}

pub fn new_keeper_with_clients(clients: MockClientKeeper) -> Keeper<MemStore> {
    Keeper::new(MemStore::new(), Arc::new(clients))
}

#[derive(Clone, Copy)]
pub enum CallbackBehavior {
    Succeed,
    Requery,
    Fail,
}

/// A consumer-module callback set with one known id and a call counter.
pub struct TestCallbacks {
    pub id: String,
    pub behavior: CallbackBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl TestCallbacks {
    pub fn new(id: &str, behavior: CallbackBehavior) -> (Box<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                id: id.to_string(),
                behavior,
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

impl QueryCallbacks for TestCallbacks {
    fn has(&self, id: &str) -> bool {
        id == self.id
    }

    fn call(&self, _id: &str, _payload: &[u8], _query: &Query) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            CallbackBehavior::Succeed => Ok(()),
            CallbackBehavior::Requery => Err(Error::SucceededNoDelete),
            CallbackBehavior::Fail => Err(Error::Callback("callback failed".to_string())),
        }
    }
}

/// A leaf-only existence proof under `spec`, plus the root it resolves to.
pub fn existence_proof(
    spec: &ics23::ProofSpec,
    key: &[u8],
    value: &[u8],
) -> (CommitmentProof, Vec<u8>) {
    let leaf = spec.leaf_spec.clone().expect("spec has a leaf spec");
    let proof = ExistenceProof {
        key: key.to_vec(),
        value: value.to_vec(),
        leaf: Some(leaf),
        path: vec![],
    };
    let root = ics23::calculate_existence_root::<HostFunctionsManager>(&proof)
        .expect("calculable root");
    (
        CommitmentProof {
            proof: Some(Proof::Exist(proof)),
        },
        root,
    )
}

/// A chained two-op proof for `(key, value)` in `store_prefix`, plus the
/// app root the second op commits to.
pub fn proof_ops_for(store_prefix: &str, key: &[u8], value: &[u8]) -> (ProofOps, Vec<u8>) {
    let (store_proof, subroot) = existence_proof(&ics23::iavl_spec(), key, value);
    let (root_proof, root) =
        existence_proof(&ics23::tendermint_spec(), store_prefix.as_bytes(), &subroot);

    (
        ProofOps {
            ops: vec![
                ProofOp {
                    r#type: "ics23:iavl".to_string(),
                    key: key.to_vec(),
                    data: store_proof.encode_to_vec(),
                },
                ProofOp {
                    r#type: "ics23:simple".to_string(),
                    key: store_prefix.as_bytes().to_vec(),
                    data: root_proof.encode_to_vec(),
                },
            ],
        },
        root,
    )
}

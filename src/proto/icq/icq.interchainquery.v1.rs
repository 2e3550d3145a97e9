// @generated
/// Query defines a registered interchain query and its scheduling state.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub connection_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub query_type: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "5")]
    pub request: ::prost::alloc::vec::Vec<u8>,
    /// period of the query; a negative value indicates a one-shot query.
    #[prost(int64, tag = "6")]
    pub period: i64,
    /// local height at which the query last received an accepted response.
    #[prost(uint64, tag = "7")]
    pub last_height: u64,
    #[prost(string, tag = "8")]
    pub callback_id: ::prost::alloc::string::String,
    /// when non-zero, accepted results are cached as a DataPoint.
    #[prost(uint64, tag = "9")]
    pub ttl: u64,
    /// local height of the most recent event emission for this query.
    #[prost(uint64, tag = "10")]
    pub last_emission: u64,
}
/// DataPoint is the cached copy of the last verified result for a query.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataPoint {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub remote_height: u64,
    #[prost(uint64, tag = "3")]
    pub local_height: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}
/// GenesisState defines the interchainquery module's genesis state.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GenesisState {
    #[prost(message, repeated, tag = "1")]
    pub queries: ::prost::alloc::vec::Vec<Query>,
}
/// MsgSubmitQueryResponse represents a message type to fulfil a query request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgSubmitQueryResponse {
    #[prost(string, tag = "1")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub query_id: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "3")]
    pub result: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub proof_ops: ::core::option::Option<::tendermint_proto::v0_34::crypto::ProofOps>,
    #[prost(int64, tag = "5")]
    pub height: i64,
    #[prost(string, tag = "6")]
    pub from_address: ::prost::alloc::string::String,
}
impl ::prost::Name for MsgSubmitQueryResponse {
    const NAME: &'static str = "MsgSubmitQueryResponse";
    const PACKAGE: &'static str = "icq.interchainquery.v1";
    fn full_name() -> ::prost::alloc::string::String {
        "icq.interchainquery.v1.MsgSubmitQueryResponse".into()
    }
    fn type_url() -> ::prost::alloc::string::String {
        "/icq.interchainquery.v1.MsgSubmitQueryResponse".into()
    }
}
/// MsgSubmitQueryResponseResponse defines the MsgSubmitQueryResponse response
/// type.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgSubmitQueryResponseResponse {}
/// QueryRequestsRequest is the request for the pending-queries read endpoint.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryRequestsRequest {
    #[prost(message, optional, tag = "1")]
    pub pagination:
        ::core::option::Option<::cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest>,
    #[prost(string, tag = "2")]
    pub chain_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryRequestsResponse {
    #[prost(message, repeated, tag = "1")]
    pub queries: ::prost::alloc::vec::Vec<Query>,
    #[prost(message, optional, tag = "2")]
    pub pagination:
        ::core::option::Option<::cosmos_sdk_proto::cosmos::base::query::v1beta1::PageResponse>,
}
/// GetTxWithProofResponse bundles a transaction proof with the light-client
/// header required to verify it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTxWithProofResponse {
    #[prost(message, optional, tag = "1")]
    pub proof: ::core::option::Option<::tendermint_proto::v0_34::types::TxProof>,
    #[prost(message, optional, tag = "2")]
    pub header:
        ::core::option::Option<crate::proto::ibc::lightclients::tendermint::v1::Header>,
}
// @@protoc_insertion_point(module)

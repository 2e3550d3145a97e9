// @generated
/// Height is a monotonically increasing data type that can be compared against
/// another Height for the purposes of updating and freezing clients.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Height {
    #[prost(uint64, tag = "1")]
    pub revision_number: u64,
    #[prost(uint64, tag = "2")]
    pub revision_height: u64,
}
/// QueryClientStateRequest is the request type for the Query/ClientState RPC
/// method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryClientStateRequest {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
}
/// QueryClientStateResponse is the response type for the Query/ClientState RPC
/// method.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryClientStateResponse {
    #[prost(message, optional, tag = "1")]
    pub client_state: ::core::option::Option<::prost_types::Any>,
    #[prost(bytes = "vec", tag = "2")]
    pub proof: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub proof_height: ::core::option::Option<Height>,
}
/// MsgUpdateClient defines a message to update an IBC client with a new
/// client message (a header, in this relayer's case).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgUpdateClient {
    #[prost(string, tag = "1")]
    pub client_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub client_message: ::core::option::Option<::prost_types::Any>,
    #[prost(string, tag = "3")]
    pub signer: ::prost::alloc::string::String,
}
impl ::prost::Name for MsgUpdateClient {
    const NAME: &'static str = "MsgUpdateClient";
    const PACKAGE: &'static str = "ibc.core.client.v1";
    fn full_name() -> ::prost::alloc::string::String {
        "ibc.core.client.v1.MsgUpdateClient".into()
    }
    fn type_url() -> ::prost::alloc::string::String {
        "/ibc.core.client.v1.MsgUpdateClient".into()
    }
}
/// MsgUpdateClientResponse defines the Msg/UpdateClient response type.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgUpdateClientResponse {}
// @@protoc_insertion_point(module)

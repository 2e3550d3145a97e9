// @generated
/// ClientState from Tendermint tracks the current validator set, latest
/// height, and a possible frozen height. Only the fields the relayer reads
/// are declared; the remaining fields are skipped on decode.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientState {
    #[prost(string, tag = "1")]
    pub chain_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "6")]
    pub frozen_height: ::core::option::Option<crate::proto::ibc::core::client::v1::Height>,
    #[prost(message, optional, tag = "7")]
    pub latest_height: ::core::option::Option<crate::proto::ibc::core::client::v1::Height>,
}
/// Header defines the Tendermint client consensus Header. It carries the
/// signed header and validator set at the new height together with the
/// validator set at the currently trusted height.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(message, optional, tag = "1")]
    pub signed_header: ::core::option::Option<::tendermint_proto::v0_34::types::SignedHeader>,
    #[prost(message, optional, tag = "2")]
    pub validator_set: ::core::option::Option<::tendermint_proto::v0_34::types::ValidatorSet>,
    #[prost(message, optional, tag = "3")]
    pub trusted_height: ::core::option::Option<crate::proto::ibc::core::client::v1::Height>,
    #[prost(message, optional, tag = "4")]
    pub trusted_validators: ::core::option::Option<::tendermint_proto::v0_34::types::ValidatorSet>,
}
impl ::prost::Name for Header {
    const NAME: &'static str = "Header";
    const PACKAGE: &'static str = "ibc.lightclients.tendermint.v1";
    fn full_name() -> ::prost::alloc::string::String {
        "ibc.lightclients.tendermint.v1.Header".into()
    }
    fn type_url() -> ::prost::alloc::string::String {
        "/ibc.lightclients.tendermint.v1.Header".into()
    }
}
// @@protoc_insertion_point(module)

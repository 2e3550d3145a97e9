#![allow(clippy::derive_partial_eq_without_eq)]

pub use prost;
pub use prost_types::Any;

/// Interchain query protobuf definitions.
pub mod interchainquery {
    pub mod v1 {
        include!("icq/icq.interchainquery.v1.rs");
    }
}

/// Partial mirrors of the IBC protobuf packages. Only the fields the
/// relayer reads are declared; prost skips unknown tags on decode.
pub mod ibc {
    pub mod core {
        pub mod client {
            pub mod v1 {
                include!("ibc/ibc.core.client.v1.rs");
            }
        }
        pub mod connection {
            pub mod v1 {
                include!("ibc/ibc.core.connection.v1.rs");
            }
        }
    }
    pub mod lightclients {
        pub mod tendermint {
            pub mod v1 {
                include!("ibc/ibc.lightclients.tendermint.v1.rs");
            }
        }
    }
}

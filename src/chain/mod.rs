pub mod callbacks;
pub mod endblocker;
pub mod error;
pub mod events;
pub mod keeper;
pub mod msg_server;
pub mod proof;

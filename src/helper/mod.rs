pub mod cache;
pub mod client_side;
pub mod store;
pub mod websocket;

pub mod api;
pub mod config;
pub mod error;
pub mod server_state;
pub mod suggestions;
pub mod tracker_endpoint;
pub mod tracking;

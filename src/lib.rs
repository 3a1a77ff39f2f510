pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod paths;
pub mod policy;
pub mod server;
pub mod client;

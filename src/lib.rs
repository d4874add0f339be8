pub mod address;
pub mod client;
pub mod config;
pub mod delta;
pub mod error;
pub mod poller;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod store;

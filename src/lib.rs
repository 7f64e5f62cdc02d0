pub mod config;
pub mod conservation;
pub mod domain;
pub mod error;
pub mod ids;
pub mod output;
pub mod provider;
pub mod starterator;
pub mod store;
pub mod verify;

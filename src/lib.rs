pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod store;
pub mod token;
pub mod vault;

#[cfg(feature = "keyring-store")]
pub mod keyring;

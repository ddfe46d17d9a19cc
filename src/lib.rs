pub mod alchemy;
pub mod config;
pub mod db;
pub mod error;
pub mod server;

pub use alchemy::{AlchemyClient, TenantCredential};
pub use error::BridgeError;

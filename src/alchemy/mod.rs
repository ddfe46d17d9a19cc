//! Field-discovery client for the Alchemy LIMS API.
//!
//! Resolves tenant credentials into a bearer token (cache, then refresh
//! exchange, then credential sign-in), lists record types, and normalizes the
//! upstream's inconsistent schema shapes into one field-list representation.

pub mod client;
pub(crate) mod endpoints;
pub mod extract;
pub(crate) mod ops;
pub mod token_cache;

pub use client::{AlchemyClient, TenantCredential};
pub use extract::{DiscoveredFields, FieldSource};
pub use token_cache::{CachedToken, TokenCache};

//! Serde wire types for the Alchemy LIMS API.
//!
//! The upstream API is not consistent about response shapes: the token
//! endpoint answers with either a flat grant or a per-tenant token array, the
//! record-template listing is sometimes wrapped in an envelope, and sampled
//! records expose their attributes through at least three different layouts.
//! The types here absorb that variance so the service crate works against one
//! representation.

pub mod fields;
pub mod records;
pub mod token;

pub use fields::{FieldDescriptor, FieldMappingEntry};
pub use records::{
    FilterRecordsRequest, FilterRecordsResponse, RecordPayload, RecordTemplate, RecordTemplateList,
    RecordTypeSummary, TemplateField,
};
pub use token::{SignInResponse, TenantToken, TokenGrant, TokenResponse};

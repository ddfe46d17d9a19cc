pub mod discovery;
pub mod integrations;

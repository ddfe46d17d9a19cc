use serde::{Deserialize, Deserializer, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Core server settings (the `basic` table in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    /// Listen address for the HTTP server.
    pub listen_addr: IpAddr,

    /// Listen port for the HTTP server.
    pub listen_port: u16,

    /// SQLite database URL for the integration store.
    pub database_url: String,

    /// Log level used when `RUST_LOG` is not set.
    pub loglevel: String,

    /// Shared key every configuration-API request must present. Required and
    /// non-empty; the binary refuses to serve without it. Accepts a bare
    /// number in TOML since operators keep pasting unquoted keys.
    #[serde(deserialize_with = "string_or_number")]
    pub bridge_key: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 5000,
            database_url: "sqlite://bridge.db".to_string(),
            loglevel: "info".to_string(),
            // No insecure default; startup enforces non-empty.
            bridge_key: String::new(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

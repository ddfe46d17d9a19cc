use serde::{Deserialize, Serialize};
use url::Url;

/// Alchemy upstream configuration (the `alchemy` table in config.toml).
///
/// Both base URLs default to the production cluster; tests point them at a
/// local mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlchemyConfig {
    /// Base URL of the Keycloak-style auth host. Per-tenant realm paths are
    /// appended to it.
    #[serde(default = "default_base_url")]
    pub auth_base_url: Url,

    /// Base URL of the core LIMS API host.
    #[serde(default = "default_base_url")]
    pub core_base_url: Url,

    /// OAuth client id used for the refresh-token grant.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// TCP connect timeout in seconds for outbound Alchemy calls.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Overall request timeout in seconds for outbound Alchemy calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Token lifetime assumed when a token response omits `expires_in`.
    #[serde(default = "default_token_ttl_secs")]
    pub default_token_ttl_secs: i64,

    /// Optional outbound proxy.
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl Default for AlchemyConfig {
    fn default() -> Self {
        Self {
            auth_base_url: default_base_url(),
            core_base_url: default_base_url(),
            client_id: default_client_id(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            default_token_ttl_secs: default_token_ttl_secs(),
            proxy: None,
        }
    }
}

impl AlchemyConfig {
    /// Token endpoint of the tenant's realm.
    pub fn token_url(&self, tenant_id: &str) -> Result<Url, url::ParseError> {
        self.auth_base_url
            .join(&format!("auth/realms/{tenant_id}/protocol/openid-connect/token"))
    }

    /// Multi-tenant credential sign-in endpoint.
    pub fn sign_in_url(&self) -> Result<Url, url::ParseError> {
        self.core_base_url.join("core/api/v2/sign-in")
    }

    /// Record-template listing endpoint.
    pub fn record_templates_url(&self) -> Result<Url, url::ParseError> {
        self.core_base_url.join("core/api/v2/record-templates")
    }

    /// Record-search endpoint used for bounded sample queries.
    pub fn filter_records_url(&self) -> Result<Url, url::ParseError> {
        self.core_base_url.join("core/api/v2/filter-records")
    }
}

fn default_base_url() -> Url {
    Url::parse("https://core-production.alchemy.cloud").expect("valid default Alchemy base URL")
}

fn default_client_id() -> String {
    "alchemy-web-client".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_token_ttl_secs() -> i64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_path_embeds_tenant_id() {
        let cfg = AlchemyConfig::default();
        let url = cfg.token_url("acme-lab").expect("token url");
        assert_eq!(
            url.as_str(),
            "https://core-production.alchemy.cloud/auth/realms/acme-lab/protocol/openid-connect/token"
        );
    }

    #[test]
    fn core_endpoints_share_the_core_base() {
        let cfg = AlchemyConfig::default();
        assert!(
            cfg.filter_records_url()
                .expect("filter url")
                .path()
                .ends_with("/core/api/v2/filter-records")
        );
        assert!(
            cfg.record_templates_url()
                .expect("templates url")
                .path()
                .ends_with("/core/api/v2/record-templates")
        );
    }
}

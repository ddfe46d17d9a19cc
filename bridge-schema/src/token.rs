use serde::{Deserialize, Serialize};

/// Flat OAuth-style grant returned by the per-realm refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// One per-tenant entry from the multi-tenant token array.
///
/// Deployments disagree on the key name for the token itself, hence the
/// `token` alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantToken {
    pub tenant: String,
    #[serde(rename = "accessToken", alias = "token")]
    pub access_token: String,
    #[serde(default, rename = "expiresIn")]
    pub expires_in: Option<i64>,
}

/// Token endpoint response. Both observed shapes are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Grant(TokenGrant),
    Tenants { tokens: Vec<TenantToken> },
}

/// Response of the credential sign-in endpoint: one token per tenant the
/// account belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    #[serde(default)]
    pub tokens: Vec<TenantToken>,
}

impl SignInResponse {
    pub fn token_for_tenant(&self, tenant_id: &str) -> Option<&TenantToken> {
        self.tokens.iter().find(|t| t.tenant == tenant_id)
    }

    /// All tenant identifiers present in the response, in response order.
    pub fn tenant_ids(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.tenant.clone()).collect()
    }
}

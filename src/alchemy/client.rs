use super::endpoints::AlchemyEndpoints;
use super::extract::{self, DiscoveredFields, FieldSource};
use super::ops::AlchemyOps;
use super::token_cache::{CachedToken, TokenCache};
use crate::config::AlchemyConfig;
use crate::error::BridgeError;
use bridge_schema::{RecordTypeSummary, TokenResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Credential material supplied for one tenant.
#[derive(Debug, Clone)]
pub enum TenantCredential {
    RefreshToken(String),
    Password { email: String, password: String },
}

/// Field-discovery client. Owns its token cache and HTTP client; cloning
/// shares both.
#[derive(Clone)]
pub struct AlchemyClient {
    cfg: Arc<AlchemyConfig>,
    http: reqwest::Client,
    tokens: TokenCache,
}

impl AlchemyClient {
    pub fn new(cfg: Arc<AlchemyConfig>) -> Self {
        let mut builder = reqwest::Client::builder()
            .user_agent("alchemy-bridge/0.3")
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs));
        if let Some(proxy_url) = cfg.proxy.clone() {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .expect("invalid alchemy.proxy url for reqwest client");
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .expect("FATAL: initialize Alchemy HTTP client failed");

        Self {
            cfg,
            http,
            tokens: TokenCache::default(),
        }
    }

    pub fn config(&self) -> &AlchemyConfig {
        &self.cfg
    }

    /// Shared outbound HTTP client (timeouts already configured).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve a usable bearer token for the tenant.
    ///
    /// Order: cached non-expired token (no network), refresh-token exchange,
    /// credential sign-in. A fetched token is cached before being returned.
    pub async fn get_token(
        &self,
        tenant_id: &str,
        credential: &TenantCredential,
    ) -> Result<CachedToken, BridgeError> {
        if let Some(token) = self.tokens.get_fresh(tenant_id) {
            debug!(%tenant_id, "token cache hit");
            return Ok(token);
        }

        let token = match credential {
            TenantCredential::RefreshToken(refresh_token) => {
                self.exchange_refresh(tenant_id, refresh_token).await?
            }
            TenantCredential::Password { email, password } => {
                self.sign_in(tenant_id, email, password).await?
            }
        };

        self.tokens.insert(tenant_id, token.clone());
        Ok(token)
    }

    async fn exchange_refresh(
        &self,
        tenant_id: &str,
        refresh_token: &str,
    ) -> Result<CachedToken, BridgeError> {
        let resp = AlchemyOps::exchange_refresh_token_with_retry(
            &self.cfg,
            tenant_id,
            refresh_token,
            self.http.clone(),
        )
        .await?;

        let token = match resp {
            TokenResponse::Grant(grant) => CachedToken::new(
                grant.access_token,
                grant.expires_in.unwrap_or(self.cfg.default_token_ttl_secs),
            ),
            TokenResponse::Tenants { tokens } => {
                let available: Vec<String> = tokens.iter().map(|t| t.tenant.clone()).collect();
                let entry = tokens
                    .into_iter()
                    .find(|t| t.tenant == tenant_id)
                    .ok_or_else(|| BridgeError::TenantNotFound {
                        tenant_id: tenant_id.to_string(),
                        available,
                    })?;
                CachedToken::new(
                    entry.access_token,
                    entry.expires_in.unwrap_or(self.cfg.default_token_ttl_secs),
                )
            }
        };

        info!(%tenant_id, "access token refreshed");
        Ok(token)
    }

    async fn sign_in(
        &self,
        tenant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<CachedToken, BridgeError> {
        let resp =
            AlchemyOps::sign_in_with_retry(&self.cfg, email, password, self.http.clone()).await?;

        let available = resp.tenant_ids();
        let entry =
            resp.token_for_tenant(tenant_id)
                .ok_or_else(|| BridgeError::TenantNotFound {
                    tenant_id: tenant_id.to_string(),
                    available,
                })?;

        info!(%tenant_id, "signed in with account credentials");
        Ok(CachedToken::new(
            entry.access_token.as_str(),
            entry.expires_in.unwrap_or(self.cfg.default_token_ttl_secs),
        ))
    }

    /// Drop the tenant's cached token when the core API says it is no longer
    /// accepted, so the next call resolves a fresh one.
    fn note_upstream_failure(&self, tenant_id: &str, err: &BridgeError) {
        if let BridgeError::UpstreamStatus(status) = err
            && *status == reqwest::StatusCode::UNAUTHORIZED
        {
            self.tokens.invalidate(tenant_id);
            debug!(%tenant_id, "cached token rejected upstream, invalidated");
        }
    }

    /// Record types the tenant exposes, as `{identifier, name}` summaries.
    /// Returns an empty ordered sequence (never null) on any failure, with
    /// the cause logged.
    pub async fn list_record_types(
        &self,
        token: &CachedToken,
        tenant_id: &str,
    ) -> Vec<RecordTypeSummary> {
        match AlchemyEndpoints::list_record_templates(
            &self.cfg,
            token.value.as_ref(),
            self.http.clone(),
        )
        .await
        {
            Ok(templates) => templates.into_iter().map(RecordTypeSummary::from).collect(),
            Err(e) => {
                self.note_upstream_failure(tenant_id, &e);
                warn!(%tenant_id, error = %e, "record template listing failed");
                Vec::new()
            }
        }
    }

    /// Full discovery: resolve a token, then walk the field cascade.
    ///
    /// Token-acquisition failures (`AuthFailure`, `TenantNotFound`) propagate
    /// as errors; once authenticated, every failure resolves to the fallback
    /// field set tagged `FieldSource::Fallback`.
    pub async fn get_fields(
        &self,
        tenant_id: &str,
        credential: &TenantCredential,
        record_type: &str,
    ) -> Result<DiscoveredFields, BridgeError> {
        let token = self.get_token(tenant_id, credential).await?;
        Ok(self.discover_fields(&token, tenant_id, record_type).await)
    }

    /// Post-auth discovery rungs; first non-empty result wins.
    pub async fn discover_fields(
        &self,
        token: &CachedToken,
        tenant_id: &str,
        record_type: &str,
    ) -> DiscoveredFields {
        // Template metadata is authoritative when it carries fields; it also
        // skips the sample query entirely.
        match AlchemyEndpoints::list_record_templates(
            &self.cfg,
            token.value.as_ref(),
            self.http.clone(),
        )
        .await
        {
            Ok(templates) => {
                if let Some(template) = templates.iter().find(|t| t.identifier == record_type)
                    && let Some(fields) = extract::fields_from_template(template)
                {
                    return DiscoveredFields {
                        fields,
                        source: FieldSource::TemplateMetadata,
                    };
                }
            }
            Err(e) => {
                self.note_upstream_failure(tenant_id, &e);
                warn!(%tenant_id, %record_type, error = %e, "template metadata probe failed");
            }
        }

        match AlchemyEndpoints::filter_records(
            &self.cfg,
            token.value.as_ref(),
            record_type,
            self.http.clone(),
        )
        .await
        {
            Ok(records) => {
                if let Some(record) = records.first() {
                    if let Some(found) = extract::fields_from_record(record) {
                        return found;
                    }
                    warn!(%tenant_id, %record_type, "sample record carried no recognizable field shape");
                } else {
                    warn!(%tenant_id, %record_type, "no records matched the sample query");
                }
            }
            Err(e) => {
                self.note_upstream_failure(tenant_id, &e);
                warn!(%tenant_id, %record_type, error = %e, "sample record query failed");
            }
        }

        info!(%tenant_id, %record_type, "substituting fallback fields");
        DiscoveredFields {
            fields: extract::fallback_fields(),
            source: FieldSource::Fallback,
        }
    }
}

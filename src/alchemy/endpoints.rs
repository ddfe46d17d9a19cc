use crate::config::AlchemyConfig;
use crate::error::{BridgeError, truncate_body};
use bridge_schema::{
    FilterRecordsRequest, FilterRecordsResponse, RecordPayload, RecordTemplate, RecordTemplateList,
    SignInResponse, TokenResponse,
};
use serde_json::json;
use tracing::warn;

/// Stateless Alchemy endpoint layer. Callers pass the shared HTTP client;
/// policy (caching, retries, fallback) lives above this layer.
pub(crate) struct AlchemyEndpoints;

impl AlchemyEndpoints {
    /// Exchange a refresh token at the tenant realm's token endpoint.
    ///
    /// Non-2xx responses are definitive credential rejections here; the body
    /// is logged and carried (truncated) inside the error.
    pub(crate) async fn exchange_refresh_token(
        cfg: &AlchemyConfig,
        tenant_id: &str,
        refresh_token: &str,
        http_client: reqwest::Client,
    ) -> Result<TokenResponse, BridgeError> {
        let url = cfg.token_url(tenant_id)?;
        let resp = http_client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", cfg.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                %tenant_id,
                %status,
                body = %truncate_body(&body),
                "Alchemy token refresh rejected"
            );
            return Err(BridgeError::AuthFailure {
                status,
                body: truncate_body(&body),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| BridgeError::Parse {
            message: e.to_string(),
            body: truncate_body(&body),
        })
    }

    /// Direct credential sign-in. Answers with one token per tenant the
    /// account belongs to.
    pub(crate) async fn sign_in(
        cfg: &AlchemyConfig,
        email: &str,
        password: &str,
        http_client: reqwest::Client,
    ) -> Result<SignInResponse, BridgeError> {
        let url = cfg.sign_in_url()?;
        let resp = http_client
            .put(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_body(&body), "Alchemy sign-in rejected");
            return Err(BridgeError::AuthFailure {
                status,
                body: truncate_body(&body),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| BridgeError::Parse {
            message: e.to_string(),
            body: truncate_body(&body),
        })
    }

    /// Fetch the record templates the tenant exposes.
    pub(crate) async fn list_record_templates(
        cfg: &AlchemyConfig,
        access_token: &str,
        http_client: reqwest::Client,
    ) -> Result<Vec<RecordTemplate>, BridgeError> {
        let url = cfg.record_templates_url()?;
        let resp = http_client.get(url).bearer_auth(access_token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::UpstreamStatus(status));
        }

        let body = resp.text().await?;
        let list: RecordTemplateList =
            serde_json::from_str(&body).map_err(|e| BridgeError::Parse {
                message: e.to_string(),
                body: truncate_body(&body),
            })?;
        Ok(list.into_vec())
    }

    /// Bounded sample query: exactly one record of the given type.
    pub(crate) async fn filter_records(
        cfg: &AlchemyConfig,
        access_token: &str,
        record_type: &str,
        http_client: reqwest::Client,
    ) -> Result<Vec<RecordPayload>, BridgeError> {
        let url = cfg.filter_records_url()?;
        let resp = http_client
            .put(url)
            .bearer_auth(access_token)
            .json(&FilterRecordsRequest::sample(record_type))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::UpstreamStatus(status));
        }

        let body = resp.text().await?;
        let parsed: FilterRecordsResponse =
            serde_json::from_str(&body).map_err(|e| BridgeError::Parse {
                message: e.to_string(),
                body: truncate_body(&body),
            })?;
        Ok(parsed.into_records())
    }
}

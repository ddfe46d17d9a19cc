use super::endpoints::AlchemyEndpoints;
use crate::config::AlchemyConfig;
use crate::error::{BridgeError, IsRetryable};
use backon::{ExponentialBuilder, Retryable};
use bridge_schema::{SignInResponse, TokenResponse};
use std::{sync::LazyLock, time::Duration};
use tracing::warn;

pub(crate) static TOKEN_RETRY_POLICY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(2)
        .with_jitter()
});

/// Retry wrappers over the token endpoints. Only transport-level failures are
/// retried; a definitive credential rejection goes straight through.
pub(crate) struct AlchemyOps;

impl AlchemyOps {
    pub(crate) async fn exchange_refresh_token_with_retry(
        cfg: &AlchemyConfig,
        tenant_id: &str,
        refresh_token: &str,
        http_client: reqwest::Client,
    ) -> Result<TokenResponse, BridgeError> {
        let retry_policy = *TOKEN_RETRY_POLICY;

        (|| async {
            AlchemyEndpoints::exchange_refresh_token(
                cfg,
                tenant_id,
                refresh_token,
                http_client.clone(),
            )
            .await
        })
        .retry(retry_policy)
        .when(|e: &BridgeError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("token refresh retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }

    pub(crate) async fn sign_in_with_retry(
        cfg: &AlchemyConfig,
        email: &str,
        password: &str,
        http_client: reqwest::Client,
    ) -> Result<SignInResponse, BridgeError> {
        let retry_policy = *TOKEN_RETRY_POLICY;

        (|| async { AlchemyEndpoints::sign_in(cfg, email, password, http_client.clone()).await })
            .retry(retry_policy)
            .when(|e: &BridgeError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!("sign-in retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }
}

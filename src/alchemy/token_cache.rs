use chrono::{DateTime, Duration, Utc};
use moka::sync::Cache;
use std::sync::Arc;

/// Treat a token as expired this long before its stated expiry so a request
/// never starts with a token that lapses mid-flight.
const EXPIRY_MARGIN_SECS: i64 = 30;

const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Short-lived bearer token for one tenant. Held in process memory only.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: Arc<str>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(value: impl Into<Arc<str>>, expires_in_secs: i64) -> Self {
        Self {
            value: value.into(),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
        }
    }

    /// Return true if current time is within the safety margin of expiry
    /// (inclusive).
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    /// Whole seconds until the stated expiry (not margin-adjusted). Negative
    /// once past it.
    pub fn seconds_remaining(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

/// Per-tenant token cache owned by the client instance. Injected rather than
/// process-global so each test gets an isolated cache.
///
/// Concurrent refreshes for the same tenant may race; last writer wins, which
/// is safe because every inserted token is valid.
#[derive(Clone)]
pub struct TokenCache {
    cache: Cache<String, CachedToken>,
}

impl TokenCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity.max(1)).build(),
        }
    }

    /// Cached token for the tenant, unless it is within the expiry margin.
    pub fn get_fresh(&self, tenant_id: &str) -> Option<CachedToken> {
        self.cache.get(tenant_id).filter(|token| !token.is_expired())
    }

    pub fn insert(&self, tenant_id: &str, token: CachedToken) {
        self.cache.insert(tenant_id.to_string(), token);
    }

    pub fn invalidate(&self, tenant_id: &str) {
        self.cache.invalidate(tenant_id);
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

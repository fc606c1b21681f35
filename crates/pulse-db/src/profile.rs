//! User profile repository and read-through cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::debug;

use pulse_core::{Error, ProfileStore, Result, UserProfile};

/// How long a cached profile stays fresh before the next read refetches.
pub const DEFAULT_PROFILE_TTL_SECS: u64 = 300;

/// PostgreSQL implementation of ProfileStore.
///
/// The profile is a singleton row (id = 1) holding the profile as JSONB.
/// A missing row yields the default profile rather than an error, so a
/// fresh install works before the user has configured anything.
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the singleton profile row.
    pub async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_value(profile)?;
        sqlx::query(
            "INSERT INTO user_profile (id, profile, updated_at)
             VALUES (1, $1, NOW())
             ON CONFLICT (id) DO UPDATE
                SET profile = EXCLUDED.profile, updated_at = NOW()",
        )
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgProfileRepository {
    async fn get_profile(&self) -> Result<UserProfile> {
        let row = sqlx::query("SELECT profile FROM user_profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => {
                let json: serde_json::Value = row.get("profile");
                Ok(serde_json::from_value(json)?)
            }
            None => Ok(UserProfile::default()),
        }
    }
}

struct CachedProfile {
    profile: UserProfile,
    fetched_at: Instant,
}

/// Read-through cache over any ProfileStore.
///
/// The profile changes rarely but is read on every query, so reads serve
/// from memory until the TTL expires. `invalidate` forces the next read to
/// hit the inner store.
pub struct ProfileCache<S> {
    inner: Arc<S>,
    ttl: Duration,
    cached: RwLock<Option<CachedProfile>>,
}

impl<S: ProfileStore> ProfileCache<S> {
    /// Wrap a store with the default TTL.
    pub fn new(inner: Arc<S>) -> Self {
        Self::with_ttl(inner, Duration::from_secs(DEFAULT_PROFILE_TTL_SECS))
    }

    /// Wrap a store with a custom TTL.
    pub fn with_ttl(inner: Arc<S>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached copy so the next read refetches.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for ProfileCache<S> {
    async fn get_profile(&self) -> Result<UserProfile> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.profile.clone());
                }
            }
        }

        let profile = self.inner.get_profile().await?;
        debug!(subsystem = "db", op = "profile_refresh", "Profile cache refreshed");
        *self.cached.write().await = Some(CachedProfile {
            profile: profile.clone(),
            fetched_at: Instant::now(),
        });
        Ok(profile)
    }
}

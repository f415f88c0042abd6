// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use chrono::{DateTime, Utc};

use crate::errors::AgentError;
use crate::federation::{IdentityFederator, IdentityProvider};
use crate::models::{CredentialRecord, FederationConfig};
use crate::store::CredentialStore;

/// Serves stored credentials while they are valid, otherwise federates and
/// stores the fresh record.
pub struct CredentialCache<S, P> {
    store: S,
    federator: IdentityFederator<P>,
}

impl<S: CredentialStore, P: IdentityProvider> CredentialCache<S, P> {
    pub fn new(store: S, federator: IdentityFederator<P>) -> Self {
        Self { store, federator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn federator(&self) -> &IdentityFederator<P> {
        &self.federator
    }

    /// Returns credentials usable at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if federation fails or the fresh record cannot be
    /// persisted. A missing or unreadable stored record is not an error.
    #[tracing::instrument(skip(self, config))]
    pub async fn resolve(
        &self,
        config: &FederationConfig,
        now: DateTime<Utc>,
    ) -> Result<CredentialRecord, AgentError> {
        // Fast path: stored credentials that have not expired yet
        match self.store.load() {
            Some(record) if record.is_usable_at(now) => {
                tracing::info!(
                    "[agent] using cached credentials, expiration: {}",
                    record.expiration
                );
                return Ok(record);
            }
            Some(record) => {
                tracing::info!(
                    "[agent] cached credentials expired at {}",
                    record.expiration
                );
            }
            None => {}
        }

        // Slow path: federate and persist
        let record = self.federator.federate(config).await?;
        self.store.save(&record)?;

        tracing::info!(
            "[agent] federated new credentials, expiration: {}",
            record.expiration
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federation::LoginProof;
    use crate::models::IssuedCredentials;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryStore {
        record: Mutex<Option<CredentialRecord>>,
        fail_save: bool,
    }

    impl MemoryStore {
        fn with(record: Option<CredentialRecord>) -> Self {
            Self {
                record: Mutex::new(record),
                fail_save: false,
            }
        }
    }

    impl CredentialStore for MemoryStore {
        fn load(&self) -> Option<CredentialRecord> {
            self.record.lock().unwrap().clone()
        }

        fn save(&self, record: &CredentialRecord) -> Result<(), AgentError> {
            if self.fail_save {
                return Err(AgentError::PersistenceError {
                    path: "memory".to_string(),
                    message: "read-only".to_string(),
                });
            }
            *self.record.lock().unwrap() = Some(record.clone());
            Ok(())
        }
    }

    struct CountingProvider {
        expiration: DateTime<Utc>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn authenticate(&self, _: &str, _: &str, _: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("id-token".to_string())
        }

        async fn resolve_identity(&self, _: &str, _: &LoginProof) -> Result<String> {
            Ok("identity".to_string())
        }

        async fn exchange_for_credentials(
            &self,
            _: &str,
            _: &LoginProof,
        ) -> Result<IssuedCredentials> {
            Ok(IssuedCredentials {
                access_key_id: "ASIAFRESH".to_string(),
                secret_key: "fresh-secret".to_string(),
                session_token: "fresh-token".to_string(),
                expiration: self.expiration.fixed_offset(),
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn config() -> FederationConfig {
        FederationConfig {
            username: "ops@example.com".to_string(),
            password: "hunter2".to_string(),
            user_pool_id: "us-west-2_AbCdEf".to_string(),
            identity_pool_id: "us-west-2:pool".to_string(),
            client_id: "client".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    fn stored(expiration: DateTime<Utc>) -> CredentialRecord {
        CredentialRecord {
            access_key_id: "ASIASTORED".to_string(),
            secret_key: "stored-secret".to_string(),
            session_token: "stored-token".to_string(),
            expiration,
        }
    }

    fn cache(store: MemoryStore) -> CredentialCache<MemoryStore, CountingProvider> {
        let provider = CountingProvider {
            expiration: now() + Duration::hours(1),
            calls: AtomicUsize::new(0),
        };
        CredentialCache::new(store, IdentityFederator::new(provider))
    }

    fn federations(cache: &CredentialCache<MemoryStore, CountingProvider>) -> usize {
        cache.federator().provider().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_valid_stored_record_is_returned_without_federating() {
        let record = stored(now() + Duration::seconds(1));
        let cache = cache(MemoryStore::with(Some(record.clone())));

        let resolved = cache.resolve(&config(), now()).await.unwrap();

        assert_eq!(resolved, record);
        assert_eq!(federations(&cache), 0);
    }

    #[tokio::test]
    async fn test_record_expiring_now_is_refreshed() {
        let cache = cache(MemoryStore::with(Some(stored(now()))));

        let resolved = cache.resolve(&config(), now()).await.unwrap();

        assert_eq!(resolved.access_key_id, "ASIAFRESH");
        assert_eq!(federations(&cache), 1);
    }

    #[tokio::test]
    async fn test_expired_record_is_replaced_in_store() {
        let cache = cache(MemoryStore::with(Some(stored(now() - Duration::minutes(5)))));

        let resolved = cache.resolve(&config(), now()).await.unwrap();

        assert_eq!(resolved.expiration, now() + Duration::hours(1));
        assert_eq!(cache.store().load(), Some(resolved));
    }

    #[tokio::test]
    async fn test_missing_record_federates_once_then_serves_from_store() {
        let cache = cache(MemoryStore::with(None));

        let first = cache.resolve(&config(), now()).await.unwrap();
        let second = cache
            .resolve(&config(), now() + Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(federations(&cache), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let mut store = MemoryStore::with(None);
        store.fail_save = true;
        let cache = cache(store);

        let err = cache.resolve(&config(), now()).await.unwrap_err();

        assert!(matches!(err, AgentError::PersistenceError { .. }));
        assert_eq!(federations(&cache), 1);
    }
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use chrono::{DateTime, Utc};

use crate::cache::CredentialCache;
use crate::collector::{DiskUsage, MetricCollector, StatvfsDiskUsage};
use crate::configuration::AgentOptions;
use crate::errors::AgentError;
use crate::federation::{CognitoIdentityProvider, IdentityFederator, IdentityProvider};
use crate::models::{FederationConfig, MetricSample, MetricTarget};
use crate::publisher::{CloudWatchPublisher, MetricsBackend};
use crate::store::{CredentialStore, FileCredentialStore};

/// The production wiring: cache file, Cognito, `statvfs` and CloudWatch.
pub type DefaultApplication = Application<
    FileCredentialStore,
    CognitoIdentityProvider,
    StatvfsDiskUsage,
    CloudWatchPublisher,
>;

/// One run of the agent: resolve credentials, sample disk usage, publish it.
pub struct Application<S, P, D, M> {
    federation: FederationConfig,
    target: MetricTarget,
    cache: CredentialCache<S, P>,
    collector: MetricCollector<D>,
    publisher: M,
}

impl DefaultApplication {
    pub async fn build(options: &AgentOptions) -> Self {
        let timeout = options.request_timeout();
        let provider = CognitoIdentityProvider::new(&options.region, timeout).await;

        tracing::debug!(
            "[agent] credentials file: {}",
            options.credentials_file.display()
        );

        Application::new(
            options.federation_config(),
            options.metric_target(),
            CredentialCache::new(
                FileCredentialStore::new(options.credentials_file.clone()),
                IdentityFederator::new(provider),
            ),
            MetricCollector::new(StatvfsDiskUsage),
            CloudWatchPublisher::new(timeout),
        )
    }
}

impl<S, P, D, M> Application<S, P, D, M>
where
    S: CredentialStore,
    P: IdentityProvider,
    D: DiskUsage,
    M: MetricsBackend,
{
    pub fn new(
        federation: FederationConfig,
        target: MetricTarget,
        cache: CredentialCache<S, P>,
        collector: MetricCollector<D>,
        publisher: M,
    ) -> Self {
        Self {
            federation,
            target,
            cache,
            collector,
            publisher,
        }
    }

    pub fn cache(&self) -> &CredentialCache<S, P> {
        &self.cache
    }

    pub fn publisher(&self) -> &M {
        &self.publisher
    }

    /// Runs every stage in order and returns the published sample.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed; later stages are
    /// not attempted.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<MetricSample, AgentError> {
        let credentials = self.cache.resolve(&self.federation, now).await?;

        let sample = self.collector.collect(&self.target.volume)?;

        tracing::debug!("[agent] collected {:?}", sample);

        self.publisher
            .publish(
                &self.target.namespace,
                &sample,
                &credentials,
                &self.target.region,
            )
            .await
            .map_err(|err| AgentError::MetricPublishError(format!("{err:#}")))?;

        tracing::info!(
            "[agent] published {} {} {} to {}",
            sample.name,
            sample.value,
            sample.unit.as_str(),
            self.target.namespace
        );

        Ok(sample)
    }
}

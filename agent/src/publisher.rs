// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{MetricDatum, StandardUnit};

use crate::models::{CredentialRecord, MetricSample, MetricUnit};
use crate::sdk;

/// Destination for metric samples.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Submits `sample` under `namespace`, signed with the temporary credentials.
    async fn publish(
        &self,
        namespace: &str,
        sample: &MetricSample,
        credentials: &CredentialRecord,
        region: &str,
    ) -> Result<()>;
}

/// [`MetricsBackend`] that calls CloudWatch `PutMetricData`.
#[derive(Debug, Clone)]
pub struct CloudWatchPublisher {
    timeout: Duration,
}

impl CloudWatchPublisher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl MetricsBackend for CloudWatchPublisher {
    #[tracing::instrument(skip(self, sample, credentials))]
    async fn publish(
        &self,
        namespace: &str,
        sample: &MetricSample,
        credentials: &CredentialRecord,
        region: &str,
    ) -> Result<()> {
        let config = sdk::config_loader(region, self.timeout)
            .credentials_provider(Credentials::from(credentials))
            .load()
            .await;
        let client = aws_sdk_cloudwatch::Client::new(&config);

        client
            .put_metric_data()
            .namespace(namespace)
            .metric_data(metric_datum(sample))
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "PutMetricData failed: {}",
                    aws_sdk_cloudwatch::error::DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }
}

pub fn metric_datum(sample: &MetricSample) -> MetricDatum {
    MetricDatum::builder()
        .metric_name(sample.name.as_str())
        .value(sample.value)
        .unit(standard_unit(sample.unit))
        .timestamp(DateTime::from_millis(sample.timestamp.timestamp_millis()))
        .build()
}

fn standard_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Percent => StandardUnit::Percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_metric_datum_shape() {
        let sample = MetricSample {
            name: "DiskUsage".to_string(),
            value: 57.3,
            unit: MetricUnit::Percent,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };

        let datum = metric_datum(&sample);

        assert_eq!(datum.metric_name(), Some("DiskUsage"));
        assert_eq!(datum.value(), Some(57.3));
        assert_eq!(datum.unit(), Some(&StandardUnit::Percent));
        assert_eq!(
            datum.timestamp(),
            Some(&DateTime::from_secs(sample.timestamp.timestamp()))
        );
        assert!(datum.dimensions().is_empty());
    }

    #[test]
    fn test_unit_mapping() {
        assert_eq!(
            standard_unit(MetricUnit::Percent).as_str(),
            MetricUnit::Percent.as_str()
        );
    }
}

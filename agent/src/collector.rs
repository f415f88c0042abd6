// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use nix::sys::statvfs::statvfs;

use crate::constants::{MAX_PERCENT, METRIC_NAME_DISK_USAGE};
use crate::errors::AgentError;
use crate::models::{MetricSample, MetricUnit};

/// Source of the disk usage percentage of a volume.
pub trait DiskUsage: Send + Sync {
    fn usage_percent(&self, path: &Path) -> Result<f64>;
}

/// [`DiskUsage`] read with `statvfs(3)` on the volume path itself, so virtual
/// filesystems such as tmpfs are measured like any other mount.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsDiskUsage;

impl DiskUsage for StatvfsDiskUsage {
    fn usage_percent(&self, path: &Path) -> Result<f64> {
        let stat = statvfs(path).with_context(|| format!("statvfs {} failed", path.display()))?;

        let total = u64::from(stat.blocks());
        let free = u64::from(stat.blocks_free());
        let available = u64::from(stat.blocks_available());

        tracing::debug!(
            "[agent] {}: {} blocks of {} bytes, {} free, {} available",
            path.display(),
            total,
            stat.fragment_size(),
            free,
            available
        );

        Ok(usage_from_blocks(total, free, available))
    }
}

/// Used share of a filesystem in percent, rounded to one decimal place.
///
/// Blocks reserved for the superuser count as neither used nor available,
/// the same figure `df` reports. A filesystem without any blocks is 0% used.
fn usage_from_blocks(total: u64, free: u64, available: u64) -> f64 {
    let used = total.saturating_sub(free);
    let capacity = used.saturating_add(available);
    if capacity == 0 {
        return 0.0;
    }
    let percent = used as f64 / capacity as f64 * MAX_PERCENT;
    (percent * 10.0).round() / 10.0
}

/// Samples the disk usage metric.
pub struct MetricCollector<D> {
    disk_usage: D,
}

impl<D: DiskUsage> MetricCollector<D> {
    pub fn new(disk_usage: D) -> Self {
        Self { disk_usage }
    }

    /// Returns a `DiskUsage` sample for `volume` stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MetricCollectionError`] if the usage cannot be read
    /// or is not a percentage.
    #[tracing::instrument(skip(self))]
    pub fn collect(&self, volume: &Path) -> Result<MetricSample, AgentError> {
        let collection_error = |message: String| AgentError::MetricCollectionError {
            path: volume.display().to_string(),
            message,
        };

        let value = self
            .disk_usage
            .usage_percent(volume)
            .map_err(|err| collection_error(format!("{err:#}")))?;

        if !value.is_finite() || !(0.0..=MAX_PERCENT).contains(&value) {
            return Err(collection_error(format!(
                "usage {value} is not a percentage"
            )));
        }

        Ok(MetricSample {
            name: METRIC_NAME_DISK_USAGE.to_string(),
            value,
            unit: MetricUnit::Percent,
            timestamp: Utc::now(),
        })
    }
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, ConfigLoader, Region};

/// Shared SDK settings for every backend call: one attempt per operation,
/// bounded by `timeout`.
///
/// Credentials are left to the caller: the identity calls are unsigned and
/// CloudWatch is signed with the federated credentials.
pub fn config_loader(region: &str, timeout: Duration) -> ConfigLoader {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::disabled())
        .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
}

// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const DEFAULT_CREDENTIALS_FILE: &str = "creds.json";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// read from the environment only, never from a flag
pub const PASSWORD_ENV: &str = "PASSWORD";

/// Cognito user pool identity providers are named `cognito-idp.<region>.amazonaws.com/<pool>`
pub const COGNITO_PROVIDER_HOST_PREFIX: &str = "cognito-idp";
pub const COGNITO_PROVIDER_HOST_SUFFIX: &str = "amazonaws.com";

// InitiateAuth parameters for the USER_PASSWORD_AUTH flow
pub const AUTH_PARAM_USERNAME: &str = "USERNAME";
pub const AUTH_PARAM_PASSWORD: &str = "PASSWORD";

pub const METRIC_NAME_DISK_USAGE: &str = "DiskUsage";
pub const MAX_PERCENT: f64 = 100.0;

/// Name attached to credentials handed to SDK clients
pub const CREDENTIALS_PROVIDER_NAME: &str = "CognitoFederation";

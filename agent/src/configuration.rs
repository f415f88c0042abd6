// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::constants::{DEFAULT_CREDENTIALS_FILE, DEFAULT_REQUEST_TIMEOUT, PASSWORD_ENV};
use crate::errors::AgentError;
use crate::models::{FederationConfig, MetricTarget};

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AgentOptions {
    #[arg(long, env("EMAIL"))]
    pub email: String,
    /// Set by [`AgentOptions::read_password`], never from the command line.
    #[arg(skip)]
    pub password: String,
    #[arg(long, env("USER_POOL_ID"))]
    pub user_pool_id: String,
    #[arg(long, env("IDENTITY_POOL_ID"))]
    pub identity_pool_id: String,
    #[arg(long, env("CLIENT_ID"))]
    pub client_id: String,
    #[arg(long, env("REGION"))]
    pub region: String,
    #[arg(long, env("CW_NAMESPACE"))]
    pub cw_namespace: String,
    #[arg(long, env("VOL"))]
    pub vol: PathBuf,
    #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE, env("CREDENTIALS_FILE"))]
    pub credentials_file: PathBuf,
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(), env("REQUEST_TIMEOUT_SECS"))]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for AgentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentOptions")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("user_pool_id", &self.user_pool_id)
            .field("identity_pool_id", &self.identity_pool_id)
            .field("client_id", &self.client_id)
            .field("region", &self.region)
            .field("cw_namespace", &self.cw_namespace)
            .field("vol", &self.vol)
            .field("credentials_file", &self.credentials_file)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Loads variables from a `.env` file in the working directory or one of its
/// parents. Variables that are already set are left untouched.
///
/// Returns the path of the file that was loaded, or `None` if there is none.
pub fn load_env_file() -> Result<Option<PathBuf>, AgentError> {
    env_file_outcome(dotenvy::dotenv(), Path::new(".env"))
}

fn env_file_outcome(
    result: dotenvy::Result<PathBuf>,
    path: &Path,
) -> Result<Option<PathBuf>, AgentError> {
    match result {
        Ok(loaded) => Ok(Some(loaded)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(AgentError::ConfigError(format!(
            "unable to load {}: {}",
            path.display(),
            err
        ))),
    }
}

impl AgentOptions {
    /// Fills in the password from `PASSWORD` using `lookup`.
    pub fn read_password(mut self, lookup: impl FnOnce(&str) -> Option<String>) -> Self {
        self.password = lookup(PASSWORD_ENV).unwrap_or_default();
        self
    }

    /// Rejects blank settings and malformed region names.
    pub fn validate(&self) -> Result<(), AgentError> {
        let required = [
            ("EMAIL", self.email.as_str()),
            ("PASSWORD", self.password.as_str()),
            ("USER_POOL_ID", self.user_pool_id.as_str()),
            ("IDENTITY_POOL_ID", self.identity_pool_id.as_str()),
            ("CLIENT_ID", self.client_id.as_str()),
            ("REGION", self.region.as_str()),
            ("CW_NAMESPACE", self.cw_namespace.as_str()),
        ];
        let blank: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !blank.is_empty() {
            return Err(AgentError::ConfigError(format!(
                "missing environment variables: {}",
                blank.join(", ")
            )));
        }

        if self.vol.as_os_str().is_empty() {
            return Err(AgentError::ConfigError(
                "missing environment variables: VOL".to_string(),
            ));
        }

        if !is_valid_aws_region(&self.region) {
            return Err(AgentError::ConfigError(format!(
                "invalid region: {}",
                self.region
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(AgentError::ConfigError(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn federation_config(&self) -> FederationConfig {
        FederationConfig {
            username: self.email.clone(),
            password: self.password.clone(),
            user_pool_id: self.user_pool_id.clone(),
            identity_pool_id: self.identity_pool_id.clone(),
            client_id: self.client_id.clone(),
            region: self.region.clone(),
        }
    }

    pub fn metric_target(&self) -> MetricTarget {
        MetricTarget {
            namespace: self.cw_namespace.clone(),
            region: self.region.clone(),
            volume: self.vol.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Accepts region names such as `us-west-2` or `us-gov-west-1`: a two letter
/// area, one or more lowercase words and a number, joined by hyphens.
pub fn is_valid_aws_region(region: &str) -> bool {
    let mut parts = region.split('-');
    let area = parts.next().unwrap_or_default();
    let number = parts.next_back().unwrap_or_default();
    let words: Vec<&str> = parts.collect();

    area.len() == 2
        && area.bytes().all(|b| b.is_ascii_lowercase())
        && !words.is_empty()
        && words
            .iter()
            .all(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase()))
        && !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
}

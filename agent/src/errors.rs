// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

/// The step of the identity exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederationStage {
    Authenticate,
    ResolveIdentity,
    ExchangeCredentials,
}

impl fmt::Display for FederationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Authenticate => "authenticate",
            Self::ResolveIdentity => "resolve identity",
            Self::ExchangeCredentials => "exchange credentials",
        };
        f.write_str(stage)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("credential federation failed at {stage}: {message}")]
    FederationError {
        stage: FederationStage,
        message: String,
    },
    #[error("unable to persist credentials to {path}: {message}")]
    PersistenceError { path: String, message: String },
    #[error("unable to collect disk usage for {path}: {message}")]
    MetricCollectionError { path: String, message: String },
    #[error("unable to publish metric: {0}")]
    MetricPublishError(String),
}

impl AgentError {
    pub(crate) fn federation(stage: FederationStage, source: anyhow::Error) -> Self {
        Self::FederationError {
            stage,
            message: format!("{source:#}"),
        }
    }

    /// Short label of the stage that failed, used as a structured log field.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "configuration",
            Self::FederationError { .. } => "federation",
            Self::PersistenceError { .. } => "persistence",
            Self::MetricCollectionError { .. } => "collection",
            Self::MetricPublishError(_) => "publish",
        }
    }
}

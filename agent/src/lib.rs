// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Disk Usage Agent
//!
//! Reports a host's disk usage percentage to Amazon CloudWatch using temporary
//! credentials obtained through Amazon Cognito instead of long-lived keys.
//!
//! ## Architecture
//!
//! ```text
//! scheduler -> agent (this crate) -> credentials file (cache)
//!                  |
//!                  +-> Cognito user pool     (InitiateAuth)
//!                  +-> Cognito identity pool (GetId, GetCredentialsForIdentity)
//!                  +-> CloudWatch            (PutMetricData)
//! ```
//!
//! Each invocation is a single sequential run:
//!
//! 1. Load the cached credentials and use them if they have not expired
//! 2. Otherwise federate through Cognito and overwrite the cache file
//! 3. Sample the disk usage of the configured volume
//! 4. Publish one `DiskUsage` datum with the credentials from step 1 or 2
//!
//! ## Modules
//!
//! - [`application`]: Wires the stages of a run together
//! - [`cache`]: Reuse-or-refresh decision for the credentials
//! - [`collector`]: Disk usage sampling with `statvfs`
//! - [`configuration`]: Environment-driven settings parsed with clap
//! - [`constants`]: Configuration constants for the application
//! - [`errors`]: Error kinds, one per failing stage
//! - [`federation`]: Cognito password authentication and credential exchange
//! - [`models`]: Credential record, federation settings and metric sample
//! - [`publisher`]: CloudWatch `PutMetricData`
//! - [`sdk`]: Shared AWS SDK client settings
//! - [`store`]: Credentials file persistence
//!
//! ## Usage
//!
//! ```bash
//! EMAIL=ops@example.com PASSWORD=... USER_POOL_ID=us-west-2_AbCdEf \
//! IDENTITY_POOL_ID=us-west-2:... CLIENT_ID=... REGION=us-west-2 \
//! CW_NAMESPACE=Hosts/Disk VOL=/ disk-usage-agent
//! ```
//!
//! ## Security Considerations
//!
//! - Cached credentials are only used strictly before their expiration
//! - The credentials file is replaced atomically and readable by its owner only
//! - Passwords, tokens and keys are redacted from `Debug` output and zeroized on drop
//! - The password is only read from the `PASSWORD` environment variable, never a flag

pub mod application;
pub mod cache;
pub mod collector;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod federation;
pub mod models;
pub mod publisher;
pub mod sdk;
pub mod store;

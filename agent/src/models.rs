// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::constants::CREDENTIALS_PROVIDER_NAME;

/// Temporary credentials obtained through federation, as persisted in the cache file.
#[derive(Clone, PartialEq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretKey")]
    pub secret_key: String,

    #[serde(rename = "SessionToken")]
    pub session_token: String,

    #[serde(rename = "Expiration", with = "expiration_format")]
    #[zeroize(skip)]
    pub expiration: DateTime<Utc>,
}

impl CredentialRecord {
    /// A record is usable strictly before its expiration; there is no grace window.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }

    /// Returns false if any of the key fields is empty.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_key.is_empty()
            && !self.session_token.is_empty()
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl From<&CredentialRecord> for Credentials {
    fn from(record: &CredentialRecord) -> Self {
        Credentials::new(
            record.access_key_id.clone(),
            record.secret_key.clone(),
            Some(record.session_token.clone()),
            Some(SystemTime::from(record.expiration)),
            CREDENTIALS_PROVIDER_NAME,
        )
    }
}

/// Serializes the expiration as RFC 3339 in UTC and reads any ISO-8601 form back as UTC.
mod expiration_format {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid expiration timestamp: {value}")))
    }

    pub(super) fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Credentials as returned by the credential exchange, before UTC normalization.
#[derive(Clone, ZeroizeOnDrop)]
pub struct IssuedCredentials {
    pub access_key_id: String,
    pub secret_key: String,
    pub session_token: String,
    #[zeroize(skip)]
    pub expiration: DateTime<FixedOffset>,
}

impl fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Immutable inputs for the identity exchange, built once per run.
#[derive(Clone, PartialEq, ZeroizeOnDrop)]
pub struct FederationConfig {
    pub username: String,
    pub password: String,
    pub user_pool_id: String,
    pub identity_pool_id: String,
    pub client_id: String,
    pub region: String,
}

impl fmt::Debug for FederationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederationConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("user_pool_id", &self.user_pool_id)
            .field("identity_pool_id", &self.identity_pool_id)
            .field("client_id", &self.client_id)
            .field("region", &self.region)
            .finish()
    }
}

/// Where the sampled metric goes.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTarget {
    pub namespace: String,
    pub region: String,
    pub volume: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Percent,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "Percent",
        }
    }
}

/// One sampled value, stamped at collection time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}

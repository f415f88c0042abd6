// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Identity federation: exchanging a username and password for temporary
//! AWS credentials.
//!
//! # Exchange
//!
//! 1. **Authenticate**: `InitiateAuth` with the `USER_PASSWORD_AUTH` flow against
//!    the user pool app client returns an ID token
//! 2. **Resolve identity**: `GetId` on the identity pool, presenting the ID token
//!    under the user pool's provider name, returns an identity ID
//! 3. **Exchange credentials**: `GetCredentialsForIdentity` with the same login
//!    returns the access key, secret key, session token and expiration
//!
//! Any failure aborts the exchange and is reported with the stage it happened
//! in. Nothing is cached or retried here, see [`crate::cache`].

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_cognitoidentity::primitives::DateTime as SmithyDateTime;
use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use chrono::{DateTime, Utc};
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    AUTH_PARAM_PASSWORD, AUTH_PARAM_USERNAME, COGNITO_PROVIDER_HOST_PREFIX,
    COGNITO_PROVIDER_HOST_SUFFIX,
};
use crate::errors::{AgentError, FederationStage};
use crate::models::{CredentialRecord, FederationConfig, IssuedCredentials};
use crate::sdk;

/// Name under which the identity pool knows a user pool,
/// e.g. `cognito-idp.us-west-2.amazonaws.com/us-west-2_AbCdEf`.
pub fn provider_name(region: &str, user_pool_id: &str) -> String {
    format!(
        "{COGNITO_PROVIDER_HOST_PREFIX}.{region}.{COGNITO_PROVIDER_HOST_SUFFIX}/{user_pool_id}"
    )
}

/// The ID token presented to the identity pool, keyed by provider name.
#[derive(Clone, PartialEq, ZeroizeOnDrop)]
pub struct LoginProof {
    pub provider_name: String,
    pub id_token: String,
}

impl fmt::Debug for LoginProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginProof")
            .field("provider_name", &self.provider_name)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// The identity backend calls used by the exchange.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticates the user and returns an ID token.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
    ) -> Result<String>;

    /// Returns the identity ID of the authenticated user in the identity pool.
    async fn resolve_identity(
        &self,
        identity_pool_id: &str,
        login: &LoginProof,
    ) -> Result<String>;

    /// Returns temporary credentials for the identity.
    async fn exchange_for_credentials(
        &self,
        identity_id: &str,
        login: &LoginProof,
    ) -> Result<IssuedCredentials>;
}

/// Runs the three-step exchange against an [`IdentityProvider`].
pub struct IdentityFederator<P> {
    provider: P,
}

impl<P: IdentityProvider> IdentityFederator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Obtains a fresh credential record for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::FederationError`] naming the first stage that
    /// failed; later stages are not attempted.
    #[tracing::instrument(skip(self, config), fields(username = %config.username))]
    pub async fn federate(
        &self,
        config: &FederationConfig,
    ) -> Result<CredentialRecord, AgentError> {
        let id_token = self
            .provider
            .authenticate(&config.username, &config.password, &config.client_id)
            .await
            .map_err(|err| AgentError::federation(FederationStage::Authenticate, err))?;

        let login = LoginProof {
            provider_name: provider_name(&config.region, &config.user_pool_id),
            id_token,
        };

        let identity_id = self
            .provider
            .resolve_identity(&config.identity_pool_id, &login)
            .await
            .map_err(|err| AgentError::federation(FederationStage::ResolveIdentity, err))?;

        tracing::debug!("[agent] resolved identity {}", identity_id);

        let issued = self
            .provider
            .exchange_for_credentials(&identity_id, &login)
            .await
            .map_err(|err| AgentError::federation(FederationStage::ExchangeCredentials, err))?;

        let record = CredentialRecord {
            access_key_id: issued.access_key_id.clone(),
            secret_key: issued.secret_key.clone(),
            session_token: issued.session_token.clone(),
            expiration: issued.expiration.with_timezone(&Utc),
        };

        if !record.is_complete() {
            return Err(AgentError::federation(
                FederationStage::ExchangeCredentials,
                anyhow!("credentials response contained empty values"),
            ));
        }

        Ok(record)
    }
}

/// [`IdentityProvider`] backed by Amazon Cognito user pools and identity pools.
pub struct CognitoIdentityProvider {
    user_pools: aws_sdk_cognitoidentityprovider::Client,
    identity_pools: aws_sdk_cognitoidentity::Client,
}

impl CognitoIdentityProvider {
    pub async fn new(region: &str, timeout: Duration) -> Self {
        // Cognito authentication and identity calls are unsigned
        let config = sdk::config_loader(region, timeout)
            .no_credentials()
            .load()
            .await;

        Self::from_clients(
            aws_sdk_cognitoidentityprovider::Client::new(&config),
            aws_sdk_cognitoidentity::Client::new(&config),
        )
    }

    pub fn from_clients(
        user_pools: aws_sdk_cognitoidentityprovider::Client,
        identity_pools: aws_sdk_cognitoidentity::Client,
    ) -> Self {
        Self {
            user_pools,
            identity_pools,
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
    ) -> Result<String> {
        let output = self
            .user_pools
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(client_id)
            .auth_parameters(AUTH_PARAM_USERNAME, username)
            .auth_parameters(AUTH_PARAM_PASSWORD, password)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "InitiateAuth failed: {}",
                    aws_sdk_cognitoidentityprovider::error::DisplayErrorContext(&err)
                )
            })?;

        match output.authentication_result() {
            Some(result) => result
                .id_token()
                .map(str::to_string)
                .context("authentication result is missing the ID token"),
            None => match output.challenge_name() {
                Some(challenge) => Err(anyhow!(
                    "authentication requires challenge {}",
                    challenge.as_str()
                )),
                None => Err(anyhow!("authentication returned no result")),
            },
        }
    }

    async fn resolve_identity(
        &self,
        identity_pool_id: &str,
        login: &LoginProof,
    ) -> Result<String> {
        let output = self
            .identity_pools
            .get_id()
            .identity_pool_id(identity_pool_id)
            .logins(login.provider_name.as_str(), login.id_token.as_str())
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "GetId failed: {}",
                    aws_sdk_cognitoidentity::error::DisplayErrorContext(&err)
                )
            })?;

        output
            .identity_id()
            .map(str::to_string)
            .context("GetId response is missing the identity ID")
    }

    async fn exchange_for_credentials(
        &self,
        identity_id: &str,
        login: &LoginProof,
    ) -> Result<IssuedCredentials> {
        let output = self
            .identity_pools
            .get_credentials_for_identity()
            .identity_id(identity_id)
            .logins(login.provider_name.as_str(), login.id_token.as_str())
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "GetCredentialsForIdentity failed: {}",
                    aws_sdk_cognitoidentity::error::DisplayErrorContext(&err)
                )
            })?;

        let credentials = output
            .credentials()
            .context("response is missing credentials")?;
        let expiration = credentials
            .expiration()
            .context("credentials are missing the expiration")?;

        Ok(IssuedCredentials {
            access_key_id: credentials
                .access_key_id()
                .context("credentials are missing the access key ID")?
                .to_string(),
            secret_key: credentials
                .secret_key()
                .context("credentials are missing the secret key")?
                .to_string(),
            session_token: credentials
                .session_token()
                .context("credentials are missing the session token")?
                .to_string(),
            expiration: to_chrono(expiration)?.fixed_offset(),
        })
    }
}

fn to_chrono(value: &SmithyDateTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
        .ok_or_else(|| anyhow!("expiration out of range: {:?}", value))
}

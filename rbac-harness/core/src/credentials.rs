use crate::api::{ApiError, ClusterApi};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// The secret type the control plane uses for issued service-account tokens.
pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";

const TOKEN_KEY: &str = "token";

/// Bearer token material for a service account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token(String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The service account itself could not be fetched.
    #[error("service account not found: {0}")]
    ServiceAccount(#[source] ApiError),
}

/// Finds the bearer token issued for a service account.
///
/// Secrets are checked in the order the control plane lists them on the
/// account and the first one of the service-account token type wins. Returns
/// `Ok(None)` when the account has no such secret yet; only a failure to fetch
/// the account itself is an error. A matching secret without token data
/// yields an empty token. This is a single snapshot read: tokens are issued
/// asynchronously and one that has not been issued yet is not waited for.
pub async fn resolve_token<C>(
    cluster: &C,
    namespace: &str,
    name: &str,
) -> Result<Option<Token>, CredentialError>
where
    C: ClusterApi + ?Sized,
{
    let secrets = cluster
        .service_account_secrets(namespace, name)
        .await
        .map_err(CredentialError::ServiceAccount)?;

    for secret_name in secrets {
        let secret = match cluster.get_secret(namespace, &secret_name).await {
            Ok(secret) => secret,
            Err(error) => {
                debug!(%namespace, secret = %secret_name, %error, "Skipping unreadable secret");
                continue;
            }
        };
        if secret.type_.as_deref() != Some(SERVICE_ACCOUNT_TOKEN_TYPE) {
            continue;
        }

        let token = match secret.data.get(TOKEN_KEY) {
            Some(bytes) => Token::from_bytes(bytes),
            None => {
                warn!(%namespace, secret = %secret.name, "Token secret has no token data");
                Token::default()
            }
        };
        return Ok(Some(token));
    }

    Ok(None)
}

// === impl Token ===

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

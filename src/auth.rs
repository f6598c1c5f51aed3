use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AuthError;
use fleetbridge_backend::validators::validate_api_key_format;

/// Remote telematics credential triple for one tenant database
#[derive(Clone)]
pub struct Credentials {
    pub database: String,
    pub username: String,
    pub password: String,
}

/// How a request's credentials were obtained, for usage logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    ApiKey,
    Direct,
}

/// Short SHA-256 fingerprint of an API key for log lines.
///
/// Raw keys never appear in logs; the fingerprint is enough to correlate
/// requests from the same client.
pub fn fingerprint(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())[..12].to_string()
}

/// Read-only store of per-client secrets, keyed by secret name
///
/// Secret naming convention: `client-{apiKey}-database`,
/// `client-{apiKey}-username`, `client-{apiKey}-password`.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment-backed secret store.
///
/// Secret `client-{key}-database` maps to the environment variable
/// `FLEETBRIDGE_CLIENT_{KEY}_DATABASE`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        let var = format!("FLEETBRIDGE_{}", name.replace('-', "_").to_uppercase());
        std::env::var(var).ok()
    }
}

/// Resolve remote credentials for a request.
///
/// Two modes, matching the deployment options:
/// - API key: a 32-hex key names a credential triple in the secret store;
///   only available when the deployment enables the store.
/// - Direct: the request body carries the triple itself.
///
/// An API key takes precedence over a direct triple when both are supplied
/// and the store is enabled. A key that resolves no complete triple is
/// invalid; the error does not reveal which part was missing.
pub fn resolve_credentials(
    api_key: Option<&str>,
    database: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
    config: &Config,
    secrets: &dyn SecretStore,
) -> Result<(Credentials, CredentialMode), AuthError> {
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        if !config.use_secret_store {
            warn!("request supplied an API key but the secret store is disabled");
            return Err(AuthError::SecretStoreDisabled);
        }

        if validate_api_key_format(key).is_err() {
            warn!(key_fingerprint = %fingerprint(key), "API key format rejected");
            return Err(AuthError::InvalidKeyFormat);
        }

        let lookup = |part: &str| secrets.get(&format!("client-{}-{}", key, part));
        let (Some(database), Some(username), Some(password)) =
            (lookup("database"), lookup("username"), lookup("password"))
        else {
            warn!(
                key_fingerprint = %fingerprint(key),
                "API key resolves no stored credential triple"
            );
            return Err(AuthError::UnknownKey);
        };

        info!(
            key_fingerprint = %fingerprint(key),
            database = %database,
            "credentials resolved from secret store"
        );
        return Ok((
            Credentials {
                database,
                username,
                password,
            },
            CredentialMode::ApiKey,
        ));
    }

    match (database, username, password) {
        (Some(database), Some(username), Some(password))
            if !database.is_empty() && !username.is_empty() && !password.is_empty() =>
        {
            info!(database = %database, "credentials supplied directly");
            Ok((
                Credentials {
                    database: database.to_string(),
                    username: username.to_string(),
                    password: password.to_string(),
                },
                CredentialMode::Direct,
            ))
        }
        _ => Err(AuthError::MissingCredentials),
    }
}

//! Indirection between credential references and the signing keys behind them.
//!
//! Resolved values are opaque: [`SecretValue`] and [`PrivateKey`] redact
//! themselves in every formatting impl and are consumed by the signing step.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ethers::prelude::k256::SecretKey;

use crate::error::DeployError;

pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<SecretValue, DeployError>;
}

pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Consumes the value, parsing it as a hex encoded secp256k1 key.
    pub fn into_private_key(
        self,
        reference: &str,
    ) -> Result<PrivateKey, DeployError> {
        self.0
            .trim()
            .parse()
            .map_err(|_| DeployError::InvalidCredential {
                reference: reference.to_string(),
            })
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

#[derive(Clone)]
pub struct PrivateKey {
    pub key: SecretKey,
}

impl FromStr for PrivateKey {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("0x");

        let bytes = hex::decode(s)?;

        let key = SecretKey::from_slice(&bytes)?;

        Ok(Self { key })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Reads credentials from process environment variables.
///
/// `.env` files are loaded into the environment at startup, so a reference
/// like `PRIV_KEY` may be defined there.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl ToString) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    fn variable_name(&self, reference: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{reference}"),
            None => reference.to_string(),
        }
    }
}

impl SecretResolver for EnvSecretStore {
    fn resolve(&self, reference: &str) -> Result<SecretValue, DeployError> {
        match std::env::var(self.variable_name(reference)) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretValue(value)),
            _ => Err(DeployError::MissingSecret(reference.to_string())),
        }
    }
}

#[derive(Default)]
pub struct InMemorySecretStore {
    values: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(
        mut self,
        reference: impl ToString,
        value: impl ToString,
    ) -> Self {
        self.values.insert(reference.to_string(), value.to_string());
        self
    }
}

impl SecretResolver for InMemorySecretStore {
    fn resolve(&self, reference: &str) -> Result<SecretValue, DeployError> {
        self.values
            .get(reference)
            .map(|value| SecretValue(value.clone()))
            .ok_or_else(|| DeployError::MissingSecret(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn in_memory_store_resolves_known_references() {
        let store = InMemorySecretStore::new().with_secret("k1", KEY);

        let key = store.resolve("k1").unwrap().into_private_key("k1").unwrap();
        assert_eq!(hex::encode(key.key.to_bytes()), &KEY[2..]);

        let err = store.resolve("k2").unwrap_err();
        assert!(matches!(err, DeployError::MissingSecret(r) if r == "k2"));
    }

    #[test]
    fn env_store_reads_prefixed_variables() {
        std::env::set_var("EZIOTA_TEST_PRIV_KEY", KEY);
        std::env::set_var("EZIOTA_TEST_EMPTY", "  ");

        let store = EnvSecretStore::new().with_prefix("EZIOTA_TEST_");

        assert!(store.resolve("PRIV_KEY").is_ok());
        assert!(matches!(
            store.resolve("EMPTY"),
            Err(DeployError::MissingSecret(_))
        ));
        assert!(matches!(
            store.resolve("NOT_SET_ANYWHERE"),
            Err(DeployError::MissingSecret(_))
        ));
    }

    #[test]
    fn secrets_never_show_up_in_formatting() {
        let value = SecretValue::new(KEY);
        assert!(!format!("{value:?}").contains("ac0974"));

        let key = value.into_private_key("k1").unwrap();
        assert!(!format!("{key:?}").contains("ac0974"));
    }

    #[test]
    fn malformed_key_is_an_invalid_credential() {
        let err = SecretValue::new("0x1234")
            .into_private_key("PRIV_KEY")
            .unwrap_err();

        assert!(matches!(&err, DeployError::InvalidCredential { reference } if reference == "PRIV_KEY"));
        assert!(!err.to_string().contains("1234"));
    }
}

//! Runtime configuration.
//!
//! Assembled once at start-up (by the CLI from flags and `WARDEN_*`
//! variables) and used to build every long-lived component. Nothing here is
//! read again after construction.

use std::{path::PathBuf, sync::Arc, time::Duration};

use warden_core::{Environment, NonceConfig, NonceGuard, SessionAuthority, SessionPolicy};
use warden_crypto::{AtRestCodec, KeyMaterial, SigningKey};

use crate::{ServerError, gate::Gate, storage::RedbStore};

/// Session secrets shorter than this are accepted with a warning.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Secrets shared by every server process.
#[derive(Clone)]
pub struct Secrets {
    /// HMAC key for session credential signatures.
    pub session_secret: String,
    /// Server-side suffix appended to nonce store keys.
    pub nonce_suffix: String,
    /// Passphrase the at-rest key is derived from.
    pub at_rest_passphrase: String,
    /// Seed of the fixed at-rest IV.
    pub at_rest_iv: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    /// RSA private key, PEM (PKCS#8 or PKCS#1).
    pub key_path: PathBuf,
    /// Redb database file.
    pub store_path: PathBuf,
    /// Shared secrets.
    pub secrets: Secrets,
    /// Session lifetime and capacity rules.
    pub session_policy: SessionPolicy,
    /// Nonce lifetime.
    pub nonce_ttl: Duration,
}

impl WardenConfig {
    /// Check secrets and policy for values that cannot work.
    pub fn validate(&self) -> Result<(), ServerError> {
        let secrets = &self.secrets;
        for (name, value) in [
            ("session secret", &secrets.session_secret),
            ("nonce suffix", &secrets.nonce_suffix),
            ("at-rest passphrase", &secrets.at_rest_passphrase),
            ("at-rest IV seed", &secrets.at_rest_iv),
        ] {
            if value.is_empty() {
                return Err(ServerError::Config(format!("{name} must not be empty")));
            }
        }

        if secrets.session_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secrets.session_secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "session secret is short"
            );
        }

        let policy = &self.session_policy;
        if policy.max_credentials == 0 {
            return Err(ServerError::Config("max credentials must be at least 1".into()));
        }
        if policy.lifetime.is_zero() || policy.audit_retention.is_zero() {
            return Err(ServerError::Config("session lifetimes must be positive".into()));
        }
        if policy.refresh_window >= policy.lifetime {
            return Err(ServerError::Config(
                "refresh window must be shorter than the session lifetime".into(),
            ));
        }
        if self.nonce_ttl.is_zero() {
            return Err(ServerError::Config("nonce TTL must be positive".into()));
        }

        Ok(())
    }

    /// Deterministic at-rest codec derived from the configured secrets.
    pub fn at_rest_codec(&self) -> AtRestCodec {
        AtRestCodec::new(
            self.secrets.at_rest_passphrase.as_bytes(),
            self.secrets.at_rest_iv.as_bytes(),
        )
    }

    /// Read the private key file and derive the full key material.
    pub fn load_key_material(&self) -> Result<KeyMaterial, ServerError> {
        let pem = std::fs::read_to_string(&self.key_path).map_err(|err| {
            ServerError::Config(format!("cannot read key {}: {err}", self.key_path.display()))
        })?;

        let material = KeyMaterial::new(
            warden_crypto::parse_private_key_pem(&pem)?,
            self.at_rest_codec(),
        )?;

        tracing::info!(path = %self.key_path.display(), "loaded server key material");
        Ok(material)
    }

    /// Nonce guard settings.
    pub fn nonce_config(&self) -> NonceConfig {
        NonceConfig { ttl: self.nonce_ttl, suffix: self.secrets.nonce_suffix.clone() }
    }

    /// Credential signing key.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::new(self.secrets.session_secret.as_bytes())
    }

    /// Validate, load keys, open the store and assemble a gate.
    pub fn build_gate<E: Environment>(&self, env: E) -> Result<Gate<RedbStore<E>, E>, ServerError> {
        self.validate()?;

        let keys = Arc::new(self.load_key_material()?);
        let store = RedbStore::open(&self.store_path, env.clone())?;

        let nonces = NonceGuard::new(store.clone(), env.clone(), self.nonce_config());
        let sessions = SessionAuthority::new(
            store,
            env.clone(),
            self.signing_key(),
            self.session_policy.clone(),
        );

        Ok(Gate::new(keys, nonces, sessions, env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WardenConfig {
        WardenConfig {
            key_path: PathBuf::from("missing.pem"),
            store_path: PathBuf::from("unused.redb"),
            secrets: Secrets {
                session_secret: "s".repeat(RECOMMENDED_SECRET_LEN),
                nonce_suffix: "-suffix".to_string(),
                at_rest_passphrase: "passphrase".to_string(),
                at_rest_iv: "iv-seed".to_string(),
            },
            session_policy: SessionPolicy::default(),
            nonce_ttl: warden_core::DEFAULT_NONCE_TTL,
        }
    }

    #[test]
    fn default_policy_validates() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn empty_secret_rejected() {
        let mut config = config();
        config.secrets.nonce_suffix.clear();
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn zero_cap_rejected() {
        let mut config = config();
        config.session_policy.max_credentials = 0;
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn refresh_window_must_fit_in_lifetime() {
        let mut config = config();
        config.session_policy.refresh_window = config.session_policy.lifetime;
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn missing_key_file_is_config_error() {
        assert!(matches!(config().load_key_material(), Err(ServerError::Config(_))));
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("passphrase"));
        assert!(!rendered.contains("-suffix"));
    }
}

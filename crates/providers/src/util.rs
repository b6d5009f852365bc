//! Shared helpers for the HTTP adapters.

use pa_domain::config::AuthConfig;
use pa_domain::error::{Error, Result};

/// Map a [`reqwest::Error`] onto the domain error, keeping timeouts distinct.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Sources are tried in order: inline `key`, OS keychain (`service` +
/// `account`), the `env` variable, then `{SERVICE}_{ACCOUNT}` for headless
/// machines without a keychain. A configured `env` that is unset is an error
/// naming the variable.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(key) = &auth.key {
        tracing::warn!("API key read from plaintext config field 'key'; prefer 'env' or keychain");
        return Ok(key.clone());
    }

    let keychain = auth.service.as_deref().zip(auth.account.as_deref());

    if let Some(secret) = keychain.and_then(|(service, account)| {
        resolve_from_keychain(service, account)
            .map_err(|e| tracing::debug!(service, account, error = %e, "keychain miss"))
            .ok()
    }) {
        return Ok(secret);
    }

    if let Some(var) = &auth.env {
        return std::env::var(var)
            .map_err(|_| Error::Auth(format!("environment variable '{var}' is not set")));
    }

    let headless = keychain.map(|(service, account)| keychain_fallback_env_name(service, account));
    if let Some((var, secret)) = headless.and_then(|var| std::env::var(&var).ok().map(|s| (var, s))) {
        tracing::info!(env_var = %var, "API key resolved from keychain fallback env var");
        return Ok(secret);
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or 'service'+'account'".into(),
    ))
}

/// Read a secret from the platform credential store.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// `("parley", "openai-api-key")` becomes `"PARLEY_OPENAI_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_env_name() {
        assert_eq!(
            keychain_fallback_env_name("parley", "openai-api-key"),
            "PARLEY_OPENAI_API_KEY"
        );
        assert_eq!(keychain_fallback_env_name("MY_SVC", "KEY"), "MY_SVC_KEY");
    }

    #[test]
    fn plaintext_key_wins() {
        let auth = AuthConfig {
            key: Some("plaintext-wins".into()),
            env: Some("PA_TEST_SHOULD_NOT_BE_READ".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "plaintext-wins");
    }

    #[test]
    fn env_var_is_read() {
        let var_name = "PA_TEST_RESOLVE_ENV_KEY_4821";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let auth = AuthConfig {
            env: Some("PA_TEST_NONEXISTENT_VAR_9931".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("PA_TEST_NONEXISTENT_VAR_9931"));
    }

    #[test]
    fn no_auth_is_an_error() {
        let err = resolve_api_key(&AuthConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn keychain_fallback_env_is_used_headless() {
        let fallback_var = "PARLEYTEST_HEADLESS_PROVIDER";
        std::env::set_var(fallback_var, "fallback-secret");
        let auth = AuthConfig {
            service: Some("parleytest".into()),
            account: Some("headless-provider".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "fallback-secret");
        std::env::remove_var(fallback_var);
    }
}

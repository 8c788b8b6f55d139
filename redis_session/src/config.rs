//! Session and cookie settings

use std::env;
use std::str::FromStr;

use crate::errors::SessionError;

pub const DEFAULT_COOKIE_NAME: &str = "session_id";
pub const DEFAULT_KEY_PREFIX: &str = "SESSION:";
pub const DEFAULT_SESSION_ID_LENGTH: usize = 26;
pub const DEFAULT_MAX_LIFETIME: u64 = 7200;
/// Largest accepted `cookie_expires` and `max_lifetime`, in seconds.
pub const MAX_SECONDS: u64 = i32::MAX as u64;

/// Settings shared by every handler of an application.
///
/// `cookie_expires` is the cookie lifetime in seconds; `0` issues a cookie that
/// lives as long as the browser session. `max_lifetime` is the time-to-live the
/// store entry is renewed to on every request and every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_expires: u64,
    pub cookie_path: String,
    pub cookie_domain: String,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub session_id_length: usize,
    pub max_lifetime: u64,
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_expires: 0,
            cookie_path: "/".to_string(),
            cookie_domain: String::new(),
            cookie_secure: false,
            cookie_http_only: true,
            session_id_length: DEFAULT_SESSION_ID_LENGTH,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    /// Read settings from `SESSION_*` environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults, as do a zero
    /// `SESSION_ID_LENGTH` and lifetimes above [`MAX_SECONDS`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cookie_name: env_or("SESSION_COOKIE_NAME", defaults.cookie_name),
            cookie_expires: env_seconds("SESSION_COOKIE_EXPIRES", defaults.cookie_expires),
            cookie_path: env_or("SESSION_COOKIE_PATH", defaults.cookie_path),
            cookie_domain: env_or("SESSION_COOKIE_DOMAIN", defaults.cookie_domain),
            cookie_secure: env_bool("SESSION_COOKIE_SECURE", defaults.cookie_secure),
            cookie_http_only: env_bool("SESSION_COOKIE_HTTP_ONLY", defaults.cookie_http_only),
            session_id_length: Some(env_or("SESSION_ID_LENGTH", defaults.session_id_length))
                .filter(|len| *len > 0)
                .unwrap_or(DEFAULT_SESSION_ID_LENGTH),
            max_lifetime: env_seconds("SESSION_MAX_LIFETIME", defaults.max_lifetime),
            key_prefix: env_or("SESSION_KEY_PREFIX", defaults.key_prefix),
        }
    }

    /// Reject settings a handler cannot work with.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.session_id_length == 0 {
            return Err(SessionError::Config(
                "session_id_length must be at least 1".to_string(),
            ));
        }
        for (name, seconds) in [
            ("cookie_expires", self.cookie_expires),
            ("max_lifetime", self.max_lifetime),
        ] {
            if seconds > MAX_SECONDS {
                return Err(SessionError::Config(format!(
                    "{name} of {seconds}s exceeds the limit of {MAX_SECONDS}s"
                )));
            }
        }
        Ok(())
    }

    /// Storage key of the session identified by `session_id`.
    pub fn storage_key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_seconds(key: &str, default: u64) -> u64 {
    Some(env_or(key, default))
        .filter(|seconds| *seconds <= MAX_SECONDS)
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key).ok().as_deref().map(str::to_ascii_lowercase) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 9] = [
        "SESSION_COOKIE_NAME",
        "SESSION_COOKIE_EXPIRES",
        "SESSION_COOKIE_PATH",
        "SESSION_COOKIE_DOMAIN",
        "SESSION_COOKIE_SECURE",
        "SESSION_COOKIE_HTTP_ONLY",
        "SESSION_ID_LENGTH",
        "SESSION_MAX_LIFETIME",
        "SESSION_KEY_PREFIX",
    ];

    /// Run `test` with the given variables set and every other session variable
    /// removed, restoring the original values afterward.
    fn with_env_vars<F, R>(vars: &[(&str, &str)], test: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original: Vec<(&str, Option<String>)> =
            KEYS.iter().map(|k| (*k, env::var(k).ok())).collect();

        for key in KEYS {
            unsafe { env::remove_var(key) };
        }
        for (key, value) in vars {
            unsafe { env::set_var(key, value) };
        }

        let result = test();

        for (key, value) in original {
            match value {
                Some(val) => unsafe { env::set_var(key, val) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_storage_key() {
        // Given the default prefix
        let config = SessionConfig::default();

        // Then the key is the prefix followed by the id
        assert_eq!(config.storage_key("abc123"), "SESSION:abc123");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        let config = with_env_vars(&[], SessionConfig::from_env);

        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_custom_values() {
        let config = with_env_vars(
            &[
                ("SESSION_COOKIE_NAME", "sid"),
                ("SESSION_COOKIE_EXPIRES", "3600"),
                ("SESSION_COOKIE_PATH", "/app"),
                ("SESSION_COOKIE_DOMAIN", "example.com"),
                ("SESSION_COOKIE_SECURE", "true"),
                ("SESSION_COOKIE_HTTP_ONLY", "0"),
                ("SESSION_ID_LENGTH", "40"),
                ("SESSION_MAX_LIFETIME", "60"),
                ("SESSION_KEY_PREFIX", "app:sess:"),
            ],
            SessionConfig::from_env,
        );

        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.cookie_expires, 3600);
        assert_eq!(config.cookie_path, "/app");
        assert_eq!(config.cookie_domain, "example.com");
        assert!(config.cookie_secure);
        assert!(!config.cookie_http_only);
        assert_eq!(config.session_id_length, 40);
        assert_eq!(config.max_lifetime, 60);
        assert_eq!(config.key_prefix, "app:sess:");
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_values_fall_back() {
        let config = with_env_vars(
            &[
                ("SESSION_MAX_LIFETIME", "forever"),
                ("SESSION_ID_LENGTH", "0"),
                ("SESSION_COOKIE_SECURE", "maybe"),
            ],
            SessionConfig::from_env,
        );

        assert_eq!(config.max_lifetime, DEFAULT_MAX_LIFETIME);
        assert_eq!(config.session_id_length, DEFAULT_SESSION_ID_LENGTH);
        assert!(!config.cookie_secure);
    }

    #[test]
    #[serial]
    fn test_from_env_out_of_range_lifetimes_fall_back() {
        // Given lifetimes that parse as u64 but exceed the limit
        let config = with_env_vars(
            &[
                ("SESSION_COOKIE_EXPIRES", "10000000000000"),
                ("SESSION_MAX_LIFETIME", "100000000000000000"),
            ],
            SessionConfig::from_env,
        );

        // Then the defaults are used and the result validates
        assert_eq!(config.cookie_expires, 0);
        assert_eq!(config.max_lifetime, DEFAULT_MAX_LIFETIME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_defaults_and_limits() {
        let config = SessionConfig {
            cookie_expires: MAX_SECONDS,
            max_lifetime: MAX_SECONDS,
            ..SessionConfig::default()
        };

        assert!(SessionConfig::default().validate().is_ok());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_id_length() {
        let config = SessionConfig {
            session_id_length: 0,
            ..SessionConfig::default()
        };

        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_lifetimes() {
        let cookie = SessionConfig {
            cookie_expires: 10_000_000_000_000,
            ..SessionConfig::default()
        };
        let store = SessionConfig {
            max_lifetime: 100_000_000_000_000_000,
            ..SessionConfig::default()
        };

        match cookie.validate() {
            Err(SessionError::Config(msg)) => assert!(msg.contains("cookie_expires")),
            other => panic!("Expected Config error, got {other:?}"),
        }
        match store.validate() {
            Err(SessionError::Config(msg)) => assert!(msg.contains("max_lifetime")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }
}

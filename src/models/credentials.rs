//! Posting credentials.

use std::fmt;

use crate::error::{AppError, Result};

pub const ENV_API_KEY: &str = "X_API_KEY";
pub const ENV_API_SECRET: &str = "X_API_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const ENV_ACCESS_SECRET: &str = "X_ACCESS_SECRET";
pub const ENV_BEARER_TOKEN: &str = "X_BEARER_TOKEN";

/// Key strings for the posting endpoint, read once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
    pub bearer_token: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup function.
    ///
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::credentials(name))
        };

        Ok(Self {
            api_key: required(ENV_API_KEY)?,
            api_secret: required(ENV_API_SECRET)?,
            access_token: required(ENV_ACCESS_TOKEN)?,
            access_secret: required(ENV_ACCESS_SECRET)?,
            bearer_token: lookup(ENV_BEARER_TOKEN).filter(|v| !v.trim().is_empty()),
        })
    }
}

// Never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("access_token", &"***")
            .field("access_secret", &"***")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_all_required_present() {
        let vars = env(&[
            (ENV_API_KEY, "k"),
            (ENV_API_SECRET, "s"),
            (ENV_ACCESS_TOKEN, "t"),
            (ENV_ACCESS_SECRET, "ts"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.api_key, "k");
        assert!(creds.bearer_token.is_none());
    }

    #[test]
    fn test_missing_value_names_the_variable() {
        let vars = env(&[(ENV_API_KEY, "k"), (ENV_API_SECRET, "s"), (ENV_ACCESS_TOKEN, " ")]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_TOKEN));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let vars = env(&[
            (ENV_API_KEY, "secret-key"),
            (ENV_API_SECRET, "s"),
            (ENV_ACCESS_TOKEN, "t"),
            (ENV_ACCESS_SECRET, "ts"),
            (ENV_BEARER_TOKEN, "b"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(!format!("{creds:?}").contains("secret-key"));
    }
}

//! Environment-supplied configuration.
//!
//! Configuration is read once at startup. Missing required settings fail
//! immediately rather than at the first operation that needs them.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::Result;

pub const USER_POOL_ID: &str = "FERRY_USER_POOL_ID";
pub const CLIENT_ID: &str = "FERRY_CLIENT_ID";
pub const IDENTITY_POOL_ID: &str = "FERRY_IDENTITY_POOL_ID";
pub const REGION: &str = "FERRY_REGION";
pub const BUCKET: &str = "FERRY_BUCKET";
pub const LINK_EXPIRY_SECS: &str = "FERRY_LINK_EXPIRY_SECS";
pub const ENDPOINT_URL: &str = "FERRY_ENDPOINT_URL";

/// Default lifetime of a signed download link.
pub const DEFAULT_LINK_EXPIRY: Duration = Duration::from_secs(3600);

/// Longest lifetime the storage service accepts for a signed link.
pub const MAX_LINK_EXPIRY: Duration = Duration::from_secs(7 * 24 * 3600);

/// Bucket name the local backend uses when none is configured.
pub const DEFAULT_LOCAL_BUCKET: &str = "ferry-local";

/// Bucket and link settings shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub bucket: String,
    pub link_expiry: Duration,
}

impl StorageSettings {
    /// Settings for the local backend: every variable is optional.
    pub fn local_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bucket: optional(&lookup, BUCKET).unwrap_or_else(|| DEFAULT_LOCAL_BUCKET.to_string()),
            link_expiry: link_expiry(&lookup)?,
        })
    }

    /// Like [`StorageSettings::local_from_lookup`], reading the process environment.
    pub fn local_from_env() -> Result<Self> {
        Self::local_from_lookup(|name| std::env::var(name).ok())
    }
}

/// Configuration for the network backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity-directory pool id, `<region>_<name>`.
    pub user_pool_id: String,
    /// Identity-directory app client id.
    pub client_id: String,
    /// Identity pool id.
    pub identity_pool_id: String,
    /// Region for the directory, identity pool and bucket.
    pub region: String,
    pub storage: StorageSettings,
    /// Endpoint override for every service (emulators, tests).
    pub endpoint_url: Option<Url>,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first required variable
    /// that is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_pool_id = required(&lookup, USER_POOL_ID)?;
        if !user_pool_id.contains('_') {
            return Err(ConfigError::Invalid {
                name: USER_POOL_ID,
                reason: "expected <region>_<name>".to_string(),
            }
            .into());
        }

        let endpoint_url = optional(&lookup, ENDPOINT_URL)
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: ENDPOINT_URL,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            user_pool_id,
            client_id: required(&lookup, CLIENT_ID)?,
            identity_pool_id: required(&lookup, IDENTITY_POOL_ID)?,
            region: required(&lookup, REGION)?,
            storage: StorageSettings {
                bucket: required(&lookup, BUCKET)?,
                link_expiry: link_expiry(&lookup)?,
            },
            endpoint_url,
        })
    }

    /// The pool name SRP hashes into the password verifier: the part of
    /// the pool id after the underscore.
    pub fn user_pool_name(&self) -> &str {
        self.user_pool_id
            .split_once('_')
            .map(|(_, name)| name)
            .unwrap_or(&self.user_pool_id)
    }

    /// The login provider name the identity pool trusts for this directory.
    pub fn login_provider(&self) -> String {
        format!(
            "cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| ConfigError::Missing { name }.into())
}

fn link_expiry<F>(lookup: &F) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = optional(lookup, LINK_EXPIRY_SECS) else {
        return Ok(DEFAULT_LINK_EXPIRY);
    };

    let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
        name: LINK_EXPIRY_SECS,
        reason: format!("'{}' is not a number of seconds", raw),
    })?;

    let expiry = Duration::from_secs(secs);
    if secs == 0 || expiry > MAX_LINK_EXPIRY {
        return Err(ConfigError::Invalid {
            name: LINK_EXPIRY_SECS,
            reason: format!("must be between 1 and {}", MAX_LINK_EXPIRY.as_secs()),
        }
        .into());
    }

    Ok(expiry)
}

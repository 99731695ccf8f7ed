//! Panel configuration loaded via OrthoConfig.
//!
//! Every value may come from the command line, a configuration file or a
//! `PANEL_*` environment variable. Accessors apply the defaults so callers
//! never deal with the optional raw fields.
//!
//! Session toggles are kept as raw strings: release builds must set them
//! explicitly and reject anything ambiguous, while debug builds fall back to
//! safe defaults with a warning.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroize;

use crate::domain::{DEFAULT_MAX_DOMAIN_LABELS, ProvisioningPolicy};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;

const COOKIE_SECURE_VAR: &str = "PANEL_SESSION_COOKIE_SECURE";
const SAME_SITE_VAR: &str = "PANEL_SESSION_SAME_SITE";
const ALLOW_EPHEMERAL_VAR: &str = "PANEL_SESSION_ALLOW_EPHEMERAL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAME_SITE_EXPECTED: &str = "Strict|Lax|None";

/// Raw panel configuration.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PANEL")]
pub struct PanelSettings {
    /// Host name of the panel; aliases may not use it.
    pub base_server_vhost: Option<String>,
    /// Label ceiling for alias names.
    pub max_domain_labels: Option<usize>,
    /// Create the default mailboxes for every new alias.
    pub create_default_email_addresses: Option<bool>,
    /// Count default mailboxes towards the mail quota.
    pub count_default_email_addresses: Option<bool>,
    /// PostgreSQL connection string. Without it the panel serves fixtures.
    pub database_url: Option<String>,
    pub bind_addr: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub db_max_connections: Option<u32>,
    pub session_key_file: Option<PathBuf>,
    pub session_cookie_secure: Option<String>,
    pub session_same_site: Option<String>,
    pub session_allow_ephemeral: Option<String>,
}

/// Errors raised while turning settings into runtime values.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("max_domain_labels must be at least 2, got {value}")]
    InvalidLabelLimit { value: usize },
    #[error("request_timeout_secs must be positive")]
    ZeroTimeout,
}

impl PanelSettings {
    /// Alias creation rules.
    pub fn provisioning_policy(&self) -> Result<ProvisioningPolicy, SettingsError> {
        let max_domain_labels = self.max_domain_labels.unwrap_or(DEFAULT_MAX_DOMAIN_LABELS);
        if max_domain_labels < 2 {
            return Err(SettingsError::InvalidLabelLimit {
                value: max_domain_labels,
            });
        }
        let defaults = ProvisioningPolicy::default();
        Ok(ProvisioningPolicy {
            base_server_vhost: self
                .base_server_vhost
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_owned(),
            max_domain_labels,
            create_default_email_addresses: self
                .create_default_email_addresses
                .unwrap_or(defaults.create_default_email_addresses),
            count_default_email_addresses: self
                .count_default_email_addresses
                .unwrap_or(defaults.count_default_email_addresses),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    /// Deadline for each request's port calls.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS) {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Pool settings, or `None` when no database is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        Some(
            PoolConfig::new(url)
                .with_max_size(self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)),
        )
    }

    fn session_key_path(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(SESSION_KEY_DEFAULT_PATH))
    }

    /// Validate the session toggles for the given build mode.
    pub fn session_settings(&self, mode: BuildMode) -> Result<SessionSettings, SessionConfigError> {
        let cookie_secure = cookie_secure(self.session_cookie_secure.as_deref(), mode)?;
        let same_site = same_site(self.session_same_site.as_deref(), mode, cookie_secure)?;
        let allow_ephemeral = allow_ephemeral(self.session_allow_ephemeral.as_deref(), mode)?;
        let key = session_key(self.session_key_path(), mode, allow_ephemeral)?;

        Ok(SessionSettings {
            key,
            cookie_secure,
            same_site,
        })
    }
}

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults are tolerated with a warning.
    Debug,
    /// Every session toggle must be explicit and valid.
    Release,
}

impl BuildMode {
    /// Mode matching `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session cookie settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required setting: {name}")]
    Missing { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("PANEL_SESSION_SAME_SITE=None requires PANEL_SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("PANEL_SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn cookie_secure(raw: Option<&str>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    let Some(value) = raw else {
        if mode.is_debug() {
            warn!("{COOKIE_SECURE_VAR} not set; defaulting to secure");
            return Ok(true);
        }
        return Err(SessionConfigError::Missing {
            name: COOKIE_SECURE_VAR,
        });
    };
    match parse_bool(value) {
        Some(flag) => Ok(flag),
        None if mode.is_debug() => {
            warn!(value, "invalid {COOKIE_SECURE_VAR}; defaulting to secure");
            Ok(true)
        }
        None => Err(SessionConfigError::Invalid {
            name: COOKIE_SECURE_VAR,
            value: value.to_owned(),
            expected: BOOL_EXPECTED,
        }),
    }
}

fn same_site(
    raw: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    let Some(value) = raw else {
        if mode.is_debug() {
            warn!("{SAME_SITE_VAR} not set; using default");
            return Ok(default_same_site);
        }
        return Err(SessionConfigError::Missing {
            name: SAME_SITE_VAR,
        });
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("{SAME_SITE_VAR}=None without secure cookies; browsers may reject them");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value, "invalid {SAME_SITE_VAR}; using default");
            Ok(default_same_site)
        }
        _ => Err(SessionConfigError::Invalid {
            name: SAME_SITE_VAR,
            value: value.to_owned(),
            expected: SAME_SITE_EXPECTED,
        }),
    }
}

fn allow_ephemeral(raw: Option<&str>, mode: BuildMode) -> Result<bool, SessionConfigError> {
    let Some(value) = raw else {
        if mode.is_debug() {
            return Ok(false);
        }
        return Err(SessionConfigError::Missing {
            name: ALLOW_EPHEMERAL_VAR,
        });
    };
    match parse_bool(value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(SessionConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value, "invalid {ALLOW_EPHEMERAL_VAR}; defaulting to disabled");
            Ok(false)
        }
        None => Err(SessionConfigError::Invalid {
            name: ALLOW_EPHEMERAL_VAR,
            value: value.to_owned(),
            expected: BOOL_EXPECTED,
        }),
    }
}

fn session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

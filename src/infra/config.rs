use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use env_helpers::get_env_opt;
use secrecy::SecretString;

use crate::infra::error::InfraError;

/// Deployment environment. Decides the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!(
                "Invalid environment: {s}. Must be 'local', 'dev' or 'prod'"
            )),
        }
    }
}

pub struct AppConfig {
    pub env: Environment,
    /// Default tracing directive when `RUST_LOG` is not set (e.g. "info", "debug").
    pub log_level: String,
    /// `host:port`; the host may be a name, resolved when the listener binds.
    pub listen_address: String,
    pub db_url: SecretString,
    pub db_max_connections: u32,
    /// Connection attempts before startup gives up. Backoff grows by one second per attempt.
    pub db_connect_attempts: u32,
    /// Upper bound on the whole connection phase, retries included.
    pub db_connect_deadline: Duration,
    /// Per-request timeout applied by the transport layer.
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        Self::from_lookup(get_env_opt)
    }

    /// Build the config from `lookup`. Unset or blank variables take their
    /// default; a set but unparsable one is `ConfigInvalid`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let env = parse_or(var("ENV"), "ENV", Environment::Prod)?;
        let log_level = var("LOG_LVL").unwrap_or_else(|| "info".to_string());

        let listen_address = var("SERV_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        validate_listen_address(&listen_address)?;

        let db_url = var("DB_URL").ok_or(InfraError::ConfigMissing { var: "DB_URL" })?;

        let db_max_connections: u32 = parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?;
        let db_connect_attempts: u32 =
            parse_or(var("DB_CONNECT_ATTEMPTS"), "DB_CONNECT_ATTEMPTS", 3)?;
        let db_connect_deadline_secs: u64 =
            parse_or(var("DB_CONNECT_DEADLINE_SECS"), "DB_CONNECT_DEADLINE_SECS", 15)?;
        let request_timeout_secs: u64 =
            parse_or(var("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 6)?;

        if db_connect_attempts == 0 {
            return Err(InfraError::ConfigInvalid {
                var: "DB_CONNECT_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            env,
            log_level,
            listen_address: listen_address.trim().to_string(),
            db_url: SecretString::new(db_url.into()),
            db_max_connections,
            db_connect_attempts,
            db_connect_deadline: Duration::from_secs(db_connect_deadline_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, InfraError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| InfraError::ConfigInvalid {
                var,
                reason: format!("{raw:?}: {e}"),
            }),
    }
}

fn validate_listen_address(address: &str) -> Result<(), InfraError> {
    let invalid = |reason: &str| InfraError::ConfigInvalid {
        var: "SERV_ADDR",
        reason: format!("{address:?}: {reason}"),
    };

    let (host, port) = address
        .trim()
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
    Ok(())
}

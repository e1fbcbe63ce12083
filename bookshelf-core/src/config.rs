//! Connection and pool configuration
//!
//! A [`ConnectionConfig`] can be built three ways:
//! - from a libpq-style key/value string (`host=localhost port=5432 ...`)
//! - from the standard `PG*` environment variables
//! - from a TOML file via [`BookshelfConfig::load`]

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use tracing::debug;

use crate::error::ConfigError;

/// Pool ceiling for concurrently open connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

/// Physical connections are recycled after this long
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Idle connections above `min_connections` are closed after this long
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on the liveness check performed at construction
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// How long an operation may wait for a free pooled connection
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS negotiation mode, mirroring libpq's `sslmode`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            _ => Err(ConfigError::InvalidSslMode(s.to_owned())),
        }
    }
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Where and how to connect. Treated as opaque by the store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub sslmode: SslMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            dbname: "bookstore".to_string(),
            sslmode: SslMode::default(),
        }
    }
}

// Password stays out of logs
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl ConnectionConfig {
    /// Build from `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE`
    /// and `PGSSLMODE`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = lookup("PGHOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            config.port = parse_port(&port)?;
        }
        if let Some(user) = lookup("PGUSER") {
            config.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            config.password = Some(password);
        }
        if let Some(dbname) = lookup("PGDATABASE") {
            config.dbname = dbname;
        }
        if let Some(mode) = lookup("PGSSLMODE") {
            config.sslmode = mode.parse()?;
        }
        Ok(config)
    }

    /// sqlx connect options for this descriptor
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.dbname)
            .ssl_mode(self.sslmode.into());

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    fn apply(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "host" | "hostaddr" => self.host = value,
            "port" => self.port = parse_port(&value)?,
            "user" => self.user = value,
            "password" => self.password = Some(value),
            "dbname" => self.dbname = value,
            "sslmode" => self.sslmode = value.parse()?,
            other => debug!(key = other, "ignoring unsupported connection option"),
        }
        Ok(())
    }
}

/// Parses libpq key/value connection strings, e.g.
/// `host=localhost port=5432 user=books password='s3cret pw' dbname=bookstore sslmode=disable`.
///
/// Values may be single-quoted; inside quotes `\'` and `\\` are escapes.
impl FromStr for ConnectionConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();
        let mut chars = s.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
                key.push(c);
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if chars.next() != Some('=') {
                return Err(ConfigError::MalformedOption(key));
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}

            let mut value = String::new();
            if chars.next_if_eq(&'\'').is_some() {
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(ConfigError::UnterminatedQuote { key }),
                        },
                        Some(c) => value.push(c),
                        None => return Err(ConfigError::UnterminatedQuote { key }),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    } else {
                        value.push(c);
                    }
                }
            }

            if key.is_empty() {
                return Err(ConfigError::MalformedOption(format!("={}", value)));
            }
            config.apply(&key, value)?;
        }

        Ok(config)
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(value.to_owned()))
}

/// Connection pool limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(with = "duration_secs")]
    pub max_lifetime: Duration,
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub acquire_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub ping_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            ping_timeout: DEFAULT_PING_TIMEOUT,
        }
    }
}

/// Top-level config file layout
///
/// ```toml
/// [connection]
/// host = "localhost"
/// user = "bookstore_user"
/// dbname = "bookstore"
/// sslmode = "disable"
///
/// [pool]
/// max_connections = 25
/// max_lifetime = 300
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookshelfConfig {
    pub connection: ConnectionConfig,
    pub pool: PoolConfig,
}

impl BookshelfConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Durations are written as whole seconds in config files
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_key_value_dsn() {
        let config: ConnectionConfig = "host=db.internal port=6543 user=bookstore_user \
             password=hunter2 dbname=bookstore sslmode=disable"
            .parse()
            .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.user, "bookstore_user");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.dbname, "bookstore");
        assert_eq!(config.sslmode, SslMode::Disable);
    }

    #[test]
    fn parses_quoted_values_and_spaces_around_equals() {
        let config: ConnectionConfig = r"password = 'it\'s a secret' dbname='my books'"
            .parse()
            .unwrap();
        assert_eq!(config.password.as_deref(), Some("it's a secret"));
        assert_eq!(config.dbname, "my books");
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn empty_dsn_yields_defaults() {
        let config: ConnectionConfig = "   ".parse().unwrap();
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn ignores_unknown_options() {
        let config: ConnectionConfig = "connect_timeout=10 host=example".parse().unwrap();
        assert_eq!(config.host, "example");
    }

    #[test]
    fn rejects_malformed_dsn() {
        assert!(matches!(
            "host".parse::<ConnectionConfig>(),
            Err(ConfigError::MalformedOption(_))
        ));
        assert!(matches!(
            "port=abc".parse::<ConnectionConfig>(),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            "sslmode=sometimes".parse::<ConnectionConfig>(),
            Err(ConfigError::InvalidSslMode(_))
        ));
        assert!(matches!(
            "password='open".parse::<ConnectionConfig>(),
            Err(ConfigError::UnterminatedQuote { .. })
        ));
        assert!(matches!(
            "=value".parse::<ConnectionConfig>(),
            Err(ConfigError::MalformedOption(_))
        ));
    }

    #[test]
    fn reads_pg_environment() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PGHOST", "pg.example"),
            ("PGPORT", "5433"),
            ("PGDATABASE", "library"),
            ("PGSSLMODE", "require"),
        ]);
        let config =
            ConnectionConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.host, "pg.example");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user, "postgres");
        assert_eq!(config.dbname, "library");
        assert_eq!(config.sslmode, SslMode::Require);
    }

    #[test]
    fn debug_redacts_password() {
        let config: ConnectionConfig = "password=hunter2".parse().unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn pool_defaults() {
        let pool = PoolConfig::default();
        assert_eq!(pool.max_connections, 25);
        assert_eq!(pool.max_lifetime, Duration::from_secs(300));
        assert_eq!(pool.ping_timeout, Duration::from_secs(5));
    }

    #[test]
    fn loads_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[connection]
host = "books.local"
user = "reader"
sslmode = "verify-full"

[pool]
max_connections = 8
ping_timeout = 2
"#
        )
        .unwrap();

        let config = BookshelfConfig::load(file.path()).unwrap();
        assert_eq!(config.connection.host, "books.local");
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.connection.sslmode, SslMode::VerifyFull);
        assert_eq!(config.pool.max_connections, 8);
        assert_eq!(config.pool.ping_timeout, Duration::from_secs(2));
        assert_eq!(config.pool.max_lifetime, DEFAULT_MAX_LIFETIME);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = BookshelfConfig::load("/nonexistent/bookshelf.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

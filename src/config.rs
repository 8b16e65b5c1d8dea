//! Application configuration loaded from environment variables.
//!
//! Database credentials come from the standard `PG*` variables. When `PGHOST`
//! is not set they are read from a JSON keys file instead.

use crate::services::metrics::DEFAULT_WEIGHT_KG;
use serde_json::{Map, Value};
use std::env;
use std::path::Path;

/// Default location of the JSON database keys file.
pub const DEFAULT_KEYS_PATH: &str = "neondb_keys.json";

const MIN_ACTIVITY_LIMIT: u32 = 10;
const MAX_ACTIVITY_LIMIT: u32 = 5000;

/// Candidate keys (in priority order) for each database setting in the keys file.
const HOST_KEYS: &[&str] = &["PGHOST", "host"];
const PORT_KEYS: &[&str] = &["PGPORT", "port"];
const DBNAME_KEYS: &[&str] = &["PGDATABASE", "database", "dbname"];
const USER_KEYS: &[&str] = &["PGUSER", "user"];
const PASSWORD_KEYS: &[&str] = &["PGPASSWORD", "password"];
const SSLMODE_KEYS: &[&str] = &["PGSSLMODE", "sslmode"];

/// Environment variable names accepted for the target user filter.
const TARGET_USER_VARS: &[&str] = &["TARGET_USER_ID", "target_user_id", "targetUserId"];

/// Which physiological model backs the NGP and energy metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysioModelKind {
    Minetti,
    Disabled,
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sslmode: Option<String>,
}

impl DatabaseConfig {
    /// Build settings from the `PG*` environment variables.
    fn from_pg_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("PGHOST").map_err(|_| ConfigError::Missing("PGHOST"))?,
            port: parse_port(env::var("PGPORT").ok().as_deref())?,
            dbname: env::var("PGDATABASE").ok(),
            user: env::var("PGUSER").ok(),
            password: env::var("PGPASSWORD").ok(),
            sslmode: env::var("PGSSLMODE").ok(),
        })
    }

    /// Load settings from a JSON keys file.
    pub fn from_keys_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::KeysFile(format!("{}: {}", path.display(), e)))?;
        let keys: Map<String, Value> = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::KeysFile(format!("{}: {}", path.display(), e)))?;
        Self::from_keys(&keys)
    }

    /// Build settings from an already-parsed keys object.
    pub fn from_keys(keys: &Map<String, Value>) -> Result<Self, ConfigError> {
        let port = match lookup_key(keys, PORT_KEYS) {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| ConfigError::Invalid("port", n.to_string()))?,
            Some(Value::String(s)) => parse_port(Some(s))?,
            _ => 5432,
        };

        Ok(Self {
            host: lookup_string(keys, HOST_KEYS).unwrap_or_else(|| "localhost".to_string()),
            port,
            dbname: lookup_string(keys, DBNAME_KEYS),
            user: lookup_string(keys, USER_KEYS),
            password: lookup_string(keys, PASSWORD_KEYS),
            sslmode: lookup_string(keys, SSLMODE_KEYS),
        })
    }
}

fn lookup_key<'a>(keys: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|k| keys.get(*k))
        .find(|v| !v.is_null())
}

fn lookup_string(keys: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    lookup_key(keys, candidates).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(5432),
        Some(s) => s
            .parse()
            .map_err(|_| ConfigError::Invalid("PGPORT", s.to_string())),
    }
}

/// Parse comma-separated zone boundaries, e.g. `"120,140,160"`.
///
/// Boundaries must be finite and strictly increasing.
pub fn parse_zone_boundaries(raw: &str) -> Result<Vec<f64>, String> {
    let mut bounds = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let value: f64 = part
            .parse()
            .map_err(|_| format!("invalid zone boundary '{}'", part))?;
        if !value.is_finite() {
            return Err(format!("invalid zone boundary '{}'", part));
        }
        if bounds.last().is_some_and(|last| value <= *last) {
            return Err("zone boundaries must be strictly increasing".to_string());
        }
        bounds.push(value);
    }
    Ok(bounds)
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Frontend URL (dashboard origin for CORS)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Default number of activity records fetched per query
    pub activity_limit: u32,
    /// Lifetime of cached query results
    pub cache_ttl_secs: u64,
    /// Only show activities belonging to this user (if set)
    pub target_user_id: Option<String>,
    /// Athlete weight used for energy estimates
    pub athlete_weight_kg: f64,
    /// Physiological model used for NGP and energy
    pub physio_model: PhysioModelKind,
    /// Heart-rate zone boundaries (bpm)
    pub hr_zone_boundaries: Vec<f64>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                dbname: Some("test".to_string()),
                user: None,
                password: None,
                sslmode: None,
            },
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            activity_limit: 200,
            cache_ttl_secs: 300,
            target_user_id: None,
            athlete_weight_kg: DEFAULT_WEIGHT_KG,
            physio_model: PhysioModelKind::Minetti,
            hr_zone_boundaries: vec![120.0, 140.0, 160.0, 180.0],
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let database = if env::var("PGHOST").is_ok() {
            DatabaseConfig::from_pg_env()?
        } else {
            let path = env::var("DB_KEYS_PATH").unwrap_or_else(|_| DEFAULT_KEYS_PATH.to_string());
            DatabaseConfig::from_keys_file(path)?
        };

        let physio_model = match env::var("PHYSIO_MODEL")
            .unwrap_or_else(|_| "minetti".to_string())
            .to_lowercase()
            .as_str()
        {
            "minetti" => PhysioModelKind::Minetti,
            "none" | "disabled" => PhysioModelKind::Disabled,
            other => return Err(ConfigError::Invalid("PHYSIO_MODEL", other.to_string())),
        };

        let hr_zone_boundaries = match env::var("HR_ZONES") {
            Ok(raw) => parse_zone_boundaries(&raw).map_err(|e| ConfigError::Invalid("HR_ZONES", e))?,
            Err(_) => vec![120.0, 140.0, 160.0, 180.0],
        };

        Ok(Self {
            database,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            activity_limit: env::var("ACTIVITY_LIMIT")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(200)
                .clamp(MIN_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            target_user_id: TARGET_USER_VARS
                .iter()
                .find_map(|name| env::var(name).ok())
                .filter(|v| !v.is_empty()),
            athlete_weight_kg: env::var("ATHLETE_WEIGHT_KG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WEIGHT_KG),
            physio_model,
            hr_zone_boundaries,
        })
    }

    /// Clamp a requested record limit to the supported range.
    pub fn clamp_limit(requested: Option<u32>, default: u32) -> u32 {
        requested
            .unwrap_or(default)
            .clamp(MIN_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Cannot read database keys file {0}")]
    KeysFile(String),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_prefer_pg_names() {
        let keys = json!({
            "PGHOST": "db.example.com",
            "host": "ignored",
            "PGPORT": "6543",
            "dbname": "metrics",
            "PGUSER": "reader",
            "password": "secret",
            "sslmode": "require"
        });
        let cfg = DatabaseConfig::from_keys(keys.as_object().unwrap()).unwrap();

        assert_eq!(cfg.host, "db.example.com");
        assert_eq!(cfg.port, 6543);
        assert_eq!(cfg.dbname.as_deref(), Some("metrics"));
        assert_eq!(cfg.user.as_deref(), Some("reader"));
        assert_eq!(cfg.password.as_deref(), Some("secret"));
        assert_eq!(cfg.sslmode.as_deref(), Some("require"));
    }

    #[test]
    fn test_keys_defaults() {
        let keys = Map::new();
        let cfg = DatabaseConfig::from_keys(&keys).unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert!(cfg.dbname.is_none());
    }

    #[test]
    fn test_keys_numeric_port() {
        let keys = json!({ "port": 15432 });
        let cfg = DatabaseConfig::from_keys(keys.as_object().unwrap()).unwrap();
        assert_eq!(cfg.port, 15432);
    }

    #[test]
    fn test_keys_invalid_port() {
        let keys = json!({ "PGPORT": "not-a-port" });
        let err = DatabaseConfig::from_keys(keys.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("PGPORT", _)));
    }

    #[test]
    fn test_missing_keys_file_names_path() {
        let err = DatabaseConfig::from_keys_file("/nonexistent/keys.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/keys.json"));
    }

    #[test]
    fn test_parse_zone_boundaries() {
        assert_eq!(
            parse_zone_boundaries("120, 140,160").unwrap(),
            vec![120.0, 140.0, 160.0]
        );
        assert!(parse_zone_boundaries("").unwrap().is_empty());
        assert!(parse_zone_boundaries("140,120").is_err());
        assert!(parse_zone_boundaries("abc").is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(Config::clamp_limit(None, 200), 200);
        assert_eq!(Config::clamp_limit(Some(1), 200), 10);
        assert_eq!(Config::clamp_limit(Some(100_000), 200), 5000);
    }
}

use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, anyhow, bail};
use secrecy::SecretString;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    /// Directory for daily-rotated `app.log` and `activity.log` files.
    pub log_dir: Option<PathBuf>,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// How bearer tokens are validated.
#[derive(Debug, Clone)]
pub enum IdentityConfig {
    /// Token introspection against a Keycloak-style identity provider.
    Introspection {
        base_url: String,
        realm: String,
        client_id: String,
        client_secret: SecretString,
    },
    /// Local HS256 validation with a shared secret.
    SharedSecret { secret: SecretString },
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = database_url_from_lookup(&lookup)?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let log_dir = lookup("LOG_DIR").map(PathBuf::from);
        let identity = identity_from_lookup(&lookup)?;

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            request_timeout,
            log_format,
            log_dir,
            identity,
        })
    }
}

/// The database URL alone, for tools that do not serve requests.
pub fn database_url_from_env() -> anyhow::Result<String> {
    database_url_from_lookup(&|key: &str| env::var(key).ok().filter(|v| !v.is_empty()))
}

fn database_url_from_lookup<F>(lookup: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("DATABASE_URL") {
        Some(url) => Ok(url),
        None => compose_database_url(lookup),
    }
}

fn compose_database_url<F>(lookup: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = match lookup("DB_PORT") {
        Some(p) => p
            .parse::<u16>()
            .with_context(|| format!("DB_PORT is not a valid port: {p}"))?,
        None => 5432,
    };
    let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
    let password = lookup("DB_PASSWORD").unwrap_or_default();
    let name = lookup("DB_NAME").unwrap_or_else(|| "shopping_website".to_string());
    let sslmode = lookup("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());

    let mut url = Url::parse(&format!("postgres://{host}:{port}/"))
        .with_context(|| format!("DB_HOST is not a valid host: {host}"))?;
    url.set_username(&user)
        .map_err(|_| anyhow!("DB_USER cannot be used in a URL"))?;
    if !password.is_empty() {
        url.set_password(Some(&password))
            .map_err(|_| anyhow!("DB_PASSWORD cannot be used in a URL"))?;
    }
    url.set_path(&name);
    url.query_pairs_mut().append_pair("sslmode", &sslmode);
    Ok(url.into())
}

fn identity_from_lookup<F>(lookup: &F) -> anyhow::Result<IdentityConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup("IDP_BASE_URL") {
        let realm = lookup("IDP_REALM").context("IDP_REALM is not set")?;
        let client_id = lookup("IDP_CLIENT_ID").context("IDP_CLIENT_ID is not set")?;
        let client_secret =
            lookup("IDP_CLIENT_SECRET").context("IDP_CLIENT_SECRET is not set")?;
        return Ok(IdentityConfig::Introspection {
            base_url: base_url.trim_end_matches('/').to_string(),
            realm,
            client_id,
            client_secret: SecretString::from(client_secret),
        });
    }

    if let Some(secret) = lookup("JWT_SECRET") {
        return Ok(IdentityConfig::SharedSecret {
            secret: SecretString::from(secret),
        });
    }

    bail!("no identity provider configured: set IDP_BASE_URL or JWT_SECRET")
}

use anyhow::{bail, Context};
use tracing::warn;

/// Signing secret used when `JWT_SECRET` is unset outside production.
pub const DEV_FALLBACK_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub default_locale: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL is not defined in environment variables")?;

        let environment = Environment::parse(lookup("APP_ENV").as_deref());

        let secret = match lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            Some(secret) => secret,
            None if environment.is_production() => {
                bail!("JWT_SECRET must be set when APP_ENV=production")
            }
            None => {
                warn!("JWT_SECRET is not set; using the development fallback secret");
                DEV_FALLBACK_SECRET.to_string()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "portfolio".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "portfolio-users".into()),
        };

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let default_locale = lookup("DEFAULT_LOCALE").unwrap_or_else(|| "en".into());

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            jwt,
            default_locale,
        })
    }

    /// Whether session cookies carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

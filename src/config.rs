use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub session_hours: i64,
    pub secure_cookies: bool,
    pub seed_demo: bool,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "Invalid DELIVERYDESK_STORE '{other}': expected postgres or memory"
            )),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store = StoreBackend::parse(&env_or("DELIVERYDESK_STORE", "postgres"))?;

        let database_url = match store {
            StoreBackend::Postgres => Some(env_required("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("DELIVERYDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DELIVERYDESK_HOST: {e}"))?;

        let port: u16 = env_or("DELIVERYDESK_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid DELIVERYDESK_PORT: {e}"))?;

        let base_url = env_or("DELIVERYDESK_BASE_URL", &format!("http://{host}:{port}"));

        let session_hours: i64 = env_or("DELIVERYDESK_SESSION_HOURS", "12")
            .parse()
            .map_err(|e| format!("Invalid DELIVERYDESK_SESSION_HOURS: {e}"))?;
        if session_hours <= 0 {
            return Err("DELIVERYDESK_SESSION_HOURS must be positive".to_string());
        }

        let secure_cookies = env_bool("DELIVERYDESK_SECURE_COOKIES", true)?;
        let seed_demo = env_bool("DELIVERYDESK_SEED_DEMO", false)?;

        let log_level = env_or("DELIVERYDESK_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("DELIVERYDESK_SMTP_HOST").ok(),
            std::env::var("DELIVERYDESK_SMTP_PORT").ok(),
            std::env::var("DELIVERYDESK_SMTP_USER").ok(),
            std::env::var("DELIVERYDESK_SMTP_PASS").ok(),
            std::env::var("DELIVERYDESK_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid DELIVERYDESK_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            store,
            database_url,
            jwt_secret,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_hours,
            secure_cookies,
            seed_demo,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> Result<bool, String> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(format!("Invalid {key}: '{other}' is not a boolean")),
        },
    }
}

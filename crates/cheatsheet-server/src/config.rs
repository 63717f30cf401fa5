use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Session secrets copied from sample files that must never reach a deployment.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub session_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub secure_cookies: bool,
    pub default_from: String,
    pub default_to: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let session_secret = var("CHEATSHEET_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("CHEATSHEET_SESSION_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port = match var("CHEATSHEET_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("CHEATSHEET_PORT '{raw}' is not a port number"))?,
            None => 3000,
        };
        let secure_cookies = match var("CHEATSHEET_SECURE_COOKIES").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => bail!("CHEATSHEET_SECURE_COOKIES must be true or false, got '{other}'"),
        };

        let default_from = var("CHEATSHEET_DEFAULT_FROM").unwrap_or_else(|| "polish".into());
        let default_to = var("CHEATSHEET_DEFAULT_TO").unwrap_or_else(|| "english".into());
        if default_from == default_to {
            bail!("CHEATSHEET_DEFAULT_FROM and CHEATSHEET_DEFAULT_TO must differ");
        }

        Ok(Self {
            session_secret,
            db_path: var("CHEATSHEET_DB_PATH")
                .unwrap_or_else(|| "cheatsheets.db".into())
                .into(),
            host: var("CHEATSHEET_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            secure_cookies,
            default_from,
            default_to,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

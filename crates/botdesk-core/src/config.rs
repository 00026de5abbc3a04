use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotdeskConfig {
    pub port: u16,
    /// Public base URL used to build impersonation links and redirects.
    pub public_url: String,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    /// Optional SMTP relay for delivering sign-in codes.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Optional TLS configuration for automatic Let's Encrypt certificates.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// Emails granted the admin role when the server starts.
    #[serde(default)]
    pub bootstrap_admins: Vec<String>,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Automation webhook that produces chat replies.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_chat_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Domains to obtain certificates for, e.g. ["app.example.com"]
    pub domains: Vec<String>,
    /// ACME contact email, e.g. "admin@example.com"
    pub contact_email: String,
    /// Directory to cache certificates (default: "data/certs")
    #[serde(default = "default_cert_cache")]
    pub cert_cache: String,
    /// Use Let's Encrypt production directory (default: false = staging)
    #[serde(default)]
    pub production: bool,
}

fn default_cert_cache() -> String {
    "data/certs".to_string()
}

fn default_chat_timeout() -> u64 {
    30
}

fn default_smtp_port() -> u16 {
    587
}

impl BotdeskConfig {
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("BOTDESK_").split("__"))
    }
}

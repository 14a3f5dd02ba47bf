use certwatch_common::types::ThresholdSettings;
use serde::{Deserialize, Serialize};

/// `init-config` 子命令写出的起始配置
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# certwatch configuration

# Domains whose certificates are checked on every run
domains = [
    "example.com",
    "www.example.com",
]

# TLS port to connect to
port = 443

# Per-domain time budget covering TCP connect and TLS handshake (seconds)
connect_timeout_secs = 10

# Upper bound on domains checked in parallel
max_concurrent = 10

[thresholds]
# days-until-expiry <= warning_days  -> Warning
warning_days = 30
# days-until-expiry <= critical_days -> Critical
critical_days = 7

# Uncomment to email the report after every scan
# [email]
# enabled = true
# smtp_host = "smtp.example.com"
# smtp_port = 465
# smtp_username = "alerts@example.com"
# smtp_password = "secret"
# from = "certwatch <alerts@example.com>"
# recipients = ["ops@example.com"]
# locale = "zh-CN"
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub domains: Vec<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 单个域名的连接时间预算（秒），覆盖 TCP 连接与 TLS 握手
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 并发检查的域名数上限
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,
    #[serde(default = "default_critical_days")]
    pub critical_days: i64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_days: default_warning_days(),
            critical_days: default_critical_days(),
        }
    }
}

impl ThresholdConfig {
    pub fn to_settings(&self) -> ThresholdSettings {
        ThresholdSettings {
            warning_days: self.warning_days,
            critical_days: self.critical_days,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_enabled")]
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from: String,
    pub recipients: Vec<String>,
    /// 报告语言: "zh-CN" 或 "en"
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path, e))?;
        Ok(config)
    }
}

fn default_port() -> u16 {
    443
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    10
}

fn default_warning_days() -> i64 {
    30
}

fn default_critical_days() -> i64 {
    7
}

fn default_email_enabled() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    465
}

fn default_locale() -> String {
    "zh-CN".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(r#"domains = ["example.com"]"#).unwrap();
        assert_eq!(config.domains, vec!["example.com"]);
        assert_eq!(config.port, 443);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.thresholds.warning_days, 30);
        assert_eq!(config.thresholds.critical_days, 7);
        assert!(config.email.is_none());
    }

    #[test]
    fn test_partial_thresholds_fill_in() {
        let config: Config = toml::from_str(
            r#"
domains = ["example.com"]

[thresholds]
warning_days = 45
"#,
        )
        .unwrap();
        assert_eq!(config.thresholds.warning_days, 45);
        assert_eq!(config.thresholds.critical_days, 7);
    }

    #[test]
    fn test_email_section_parses() {
        let config: Config = toml::from_str(
            r#"
domains = ["example.com"]

[email]
smtp_host = "smtp.example.com"
from = "certwatch <alerts@example.com>"
recipients = ["ops@example.com"]
"#,
        )
        .unwrap();
        let email = config.email.unwrap();
        assert!(email.enabled);
        assert_eq!(email.smtp_port, 465);
        assert_eq!(email.locale, "zh-CN");
        assert_eq!(email.recipients, vec!["ops@example.com"]);
    }

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.domains.len(), 2);
        assert!(config.email.is_none());
    }

    #[test]
    fn test_missing_domains_is_rejected() {
        assert!(toml::from_str::<Config>("port = 443").is_err());
    }
}

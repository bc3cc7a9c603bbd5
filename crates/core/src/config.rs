use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub performance: PerformanceConfig,
    pub margin: MarginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Session token and password hashing settings.
///
/// `token_secret` is wrapped in a `SecretString` by the web layer as soon as
/// the signer is built; it is only kept as plain text here so the config can
/// be merged by figment.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Annual risk-free rate as a fraction (0.04 = 4%).
    pub risk_free_rate: f64,
    pub trading_days_per_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    pub day_count: u32,
    pub tiers: Vec<MarginTierConfig>,
}

/// One loan-size band. `up_to: None` marks the unbounded top tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginTierConfig {
    #[serde(default)]
    pub up_to: Option<f64>,
    /// Spread over the benchmark rate, in percent.
    pub spread: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/trade_journal.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "change-me-in-production".to_string(),
            token_ttl_hours: 24 * 7,
            cookie_name: "token".to_string(),
            cookie_secure: false,
            bcrypt_cost: 10,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days_per_year: 252,
        }
    }
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            day_count: 360,
            tiers: vec![
                MarginTierConfig {
                    up_to: Some(100_000.0),
                    spread: 1.5,
                },
                MarginTierConfig {
                    up_to: Some(1_000_000.0),
                    spread: 1.0,
                },
                MarginTierConfig {
                    up_to: Some(50_000_000.0),
                    spread: 0.75,
                },
                MarginTierConfig {
                    up_to: None,
                    spread: 0.5,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_auth_debug_redacts_secret() {
        let auth = AuthConfig {
            token_secret: "super-secret".to_string(),
            ..AuthConfig::default()
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_default_margin_tiers_end_unbounded() {
        let margin = MarginConfig::default();
        assert_eq!(margin.tiers.len(), 4);
        assert!(margin.tiers.last().unwrap().up_to.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server":{"port":9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.performance.trading_days_per_year, 252);
    }
}

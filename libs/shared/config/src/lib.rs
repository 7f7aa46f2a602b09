use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub database_request_timeout_secs: u64,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            database_request_timeout_secs: parse_or_default(
                "DATABASE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            server_port: parse_or_default("SERVER_PORT", DEFAULT_SERVER_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn database_request_timeout(&self) -> Duration {
        Duration::from_secs(self.database_request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            database_request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.database_request_timeout(), Duration::from_secs(30));
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_is_configured_requires_all_supabase_values() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: String::new(),
            ..AppConfig::default()
        };
        assert!(!config.is_configured());

        config.supabase_jwt_secret = "secret".to_string();
        assert!(config.is_configured());
    }

    #[test]
    fn test_parse_or_default_falls_back_on_garbage() {
        env::set_var("AMAE_TEST_BAD_PORT", "not-a-port");
        assert_eq!(parse_or_default::<u16>("AMAE_TEST_BAD_PORT", 8080), 8080);
        env::set_var("AMAE_TEST_GOOD_PORT", " 9090 ");
        assert_eq!(parse_or_default::<u16>("AMAE_TEST_GOOD_PORT", 8080), 9090);
        assert_eq!(parse_or_default::<u64>("AMAE_TEST_MISSING_VALUE", 12), 12);
    }
}

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// 上游卡牌 API 允许的最大 pageSize
pub const MAX_PAGE_SIZE: u32 = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub api_base_url: String,
    // 为空时不发送 X-Api-Key
    #[serde(skip_serializing)]
    pub api_key: String,
    pub default_page_size: u32,
    pub request_timeout_secs: u64,
    pub facet_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_allowed_origins: vec!["*".to_string()],
            api_base_url: "https://api.pokemontcg.io/v2".to_string(),
            api_key: String::new(),
            default_page_size: 12,
            request_timeout_secs: 15,
            facet_cache_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// 从环境变量构建配置，无效的数值回退到默认值
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.cors_allowed_origins);

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT", defaults.port),
            cors_allowed_origins,
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            api_key: env::var("API_KEY").unwrap_or_default(),
            default_page_size: parse_env("DEFAULT_PAGE_SIZE", defaults.default_page_size)
                .clamp(1, MAX_PAGE_SIZE),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            facet_cache_ttl_secs: parse_env("FACET_CACHE_TTL_SECS", defaults.facet_cache_ttl_secs),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("环境变量 {} 的值 '{}' 无效，使用默认值", key, raw);
            fallback
        }),
        Err(_) => fallback,
    }
}

lazy_static! {
    pub static ref CONFIG: Arc<AppConfig> = Arc::new(AppConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_public_api() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "https://api.pokemontcg.io/v2");
        assert_eq!(config.default_page_size, 12);
        assert!(config.api_key.is_empty());
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        env::set_var("PTCG_TEST_PARSE_ENV", "not-a-number");
        assert_eq!(parse_env("PTCG_TEST_PARSE_ENV", 42u16), 42);
        env::set_var("PTCG_TEST_PARSE_ENV", " 7 ");
        assert_eq!(parse_env("PTCG_TEST_PARSE_ENV", 42u16), 7);
        env::remove_var("PTCG_TEST_PARSE_ENV");
        assert_eq!(parse_env("PTCG_TEST_PARSE_ENV", 42u16), 42);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = AppConfig {
            api_key: "secret".to_string(),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}

//! 환경 변수 기반 설정 관리

use std::env;
use std::str::FromStr;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// `*`가 들어 있으면 모든 origin 허용
    pub cors_origins: Vec<String>,
    pub room: RoomConfig,
    pub leaderboard: LeaderboardConfig,
    pub log_level: String,
}

/// 방 설정
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// 빈 방 정리 주기. 0이면 정리하지 않는다.
    pub sweep_interval_secs: u64,
}

/// 리더보드 설정
#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    pub default_limit: usize,
    pub channel_capacity: usize,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_or(lookup("PORT"), 3000),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            room: RoomConfig {
                sweep_interval_secs: parse_or(lookup("ROOM_SWEEP_INTERVAL_SECS"), 0),
            },
            leaderboard: LeaderboardConfig {
                default_limit: parse_or(lookup("LEADERBOARD_LIMIT"), 10),
                channel_capacity: parse_or::<usize>(lookup("LEADERBOARD_CHANNEL_CAPACITY"), 64)
                    .max(1),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_with(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.room.sweep_interval_secs, 0);
        assert_eq!(config.leaderboard.default_limit, 10);
        assert_eq!(config.log_level, "info");
        assert!(config.allows_any_origin());
    }

    #[test]
    fn reads_overrides() {
        let config = config_with(&[
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://localhost:3500, https://play.example.com"),
            ("ROOM_SWEEP_INTERVAL_SECS", "300"),
            ("LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.room.sweep_interval_secs, 300);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3500", "https://play.example.com"]
        );
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_with(&[("PORT", "not-a-port"), ("LEADERBOARD_CHANNEL_CAPACITY", "0")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.leaderboard.channel_capacity, 1);
    }
}

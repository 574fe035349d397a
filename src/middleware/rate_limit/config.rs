use serde::{Deserialize, Serialize};

/// Rate Limit 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 초당 평균 요청 수
    #[serde(default = "default_average")]
    pub average: u32,

    /// 버스트 허용량
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// X-Real-IP / X-Forwarded-For로 클라이언트를 구분할지 여부.
    /// 신뢰할 수 있는 프록시 뒤에서만 켜야 합니다. 꺼져 있으면 소켓 주소를 사용합니다.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_average() -> u32 {
    100 // 기본값: 초당 100 요청
}

fn default_burst() -> u32 {
    50 // 기본값: 50 요청까지 버스트 허용
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            average: default_average(),
            burst: default_burst(),
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        if self.average == 0 {
            return Err("average는 0보다 커야 합니다".to_string());
        }
        if self.burst == 0 {
            return Err("burst는 0보다 커야 합니다".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.average, 100);
        assert_eq!(config.burst, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config: RateLimitConfig = toml::from_str("average = 200").unwrap();
        assert_eq!(config.average, 200);
        assert_eq!(config.burst, 50);
        assert!(!config.trust_forwarded_headers);
    }

    #[test]
    fn test_invalid_config() {
        let config = RateLimitConfig { average: 0, burst: 10, ..Default::default() };
        assert!(config.validate().is_err());
    }
}

//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use renta_data::provider::{BCV_URL, BVC_URL, P2P_URL};
use renta_data::universe::default_symbols;

use crate::error::CollectorError;
use crate::Result;

const DEFAULT_RATE_LEAD_MINUTES: i64 = 10;
pub(crate) const MAX_RATE_LEAD_MINUTES: i64 = 24 * 60 - 1;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (DB를 쓰는 명령에서만 필요)
    pub database_url: Option<String>,
    /// 연결 풀 크기
    pub db_max_connections: u32,
    /// 스케줄 설정
    pub schedule: ScheduleConfig,
    /// 외부 소스 설정
    pub sources: SourceConfig,
}

/// 스케줄 설정
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// BVC 시세 갱신 시각 (현지 시간)
    pub update_time: NaiveTime,
    /// 스케줄과 실행 일자 기준 시간대
    pub timezone: Tz,
    /// 환율 갱신을 시세 갱신보다 앞당기는 시간 (분)
    pub rate_lead_minutes: i64,
}

/// 외부 소스 설정
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub bcv_url: String,
    pub p2p_url: String,
    pub bvc_url: String,
    pub bcv_timeout_secs: u64,
    pub p2p_timeout_secs: u64,
    pub bvc_timeout_secs: u64,
    /// 종목 조회 성공 후 대기 시간 (밀리초)
    pub bvc_request_delay_ms: u64,
    /// 수집 대상 종목
    pub symbols: Vec<String>,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일이 있으면 먼저 읽음)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정을 만듭니다.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let update_time_raw = get("RENTA_UPDATE_TIME").unwrap_or_else(|| "17:00".to_string());
        let update_time = parse_update_time(&update_time_raw)?;

        let timezone_raw =
            get("RENTA_TIMEZONE").unwrap_or_else(|| "America/Caracas".to_string());
        let timezone: Tz = timezone_raw.trim().parse().map_err(|_| {
            CollectorError::Config(format!("알 수 없는 시간대: {}", timezone_raw))
        })?;

        let symbols = get("BVC_SYMBOLS")
            .map(|s| parse_symbols(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_symbols);

        Ok(Self {
            database_url: get("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5),
            schedule: ScheduleConfig {
                update_time,
                timezone,
                rate_lead_minutes: parse_rate_lead(get("RENTA_RATE_LEAD_MINUTES"))?,
            },
            sources: SourceConfig {
                bcv_url: get("BCV_URL").unwrap_or_else(|| BCV_URL.to_string()),
                p2p_url: get("P2P_URL").unwrap_or_else(|| P2P_URL.to_string()),
                bvc_url: get("BVC_URL").unwrap_or_else(|| BVC_URL.to_string()),
                bcv_timeout_secs: parse_or(&get, "BCV_TIMEOUT_SECS", 10),
                p2p_timeout_secs: parse_or(&get, "P2P_TIMEOUT_SECS", 15),
                bvc_timeout_secs: parse_or(&get, "BVC_TIMEOUT_SECS", 15),
                bvc_request_delay_ms: parse_or(&get, "BVC_REQUEST_DELAY_MS", 1500),
                symbols,
            },
        })
    }

    /// DB 명령용 URL. 없으면 설정 에러.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

impl SourceConfig {
    pub fn bcv_timeout(&self) -> Duration {
        Duration::from_secs(self.bcv_timeout_secs)
    }

    pub fn p2p_timeout(&self) -> Duration {
        Duration::from_secs(self.p2p_timeout_secs)
    }

    pub fn bvc_timeout(&self) -> Duration {
        Duration::from_secs(self.bvc_timeout_secs)
    }

    /// 종목 조회 성공 후 대기 시간을 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.bvc_request_delay_ms)
    }
}

/// 환율 선행 시간 (분). 하루 안쪽(0~1439)만 허용합니다.
fn parse_rate_lead(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_RATE_LEAD_MINUTES);
    };
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (0..=MAX_RATE_LEAD_MINUTES).contains(&minutes) => Ok(minutes),
        _ => Err(CollectorError::Config(format!(
            "RENTA_RATE_LEAD_MINUTES는 0~{} 사이의 정수여야 합니다: {}",
            MAX_RATE_LEAD_MINUTES, raw
        ))),
    }
}

/// `HH:MM` 형식의 갱신 시각을 파싱합니다.
fn parse_update_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        CollectorError::Config(format!(
            "RENTA_UPDATE_TIME은 HH:MM 형식이어야 합니다: {}",
            raw
        ))
    })
}

/// 쉼표로 구분된 종목 목록
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 값을 파싱 (없거나 실패 시 기본값 사용)
fn parse_or<T, F>(get: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

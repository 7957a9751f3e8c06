//! 환율 타입.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// 공식 환율 소스(BCV)에서 얻은 단일 관측값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficialRate {
    /// 환율표에 게시된 일자 (파싱 실패 시 조회 당일)
    pub date: NaiveDate,
    /// 공식 환율 (Bs/USD)
    pub rate: f64,
}

/// 일자별 환율 쌍.
///
/// 두 환율 모두 양수인 경우에만 생성되며, 한 번 저장된 뒤에는 변경되지 않습니다.
/// `date`가 고유 키입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRatePair {
    /// 실행 일자
    pub date: NaiveDate,
    /// 공식 환율 (Bs/USD)
    pub official_rate: f64,
    /// 병행 환율 (Bs/USDT, P2P 호가 기반)
    pub parallel_rate: f64,
}

impl ExchangeRatePair {
    /// 검증된 환율 쌍을 생성합니다.
    ///
    /// # Errors
    ///
    /// 어느 한쪽 환율이 유한한 양수가 아니면 `PipelineError::MalformedPayload`.
    pub fn new(
        date: NaiveDate,
        official_rate: f64,
        parallel_rate: f64,
    ) -> Result<Self, PipelineError> {
        for (feed, rate) in [("official", official_rate), ("parallel", parallel_rate)] {
            if !is_usable_rate(rate) {
                return Err(PipelineError::MalformedPayload {
                    feed: feed.to_string(),
                    reason: format!("환율이 양수가 아님: {}", rate),
                });
            }
        }

        Ok(Self {
            date,
            official_rate,
            parallel_rate,
        })
    }

    /// 현지 통화 금액을 공식 환율로 USD 환산합니다.
    pub fn to_usd_official(&self, local: f64) -> f64 {
        local / self.official_rate
    }

    /// 현지 통화 금액을 병행 환율로 USD 환산합니다.
    pub fn to_usd_parallel(&self, local: f64) -> f64 {
        local / self.parallel_rate
    }
}

/// USD 환산에 사용할 수 있는 환율인지 확인합니다.
pub fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

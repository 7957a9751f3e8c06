//! 외부 데이터 Provider 모듈.
//!
//! ## BCV (Banco Central de Venezuela)
//! - `BcvRateFetcher`: 환율 페이지 HTML 스크래핑으로 공식 환율 조회
//!
//! ## Binance P2P
//! - `BinanceP2pClient`: USDT/VES 매수 호가 조회, 병행 환율 추정용
//!
//! ## BVC (Bolsa de Valores de Caracas)
//! - `BvcClient`: 종목별 시세 히스토리 조회 (admin-ajax 엔드포인트)
//!
//! 각 Provider는 호출마다 `SourceError`를 반환하며, 집계기/수집기 경계에서
//! 부재(`None`)로 변환됩니다.

pub mod bcv;
pub mod binance_p2p;
pub mod bvc;

use async_trait::async_trait;
use renta_core::{OfficialRate, PipelineError, RawQuoteRow};
use thiserror::Error;

pub use bcv::{parse_rate_page, BcvRateFetcher, BCV_URL};
pub use binance_p2p::{volume_weighted_price, BinanceP2pClient, P2pOffer, P2P_URL, TOP_OFFERS};
pub use bvc::{parse_history_payload, BvcClient, BVC_URL};

/// Provider 호출 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP 상태 코드 {0}")]
    Status(u16),

    #[error("응답 구조 오류: {0}")]
    Structure(String),

    #[error("숫자 변환 실패: {0}")]
    Number(String),
}

impl SourceError {
    /// 파이프라인 에러 분류로 변환합니다.
    ///
    /// 전송/상태 오류는 `SourceUnavailable`, 구조/숫자 오류는 `MalformedPayload`.
    pub fn into_pipeline(self, feed: &str) -> PipelineError {
        match self {
            Self::Http(_) | Self::Status(_) => PipelineError::unavailable(feed, self),
            Self::Structure(_) | Self::Number(_) => PipelineError::malformed(feed, self),
        }
    }
}

/// 응답 상태를 확인합니다. 2xx가 아니면 `SourceError::Status`.
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

/// 공식 환율 소스.
#[async_trait]
pub trait OfficialRateSource: Send + Sync {
    /// 공식 환율을 한 번 조회합니다. 재시도하지 않습니다.
    async fn fetch_official_rate(&self) -> Result<OfficialRate, SourceError>;
}

/// P2P 호가 소스.
#[async_trait]
pub trait ParallelRateSource: Send + Sync {
    /// 업스트림 순서 그대로의 매수 호가 목록을 조회합니다.
    async fn fetch_offers(&self) -> Result<Vec<P2pOffer>, SourceError>;
}

/// 종목 히스토리 소스.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 한 종목의 원시 히스토리 행을 조회합니다.
    ///
    /// 응답에 히스토리가 없으면 빈 벡터를 반환합니다.
    async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<RawQuoteRow>, SourceError>;
}

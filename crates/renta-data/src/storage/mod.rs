//! 저장소 계층.
//!
//! 파이프라인은 네 개의 논리 테이블에 의존합니다:
//! - 종목 (code 고유)
//! - 환율 쌍 (date 고유)
//! - 종목 시세 ((symbol, date) 고유, 추가 위주)
//! - 설정 키/값 (마지막 실행 시각 등)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use renta_core::{Equity, EquityQuote, ExchangeRatePair};

use crate::error::Result;

pub use memory::MemoryStore;
pub use postgres::{Database, DatabaseConfig, PgMarketStore};

/// 마지막 BVC 시세 갱신 시각 설정 키.
pub const LAST_BVC_UPDATE_KEY: &str = "last_bvc_update";

/// 시세 조회 조건.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub symbol: Option<String>,
    /// 시작일 (포함)
    pub from: Option<NaiveDate>,
    /// 종료일 (포함)
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

impl QuoteFilter {
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 조건에 맞는 시세인지 확인합니다 (limit 제외).
    pub fn matches(&self, quote: &EquityQuote) -> bool {
        self.symbol.as_deref().map_or(true, |s| quote.symbol == s)
            && self.from.map_or(true, |d| quote.date >= d)
            && self.to.map_or(true, |d| quote.date <= d)
    }
}

/// 시세 파이프라인 저장소.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// 환율 쌍을 일자 기준으로 저장합니다. 같은 일자가 이미 있으면 기존 쌍을 유지합니다.
    async fn save_exchange_rate(&self, pair: &ExchangeRatePair) -> Result<()>;

    /// 특정 일자의 환율 쌍. `None`이면 가장 최근 일자.
    async fn exchange_rate(&self, date: Option<NaiveDate>) -> Result<Option<ExchangeRatePair>>;

    /// 종목 목록 (코드 순).
    async fn list_equities(&self, active_only: bool) -> Result<Vec<Equity>>;

    /// 종목을 등록합니다. 이미 있으면 `DataError::DuplicateError`.
    async fn insert_equity(&self, equity: &Equity) -> Result<()>;

    /// 시세 한 건을 저장합니다. (symbol, date)가 이미 있으면 `DataError::DuplicateError`.
    async fn insert_quote(&self, quote: &EquityQuote) -> Result<()>;

    /// 조건에 맞는 시세 (최신 일자 우선).
    async fn query_quotes(&self, filter: &QuoteFilter) -> Result<Vec<EquityQuote>>;

    /// 종목의 가장 최근 시세.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<EquityQuote>>;

    async fn get_config(&self, key: &str) -> Result<Option<String>>;

    /// 설정 값을 저장합니다 (없으면 추가, 있으면 갱신).
    async fn set_config(&self, key: &str, value: &str) -> Result<()>;
}

//! BVC 시세 수집 데이터 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 소스 Provider (BCV 공식 환율, Binance P2P 호가, BVC 종목 히스토리)
//! - 환율 집계기 (`ExchangeRateAggregator`)
//! - 종목 수집기 (`EquityHarvester`): 정규화, 최신일 선택, 기업 행위 보정, USD 환산
//! - 저장소 (`MarketStore` trait, PostgreSQL / 메모리 구현)

pub mod aggregator;
pub mod error;
pub mod harvest;
pub mod provider;
pub mod storage;
pub mod universe;

pub use aggregator::ExchangeRateAggregator;
pub use error::{DataError, Result};
pub use harvest::{EquityHarvester, HarvestOutcome};
pub use provider::{
    BcvRateFetcher, BinanceP2pClient, BvcClient, OfficialRateSource, P2pOffer,
    ParallelRateSource, QuoteSource, SourceError,
};
pub use storage::{
    Database, DatabaseConfig, MarketStore, MemoryStore, PgMarketStore, QuoteFilter,
    LAST_BVC_UPDATE_KEY,
};
pub use universe::{default_symbols, reference_equities, BVC_SYMBOLS};

//! BVC 시세 및 환율 수집기.
//!
//! 이 crate는 API 서버와 독립적으로 동작하는 수집 바이너리를 제공합니다:
//! - 환율 갱신 (BCV 공식 환율 + Binance P2P 병행 환율)
//! - BVC 종가 갱신 (USD 환산, 시가총액 계산)
//! - 평일 스케줄 데몬과 수동 실행

pub mod config;
pub mod error;
pub mod modules;
pub mod orchestrator;
pub mod schedule;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use orchestrator::{Orchestrator, PriceRefreshReport, RunReport, RunState, TaskSelector};
pub use schedule::{Schedule, ScheduleExpression};
pub use stats::CollectionStats;

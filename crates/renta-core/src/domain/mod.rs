//! 시세 수집 파이프라인의 도메인 모델.
//!
//! - `ExchangeRatePair` - 일자별 공식/병행 환율
//! - `RawQuoteRow`, `QuoteRow`, `EquityQuote` - 원시 행, 정규화 행, USD 환산 시세
//! - `Equity` - 종목 기준 정보 (발행주식수)
//! - `CorporateAdjustment` - 기업 행위 보정 규칙

pub mod adjustment;
pub mod equity;
pub mod exchange_rate;
pub mod quote;

pub use adjustment::*;
pub use equity::*;
pub use exchange_rate::*;
pub use quote::*;

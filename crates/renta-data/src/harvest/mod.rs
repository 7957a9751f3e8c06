//! 종목 시세 수집.
//!
//! 종목별 순차 조회 → 정규화 → 최신 거래일 선택 → 기업 행위 보정 → USD 환산.

mod harvester;
mod normalize;

pub use harvester::{EquityHarvester, HarvestOutcome, DEFAULT_REQUEST_DELAY};
pub use normalize::{
    apply_corporate_adjustments, convert_to_usd, latest_trading_date, normalize_payload,
    normalize_row, select_most_recent, QUOTE_DATE_FORMAT,
};

//! 시가총액 계산과 시장 요약.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Equity, EquityQuote};

/// 종목 목록에서 코드 → 발행주식수 맵을 만듭니다.
///
/// 비활성 종목과 발행주식수가 없거나 0인 종목은 제외됩니다.
pub fn shares_by_symbol(equities: &[Equity]) -> HashMap<String, i64> {
    equities
        .iter()
        .filter(|e| e.active)
        .filter_map(|e| e.usable_shares().map(|shares| (e.code.clone(), shares)))
        .collect()
}

/// 시세에 시가총액을 채웁니다.
///
/// 발행주식수가 알려진 종목만 `market_cap_*`가 설정되고, 나머지는 `None`으로
/// 남습니다. USD 종가가 없는 쪽의 시가총액도 `None`입니다.
pub fn compute_capitalization(
    quotes: Vec<EquityQuote>,
    shares_by_symbol: &HashMap<String, i64>,
) -> Vec<EquityQuote> {
    quotes
        .into_iter()
        .map(|mut quote| {
            match shares_by_symbol.get(&quote.symbol).copied().filter(|&s| s != 0) {
                Some(shares) => {
                    let shares = shares as f64;
                    quote.market_cap_official = quote.close_usd_official.map(|p| p * shares);
                    quote.market_cap_parallel = quote.close_usd_parallel.map(|p| p * shares);
                }
                None => {
                    quote.market_cap_official = None;
                    quote.market_cap_parallel = None;
                }
            }
            quote
        })
        .collect()
}

/// 종목별 요약 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySummary {
    pub code: String,
    pub name: String,
    pub date: NaiveDate,
    pub close_price_local: Option<f64>,
    pub close_usd_official: Option<f64>,
    pub close_usd_parallel: Option<f64>,
    pub market_cap_official: Option<f64>,
    pub market_cap_parallel: Option<f64>,
}

/// 시장 전체 요약.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    /// 시가총액 합계 (USD, 공식 환율)
    pub total_cap_official: f64,
    /// 시가총액 합계 (USD, 병행 환율)
    pub total_cap_parallel: f64,
    /// 시세가 있는 활성 종목 수
    pub equity_count: usize,
    /// 가장 최근 시세 일자
    pub latest_date: Option<NaiveDate>,
    pub equities: Vec<EquitySummary>,
}

/// 활성 종목별 최신 시세로 시장 요약을 계산합니다.
///
/// `latest_quotes`는 종목 코드 → 최신 시세입니다. 시세가 없는 종목은
/// 건너뛰고, 시가총액이 `None`이면 합계에 0으로 기여합니다.
pub fn summarize_market(
    equities: &[Equity],
    latest_quotes: &HashMap<String, EquityQuote>,
) -> MarketSummary {
    let mut total_cap_official = 0.0;
    let mut total_cap_parallel = 0.0;
    let mut latest_date: Option<NaiveDate> = None;
    let mut details = Vec::new();

    for equity in equities.iter().filter(|e| e.active) {
        let Some(quote) = latest_quotes.get(&equity.code) else {
            continue;
        };

        total_cap_official += quote.market_cap_official.unwrap_or(0.0);
        total_cap_parallel += quote.market_cap_parallel.unwrap_or(0.0);
        latest_date = latest_date.max(Some(quote.date));

        details.push(EquitySummary {
            code: equity.code.clone(),
            name: equity.name.clone(),
            date: quote.date,
            close_price_local: quote.close_price_local,
            close_usd_official: quote.close_usd_official,
            close_usd_parallel: quote.close_usd_parallel,
            market_cap_official: quote.market_cap_official,
            market_cap_parallel: quote.market_cap_parallel,
        });
    }

    MarketSummary {
        total_cap_official,
        total_cap_parallel,
        equity_count: details.len(),
        latest_date,
        equities: details,
    }
}

//! 시장 요약과 마지막 갱신 마커 조회.

use std::collections::HashMap;

use renta_core::{summarize_market, MarketSummary};
use renta_data::{MarketStore, LAST_BVC_UPDATE_KEY};

use crate::Result;

/// 활성 종목별 최신 시세로 시장 요약을 만듭니다.
pub async fn market_summary<S>(store: &S) -> Result<MarketSummary>
where
    S: MarketStore + ?Sized,
{
    let equities = store.list_equities(true).await?;

    let mut latest = HashMap::with_capacity(equities.len());
    for equity in &equities {
        if let Some(quote) = store.latest_quote(&equity.code).await? {
            latest.insert(equity.code.clone(), quote);
        }
    }

    let summary = summarize_market(&equities, &latest);
    tracing::info!(
        equities = summary.equity_count,
        total_cap_official = summary.total_cap_official,
        total_cap_parallel = summary.total_cap_parallel,
        "시장 요약 계산"
    );
    Ok(summary)
}

/// 마지막 BVC 갱신 시각 (RFC 3339).
pub async fn last_update_marker<S>(store: &S) -> Result<Option<String>>
where
    S: MarketStore + ?Sized,
{
    Ok(store.get_config(LAST_BVC_UPDATE_KEY).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use renta_core::{Equity, EquityQuote};
    use renta_data::MemoryStore;

    fn quote(symbol: &str, day: u32, cap: f64) -> EquityQuote {
        EquityQuote {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            close_price_local: Some(cap),
            close_usd_official: Some(cap),
            close_usd_parallel: Some(cap / 2.0),
            amount_traded_usd_official: None,
            amount_traded_usd_parallel: None,
            num_operations: 0,
            titles_traded: 0,
            market_cap_official: Some(cap),
            market_cap_parallel: Some(cap / 2.0),
        }
    }

    #[tokio::test]
    async fn test_summary_uses_latest_quote_of_active_equities() {
        let store = MemoryStore::new();
        store.insert_equity(&Equity::new("BNC", "Banco Nacional", Some(10))).await.unwrap();
        let mut inactive = Equity::new("BPV", "Banco Provincial", Some(10));
        inactive.active = false;
        store.insert_equity(&inactive).await.unwrap();

        store.insert_quote(&quote("BNC", 13, 100.0)).await.unwrap();
        store.insert_quote(&quote("BNC", 14, 200.0)).await.unwrap();
        store.insert_quote(&quote("BPV", 14, 999.0)).await.unwrap();

        let summary = market_summary(&store).await.unwrap();
        assert_eq!(summary.equity_count, 1);
        assert_eq!(summary.total_cap_official, 200.0);
        assert_eq!(summary.total_cap_parallel, 100.0);
        assert_eq!(summary.latest_date, NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[tokio::test]
    async fn test_marker_absent_until_written() {
        let store = MemoryStore::new();
        assert_eq!(last_update_marker(&store).await.unwrap(), None);

        store.set_config(LAST_BVC_UPDATE_KEY, "2025-03-14T17:00:00-04:00").await.unwrap();
        assert_eq!(
            last_update_marker(&store).await.unwrap().as_deref(),
            Some("2025-03-14T17:00:00-04:00")
        );
    }
}

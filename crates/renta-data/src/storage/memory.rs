//! 메모리 저장소.
//!
//! 테스트와 DB 없이 실행하는 점검 명령에서 사용합니다. PostgreSQL 구현과 같은
//! 고유 키 규칙을 따릅니다.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use renta_core::{Equity, EquityQuote, ExchangeRatePair};
use tokio::sync::RwLock;

use super::{MarketStore, QuoteFilter};
use crate::error::{DataError, Result};

#[derive(Debug, Default)]
struct Tables {
    rates: BTreeMap<NaiveDate, ExchangeRatePair>,
    equities: BTreeMap<String, Equity>,
    quotes: Vec<EquityQuote>,
    config: HashMap<String, String>,
}

/// `MarketStore`의 메모리 구현.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 시세 수.
    pub async fn quote_count(&self) -> usize {
        self.tables.read().await.quotes.len()
    }

    /// 저장된 환율 쌍 수.
    pub async fn rate_count(&self) -> usize {
        self.tables.read().await.rates.len()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn save_exchange_rate(&self, pair: &ExchangeRatePair) -> Result<()> {
        self.tables.write().await.rates.entry(pair.date).or_insert(*pair);
        Ok(())
    }

    async fn exchange_rate(&self, date: Option<NaiveDate>) -> Result<Option<ExchangeRatePair>> {
        let tables = self.tables.read().await;
        Ok(match date {
            Some(date) => tables.rates.get(&date).copied(),
            None => tables.rates.values().next_back().copied(),
        })
    }

    async fn list_equities(&self, active_only: bool) -> Result<Vec<Equity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .equities
            .values()
            .filter(|e| !active_only || e.active)
            .cloned()
            .collect())
    }

    async fn insert_equity(&self, equity: &Equity) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.equities.contains_key(&equity.code) {
            return Err(DataError::DuplicateError(format!("equities.code={}", equity.code)));
        }
        tables.equities.insert(equity.code.clone(), equity.clone());
        Ok(())
    }

    async fn insert_quote(&self, quote: &EquityQuote) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .quotes
            .iter()
            .any(|q| q.symbol == quote.symbol && q.date == quote.date)
        {
            return Err(DataError::DuplicateError(format!(
                "equity_quotes=({}, {})",
                quote.symbol, quote.date
            )));
        }
        tables.quotes.push(quote.clone());
        Ok(())
    }

    async fn query_quotes(&self, filter: &QuoteFilter) -> Result<Vec<EquityQuote>> {
        let tables = self.tables.read().await;
        let mut quotes: Vec<EquityQuote> = tables
            .quotes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();

        quotes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
        if let Some(limit) = filter.limit {
            quotes.truncate(limit.max(0) as usize);
        }
        Ok(quotes)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<EquityQuote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .quotes
            .iter()
            .filter(|q| q.symbol == symbol)
            .max_by_key(|q| q.date)
            .cloned())
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>> {
        Ok(self.tables.read().await.config.get(key).cloned())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quote(symbol: &str, date: NaiveDate) -> EquityQuote {
        EquityQuote {
            symbol: symbol.to_string(),
            date,
            close_price_local: Some(10.0),
            close_usd_official: Some(0.2),
            close_usd_parallel: Some(0.1),
            amount_traded_usd_official: None,
            amount_traded_usd_parallel: None,
            num_operations: 1,
            titles_traded: 1,
            market_cap_official: None,
            market_cap_parallel: None,
        }
    }

    #[tokio::test]
    async fn test_rate_keeps_first_pair_and_latest() {
        let store = MemoryStore::new();
        let first = ExchangeRatePair::new(ymd(2025, 3, 13), 64.0, 90.0).unwrap();
        let second = ExchangeRatePair::new(ymd(2025, 3, 14), 65.0, 92.0).unwrap();
        let rerun = ExchangeRatePair::new(ymd(2025, 3, 14), 65.5, 93.0).unwrap();

        store.save_exchange_rate(&first).await.unwrap();
        store.save_exchange_rate(&second).await.unwrap();
        store.save_exchange_rate(&rerun).await.unwrap();

        // 이미 저장된 일자는 처음 저장한 쌍을 유지
        assert_eq!(store.rate_count().await, 2);
        assert_eq!(store.exchange_rate(None).await.unwrap(), Some(second));
        assert_ne!(store.exchange_rate(None).await.unwrap(), Some(rerun));
        assert_eq!(
            store.exchange_rate(Some(ymd(2025, 3, 13))).await.unwrap(),
            Some(first)
        );
        assert_eq!(store.exchange_rate(Some(ymd(2025, 1, 1))).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_quote_rejected() {
        let store = MemoryStore::new();
        store.insert_quote(&quote("BNC", ymd(2025, 3, 14))).await.unwrap();

        let err = store
            .insert_quote(&quote("BNC", ymd(2025, 3, 14)))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.quote_count().await, 1);
    }

    #[tokio::test]
    async fn test_query_quotes_newest_first_with_limit() {
        let store = MemoryStore::new();
        for (symbol, day) in [("BNC", 12), ("BNC", 14), ("BNC", 13), ("BPV", 14)] {
            store.insert_quote(&quote(symbol, ymd(2025, 3, day))).await.unwrap();
        }

        let bnc = store
            .query_quotes(&QuoteFilter::for_symbol("BNC").with_limit(2))
            .await
            .unwrap();
        let dates: Vec<_> = bnc.iter().map(|q| q.date).collect();
        assert_eq!(dates, vec![ymd(2025, 3, 14), ymd(2025, 3, 13)]);

        let ranged = store
            .query_quotes(&QuoteFilter::default().between(Some(ymd(2025, 3, 13)), None))
            .await
            .unwrap();
        assert_eq!(ranged.len(), 3);

        let latest = store.latest_quote("BNC").await.unwrap().unwrap();
        assert_eq!(latest.date, ymd(2025, 3, 14));
        assert!(store.latest_quote("EFE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_equities_and_config() {
        let store = MemoryStore::new();
        let mut inactive = Equity::new("MERC", "Banco Mercantil", Some(1));
        inactive.active = false;

        store.insert_equity(&Equity::new("BNC", "BNC", Some(10))).await.unwrap();
        store.insert_equity(&inactive).await.unwrap();
        assert!(store
            .insert_equity(&Equity::new("BNC", "otro", None))
            .await
            .unwrap_err()
            .is_duplicate());

        assert_eq!(store.list_equities(true).await.unwrap().len(), 1);
        assert_eq!(store.list_equities(false).await.unwrap().len(), 2);

        assert_eq!(store.get_config("k").await.unwrap(), None);
        store.set_config("k", "a").await.unwrap();
        store.set_config("k", "b").await.unwrap();
        assert_eq!(store.get_config("k").await.unwrap().as_deref(), Some("b"));
    }
}

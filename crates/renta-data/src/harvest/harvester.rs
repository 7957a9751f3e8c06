//! 종목별 순차 수집기.

use std::time::Duration;

use chrono::NaiveDate;
use renta_core::{harvest_span, EquityQuote, ExchangeRatePair, PipelineError, QuoteRow};
use tracing::{debug, error, info, warn, Instrument};

use super::normalize::{
    apply_corporate_adjustments, convert_to_usd, latest_trading_date, normalize_payload,
    select_most_recent,
};
use crate::provider::QuoteSource;

/// 성공한 조회 뒤 다음 종목으로 넘어가기 전 대기 시간.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1500);

/// 한 번의 수집 결과.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestOutcome {
    /// 선택된 최신 거래일 (수집된 행이 없으면 `None`)
    pub date: Option<NaiveDate>,
    /// USD 환산 시세 (시가총액은 비어 있음)
    pub quotes: Vec<EquityQuote>,
    /// 조회에 성공한 종목
    pub fetched_symbols: Vec<String>,
    /// 조회에 실패한 종목
    pub failed_symbols: Vec<String>,
    /// 10개 미만 컬럼으로 온 행 수
    pub short_rows: usize,
    /// 기업 행위 보정이 적용된 행 수
    pub adjusted_rows: usize,
}

impl HarvestOutcome {
    /// 저장할 시세가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// 일부 종목만 조회에 성공했는지 확인합니다.
    pub fn is_partial(&self) -> bool {
        !self.fetched_symbols.is_empty() && !self.failed_symbols.is_empty()
    }

    /// 부분 수집이면 `PipelineError::PartialBatch`.
    pub fn partial_error(&self) -> Option<PipelineError> {
        self.is_partial().then(|| PipelineError::PartialBatch {
            succeeded: self.fetched_symbols.len(),
            failed: self.failed_symbols.len(),
        })
    }
}

/// 종목 시세 수집기.
///
/// 종목은 한 번에 하나씩 조회합니다. 조회에 성공하면 다음 종목 전에
/// `request_delay`만큼 대기하고, 실패한 종목 뒤에는 대기하지 않습니다.
pub struct EquityHarvester {
    source: Box<dyn QuoteSource>,
    symbols: Vec<String>,
    request_delay: Duration,
}

impl EquityHarvester {
    pub fn new(source: Box<dyn QuoteSource>, symbols: Vec<String>) -> Self {
        Self {
            source,
            symbols,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// 주어진 환율 쌍으로 전체 종목을 수집합니다.
    ///
    /// 모든 종목 조회가 실패해도 에러가 아니라 빈 결과입니다.
    pub async fn harvest(&self, pair: &ExchangeRatePair) -> HarvestOutcome {
        info!(symbols = self.symbols.len(), "BVC 시세 수집 시작");

        let mut outcome = HarvestOutcome::default();
        let rows = self.fetch_all(&mut outcome).await;

        let mut latest = select_most_recent(rows);
        outcome.date = latest_trading_date(&latest);

        let Some(date) = outcome.date else {
            warn!(
                failed = outcome.failed_symbols.len(),
                "BVC 데이터 없음"
            );
            return outcome;
        };

        outcome.adjusted_rows = apply_corporate_adjustments(&mut latest);
        outcome.quotes = convert_to_usd(latest, pair);

        info!(
            date = %date,
            quotes = outcome.quotes.len(),
            adjusted = outcome.adjusted_rows,
            failed = outcome.failed_symbols.len(),
            "BVC 시세 수집 완료"
        );
        outcome
    }

    /// 종목을 순서대로 조회해 정규화된 행을 모읍니다.
    async fn fetch_all(&self, outcome: &mut HarvestOutcome) -> Vec<QuoteRow> {
        let mut rows = Vec::new();
        let total = self.symbols.len();

        for (idx, symbol) in self.symbols.iter().enumerate() {
            debug!(
                symbol = %symbol,
                progress = format!("{}/{}", idx + 1, total),
                "종목 조회"
            );

            let result = self
                .source
                .fetch_symbol(symbol)
                .instrument(harvest_span!("fetch_symbol", symbol))
                .await;

            match result {
                Ok(raw_rows) => {
                    let short = raw_rows.iter().filter(|r| r.is_short()).count();
                    if short > 0 {
                        debug!(symbol = %symbol, short, "컬럼이 부족한 행");
                    }
                    outcome.short_rows += short;
                    rows.extend(normalize_payload(symbol, &raw_rows));
                    outcome.fetched_symbols.push(symbol.clone());

                    if idx + 1 < total {
                        tokio::time::sleep(self.request_delay).await;
                    }
                }
                Err(e) => {
                    let err = e.into_pipeline("bvc");
                    error!(symbol = %symbol, feed = "bvc", error = %err, "종목 조회 실패");
                    outcome.failed_symbols.push(symbol.clone());
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SourceError;
    use async_trait::async_trait;
    use renta_core::RawQuoteRow;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 종목별 고정 응답. 등록되지 않은 종목은 503.
    struct StubSource {
        rows: HashMap<String, Vec<Vec<&'static str>>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl StubSource {
        fn new(rows: &[(&str, Vec<Vec<&'static str>>)]) -> Self {
            Self {
                rows: rows
                    .iter()
                    .map(|(s, r)| (s.to_string(), r.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<RawQuoteRow>, SourceError> {
            self.calls
                .lock()
                .unwrap()
                .push((symbol.to_string(), Instant::now()));

            match self.rows.get(symbol) {
                Some(rows) => Ok(rows
                    .iter()
                    .map(|cells| {
                        RawQuoteRow::from_cells(cells.iter().map(|c| Some(c.to_string())))
                    })
                    .collect()),
                None => Err(SourceError::Status(503)),
            }
        }
    }

    /// 호출 기록을 테스트에서 읽기 위한 래퍼.
    struct Shared(std::sync::Arc<StubSource>);

    #[async_trait]
    impl QuoteSource for Shared {
        async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<RawQuoteRow>, SourceError> {
            self.0.fetch_symbol(symbol).await
        }
    }

    fn pair() -> ExchangeRatePair {
        ExchangeRatePair::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), 50.0, 80.0)
            .unwrap()
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_after_successful_fetch() {
        let stub = std::sync::Arc::new(StubSource::new(&[
            ("ABC.A", vec![vec!["14-03-25", "1,00", "2,00"]]),
            ("CCR", vec![vec!["14-03-25", "1,00", "3,00"]]),
        ]));
        let harvester = EquityHarvester::new(
            Box::new(Shared(stub.clone())),
            symbols(&["ABC.A", "BNC", "CCR"]),
        );

        let start = Instant::now();
        let outcome = harvester.harvest(&pair()).await;

        let calls = stub.calls.lock().unwrap().clone();
        let order: Vec<_> = calls.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["ABC.A", "BNC", "CCR"]);
        assert!(calls[1].1 - calls[0].1 >= Duration::from_millis(1500));
        // 실패한 종목 뒤에는 대기하지 않음
        assert_eq!(calls[2].1, calls[1].1);
        // 마지막 종목 뒤에도 대기하지 않음
        assert!(start.elapsed() < Duration::from_millis(3000));
        assert_eq!(outcome.failed_symbols, vec!["BNC"]);
        assert_eq!(outcome.quotes.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_keeps_successful_symbol() {
        let stub = StubSource::new(&[(
            "BNC",
            vec![
                vec!["08-01-25", "0,50", "0,75", "", "", "", "", "3", "3.000", "2.250,00"],
                vec!["07-01-25", "0,40", "0,50", "", "", "", "", "1", "1.000", "500,00"],
            ],
        )]);
        let harvester = EquityHarvester::new(Box::new(stub), symbols(&["BNC", "BPV"]));

        let outcome = harvester.harvest(&pair()).await;

        assert_eq!(outcome.date, NaiveDate::from_ymd_opt(2025, 1, 8));
        assert_eq!(outcome.quotes.len(), 1);
        assert_eq!(outcome.quotes[0].symbol, "BNC");
        // 2025-01-08은 액면 변경 보정일
        assert_eq!(outcome.quotes[0].close_price_local, Some(750.0));
        assert_eq!(outcome.quotes[0].titles_traded, 3);
        assert_eq!(outcome.adjusted_rows, 1);
        assert!(outcome.is_partial());
        assert_eq!(
            outcome.partial_error(),
            Some(PipelineError::PartialBatch {
                succeeded: 1,
                failed: 1
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_date_across_symbols() {
        let stub = StubSource::new(&[
            ("BNC", vec![vec!["13-03-25", "1,00", "10,00"]]),
            (
                "BPV",
                vec![
                    vec!["14-03-25", "1,00", "20,00"],
                    vec!["no-date", "1,00", "30,00"],
                ],
            ),
        ]);
        let harvester = EquityHarvester::new(Box::new(stub), symbols(&["BNC", "BPV"]));

        let outcome = harvester.harvest(&pair()).await;

        assert_eq!(outcome.date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(outcome.quotes.len(), 1);
        assert_eq!(outcome.quotes[0].symbol, "BPV");
        assert_eq!(outcome.short_rows, 3);
        assert!(!outcome.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_is_empty_not_error() {
        let harvester =
            EquityHarvester::new(Box::new(StubSource::new(&[])), symbols(&["BNC", "BPV"]));

        let outcome = harvester.harvest(&pair()).await;

        assert!(outcome.is_empty());
        assert_eq!(outcome.date, None);
        assert_eq!(outcome.failed_symbols.len(), 2);
        assert!(!outcome.is_partial());
    }
}

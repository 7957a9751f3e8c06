//! 환율/시세 갱신 오케스트레이터.
//!
//! 두 작업을 순서대로 묶습니다.
//! - 환율 갱신: BCV 공식 환율과 P2P 병행 환율을 모두 얻으면 일자별로 저장 (이미 있으면 유지)
//! - 시세 갱신: 자체적으로 환율을 다시 구한 뒤 BVC 시세를 수집, 시가총액을
//!   계산하고 행 단위로 저장, 마지막에 `last_bvc_update` 마커 기록
//!
//! 스케줄 실행과 수동 실행은 같은 코드 경로를 타며, 실행 잠금으로 직렬화됩니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use renta_core::{
    compute_capitalization, shares_by_symbol, ExchangeRatePair, PipelineError, PipelineResult,
};
use renta_data::provider::{BcvRateFetcher, BinanceP2pClient, BvcClient};
use renta_data::{EquityHarvester, ExchangeRateAggregator, MarketStore, LAST_BVC_UPDATE_KEY};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::CollectorConfig;
use crate::schedule::Schedule;
use crate::stats::CollectionStats;

/// 오케스트레이터 실행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    RatesRunning,
    PricesRunning,
}

/// 수동 실행 대상 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSelector {
    Rates,
    Prices,
}

impl TaskSelector {
    /// `tasas`/`rates`는 환율 작업, 그 외(기본 `bvc`)는 시세 작업.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tasas" | "rates" => Self::Rates,
            _ => Self::Prices,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rates => "tasas",
            Self::Prices => "bvc",
        }
    }
}

/// 시세 갱신 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRefreshReport {
    /// 선택된 거래일 (수집된 행이 없으면 `None`)
    pub date: Option<NaiveDate>,
    /// 이번 실행에서 사용한 환율 쌍
    pub rates: ExchangeRatePair,
    /// 수집된 시세 행 수
    pub harvested: usize,
    /// 저장에 성공한 행 수
    pub persisted: usize,
    /// 저장에 실패한 행 수
    pub errors: usize,
    pub failed_symbols: Vec<String>,
    /// 일부 종목만 조회에 성공함
    pub partial: bool,
    pub stats: CollectionStats,
}

/// 수동/스케줄 실행 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Rates(ExchangeRatePair),
    Prices(PriceRefreshReport),
}

impl RunReport {
    pub fn task(&self) -> TaskSelector {
        match self {
            Self::Rates(_) => TaskSelector::Rates,
            Self::Prices(_) => TaskSelector::Prices,
        }
    }
}

/// 실행 상태를 `Idle`로 되돌리는 가드.
struct RunningGuard<'a> {
    state: &'a watch::Sender<RunState>,
}

impl<'a> RunningGuard<'a> {
    fn enter(state: &'a watch::Sender<RunState>, running: RunState) -> Self {
        state.send_replace(running);
        Self { state }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(RunState::Idle);
    }
}

/// 환율/시세 갱신 오케스트레이터.
pub struct Orchestrator<S: MarketStore> {
    aggregator: ExchangeRateAggregator,
    harvester: EquityHarvester,
    store: Arc<S>,
    schedule: Schedule,
    run_lock: Mutex<()>,
    state: watch::Sender<RunState>,
}

impl<S: MarketStore> Orchestrator<S> {
    pub fn new(
        aggregator: ExchangeRateAggregator,
        harvester: EquityHarvester,
        store: Arc<S>,
        schedule: Schedule,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            aggregator,
            harvester,
            store,
            schedule,
            run_lock: Mutex::new(()),
            state,
        }
    }

    /// 설정으로 실제 HTTP 소스를 구성합니다.
    pub fn from_config(config: &CollectorConfig, store: Arc<S>) -> crate::Result<Self> {
        let sources = &config.sources;
        let schedule = Schedule::from_config(&config.schedule);

        let official = BcvRateFetcher::with_options(
            sources.bcv_url.clone(),
            sources.bcv_timeout(),
            schedule.timezone,
        )?;
        let parallel = BinanceP2pClient::with_options(sources.p2p_url.clone(), sources.p2p_timeout())?;
        let quotes = BvcClient::with_options(sources.bvc_url.clone(), sources.bvc_timeout())?;

        let aggregator = ExchangeRateAggregator::new(Box::new(official), Box::new(parallel));
        let harvester = EquityHarvester::new(Box::new(quotes), sources.symbols.clone())
            .with_request_delay(sources.request_delay());

        Ok(Self::new(aggregator, harvester, store, schedule))
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// 실행 상태 변경 구독.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 작업 선택자에 따라 한 번 실행합니다.
    pub async fn trigger(&self, task: TaskSelector) -> PipelineResult<RunReport> {
        info!(task = task.as_str(), "작업 실행 요청");
        match task {
            TaskSelector::Rates => self.run_rate_refresh().await.map(RunReport::Rates),
            TaskSelector::Prices => self.run_price_refresh().await.map(RunReport::Prices),
        }
    }

    /// 환율 갱신 작업.
    ///
    /// 두 환율 중 하나라도 얻지 못하면 아무것도 저장하지 않습니다.
    pub async fn run_rate_refresh(&self) -> PipelineResult<ExchangeRatePair> {
        let _lock = self.run_lock.lock().await;
        let _running = RunningGuard::enter(&self.state, RunState::RatesRunning);

        let pair = self.acquire_rates().await?;
        self.store.save_exchange_rate(&pair).await.map_err(|e| {
            error!(date = %pair.date, error = %e, "환율 저장 실패");
            PipelineError::persistence("exchange_rates", e)
        })?;

        info!(
            date = %pair.date,
            official = pair.official_rate,
            parallel = pair.parallel_rate,
            "환율 갱신 완료"
        );
        Ok(pair)
    }

    /// 시세 갱신 작업.
    ///
    /// 환율을 얻지 못하면 `DependencyMissing`으로 중단하며 시세 행은 저장하지
    /// 않습니다. 개별 행 저장 실패는 집계만 하고 나머지 행을 계속 저장합니다.
    pub async fn run_price_refresh(&self) -> PipelineResult<PriceRefreshReport> {
        let _lock = self.run_lock.lock().await;
        let _running = RunningGuard::enter(&self.state, RunState::PricesRunning);
        let started = Instant::now();

        let pair = match self.acquire_rates().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "환율 없음, 시세 갱신 중단");
                return Err(PipelineError::DependencyMissing(e.to_string()));
            }
        };

        // 같은 일자의 환율이 이미 있으면 저장된 쌍이 유지되고, 변환에는 이번 쌍을 씀
        if let Err(e) = self.store.save_exchange_rate(&pair).await {
            warn!(date = %pair.date, error = %e, "환율 저장 실패, 메모리 환율로 계속 진행");
        }

        let outcome = self.harvester.harvest(&pair).await;
        if let Some(partial) = outcome.partial_error() {
            warn!(failed = ?outcome.failed_symbols, "{}", partial);
        }

        let shares = self.load_shares().await;
        let quotes = compute_capitalization(outcome.quotes.clone(), &shares);

        let mut stats = CollectionStats::new();
        stats.total = quotes.len();
        stats.failed_symbols = outcome.failed_symbols.clone();
        stats.short_rows = outcome.short_rows;

        for quote in &quotes {
            match self.store.insert_quote(quote).await {
                Ok(()) => {
                    stats.success += 1;
                    debug!(symbol = %quote.symbol, date = %quote.date, "시세 저장");
                }
                Err(e) => {
                    stats.errors += 1;
                    let err = PipelineError::persistence("equity_quotes", &e);
                    error!(symbol = %quote.symbol, date = %quote.date, error = %err, "시세 저장 실패");
                }
            }
        }

        if !outcome.is_empty() {
            self.write_marker().await;
        }

        stats.elapsed = started.elapsed();
        stats.log_summary("BVC 시세 갱신");

        Ok(PriceRefreshReport {
            date: outcome.date,
            rates: pair,
            harvested: quotes.len(),
            persisted: stats.success,
            errors: stats.errors,
            partial: outcome.is_partial(),
            failed_symbols: outcome.failed_symbols,
            stats,
        })
    }

    /// 스케줄 데몬. `shutdown`이 완료되면 종료합니다.
    ///
    /// 각 작업의 다음 실행 시각을 따로 유지하며, 같은 시각이면 환율 작업이 먼저입니다.
    pub async fn run_daemon<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let clock = DaemonClock::start();
        let now = clock.now();
        let mut next_rates = self.schedule.next_occurrence(TaskSelector::Rates, now);
        let mut next_prices = self.schedule.next_occurrence(TaskSelector::Prices, now);

        loop {
            let Some((task, at)) = earliest(next_rates, next_prices) else {
                error!("다음 실행 시각을 계산할 수 없음, 데몬 종료");
                return;
            };

            let deadline = clock.deadline(at);
            info!(
                task = task.as_str(),
                at = %at.with_timezone(&self.schedule.timezone),
                wait_secs = deadline.saturating_duration_since(Instant::now()).as_secs(),
                "다음 작업 대기"
            );

            tokio::select! {
                _ = &mut shutdown => {
                    info!("종료 신호 수신, 데몬 종료");
                    return;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    match self.trigger(task).await {
                        Ok(report) => info!(task = report.task().as_str(), "예약 작업 완료"),
                        Err(e) => error!(task = task.as_str(), error = %e, "예약 작업 실패"),
                    }

                    let next = self.schedule.next_occurrence(task, at);
                    match task {
                        TaskSelector::Rates => next_rates = next,
                        TaskSelector::Prices => next_prices = next,
                    }
                }
            }
        }
    }

    /// 두 환율을 조회해 이번 실행의 환율 쌍을 만듭니다.
    ///
    /// 공식 환율이 없으면 P2P는 조회하지 않습니다.
    async fn acquire_rates(&self) -> PipelineResult<ExchangeRatePair> {
        let official = self.aggregator.fetch_official_rate().await.ok_or_else(|| {
            warn!(feed = "bcv", "공식 환율 없음");
            PipelineError::unavailable("bcv", "공식 환율을 얻지 못함")
        })?;
        let parallel = self.aggregator.fetch_parallel_rate().await.ok_or_else(|| {
            warn!(feed = "p2p", "병행 환율 없음");
            PipelineError::unavailable("p2p", "병행 환율을 얻지 못함")
        })?;

        let date = self.schedule.run_date(Utc::now());
        ExchangeRatePair::new(date, official.rate, parallel)
    }

    /// 활성 종목의 발행주식수. 조회 실패 시 빈 맵.
    async fn load_shares(&self) -> HashMap<String, i64> {
        match self.store.list_equities(true).await {
            Ok(equities) => shares_by_symbol(&equities),
            Err(e) => {
                warn!(error = %e, "종목 목록 조회 실패, 시가총액 없이 저장");
                HashMap::new()
            }
        }
    }

    async fn write_marker(&self) {
        let stamp = Utc::now().with_timezone(&self.schedule.timezone).to_rfc3339();
        match self.store.set_config(LAST_BVC_UPDATE_KEY, &stamp).await {
            Ok(()) => debug!(key = LAST_BVC_UPDATE_KEY, value = %stamp, "실행 마커 기록"),
            Err(e) => warn!(key = LAST_BVC_UPDATE_KEY, error = %e, "실행 마커 기록 실패"),
        }
    }
}

/// 데몬 시작 시점에 고정한 벽시계와 단조 시계의 대응.
///
/// 실행 시각은 이 기준점에서 `tokio::time::Instant` 마감 시각으로 바뀝니다.
struct DaemonClock {
    utc: DateTime<Utc>,
    instant: Instant,
}

impl DaemonClock {
    fn start() -> Self {
        Self {
            utc: Utc::now(),
            instant: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.instant.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.utc + elapsed
    }

    fn deadline(&self, at: DateTime<Utc>) -> Instant {
        self.instant + (at - self.utc).to_std().unwrap_or_default()
    }
}

fn earliest(
    rates: Option<DateTime<Utc>>,
    prices: Option<DateTime<Utc>>,
) -> Option<(TaskSelector, DateTime<Utc>)> {
    match (rates, prices) {
        (Some(r), Some(p)) if p < r => Some((TaskSelector::Prices, p)),
        (Some(r), _) => Some((TaskSelector::Rates, r)),
        (None, Some(p)) => Some((TaskSelector::Prices, p)),
        (None, None) => None,
    }
}

//! 외부 소스 점검.
//!
//! 각 소스를 한 번씩 조회해 결과만 보고하며, 아무것도 저장하지 않습니다.

use std::time::Instant;

use chrono::NaiveDate;
use renta_core::OfficialRate;
use renta_data::harvest::{latest_trading_date, normalize_payload};
use renta_data::provider::{
    volume_weighted_price, BcvRateFetcher, BinanceP2pClient, BvcClient, P2pOffer, TOP_OFFERS,
};

use crate::{CollectionStats, CollectorConfig, Result};

/// 기본 점검 종목 수.
const DEFAULT_PROBE_SYMBOLS: usize = 3;

/// 종목 조회 점검 결과.
#[derive(Debug, Clone)]
pub struct SymbolProbe {
    pub symbol: String,
    /// 행 수와 최신 거래일, 실패 시 에러 메시지
    pub result: std::result::Result<(usize, Option<NaiveDate>), String>,
}

/// 소스 점검 결과.
#[derive(Debug, Clone)]
pub struct SourceProbe {
    pub official: std::result::Result<OfficialRate, String>,
    pub offers: std::result::Result<Vec<P2pOffer>, String>,
    /// 상위 호가 가중 평균
    pub parallel_rate: Option<f64>,
    pub symbols: Vec<SymbolProbe>,
    pub stats: CollectionStats,
}

/// 모든 소스를 한 번씩 조회합니다.
///
/// `symbols`가 없으면 설정된 종목 중 앞의 몇 개만 조회합니다.
pub async fn check_sources(
    config: &CollectorConfig,
    symbols: Option<Vec<String>>,
) -> Result<SourceProbe> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    let sources = &config.sources;

    let bcv = BcvRateFetcher::with_options(
        sources.bcv_url.clone(),
        sources.bcv_timeout(),
        config.schedule.timezone,
    )?;
    let p2p = BinanceP2pClient::with_options(sources.p2p_url.clone(), sources.p2p_timeout())?;
    let bvc = BvcClient::with_options(sources.bvc_url.clone(), sources.bvc_timeout())?;

    stats.total += 1;
    let official = bcv.fetch().await.map_err(|e| e.to_string());
    match &official {
        Ok(rate) => {
            stats.success += 1;
            tracing::info!(date = %rate.date, rate = rate.rate, "BCV 점검 성공");
        }
        Err(e) => {
            stats.errors += 1;
            tracing::warn!(feed = "bcv", error = %e, "BCV 점검 실패");
        }
    }

    stats.total += 1;
    let offers = p2p.top_offers().await.map_err(|e| e.to_string());
    let parallel_rate = match &offers {
        Ok(offers) => {
            stats.success += 1;
            let rate = volume_weighted_price(&offers[..offers.len().min(TOP_OFFERS)]);
            tracing::info!(offers = offers.len(), rate = ?rate, "P2P 점검 성공");
            rate
        }
        Err(e) => {
            stats.errors += 1;
            tracing::warn!(feed = "p2p", error = %e, "P2P 점검 실패");
            None
        }
    };

    let targets = symbols.unwrap_or_else(|| {
        sources
            .symbols
            .iter()
            .take(DEFAULT_PROBE_SYMBOLS)
            .cloned()
            .collect()
    });

    let mut symbol_probes = Vec::with_capacity(targets.len());
    for symbol in targets {
        stats.total += 1;
        let result = match bvc.fetch_history(&symbol).await {
            Ok(raw) => {
                stats.success += 1;
                stats.short_rows += raw.iter().filter(|r| r.is_short()).count();
                let rows = normalize_payload(&symbol, &raw);
                let latest = latest_trading_date(&rows);
                tracing::info!(symbol = %symbol, rows = rows.len(), latest = ?latest, "BVC 점검 성공");
                Ok((rows.len(), latest))
            }
            Err(e) => {
                stats.errors += 1;
                stats.failed_symbols.push(symbol.clone());
                tracing::warn!(symbol = %symbol, error = %e, "BVC 점검 실패");
                Err(e.to_string())
            }
        };
        symbol_probes.push(SymbolProbe { symbol, result });
    }

    stats.elapsed = start.elapsed();
    Ok(SourceProbe {
        official,
        offers,
        parallel_rate,
        symbols: symbol_probes,
        stats,
    })
}

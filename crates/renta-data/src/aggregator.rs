//! 환율 집계기.
//!
//! 공식 환율(BCV)과 병행 환율(P2P 호가)을 각각 한 번씩 조회합니다. 소스 실패는
//! 이 경계에서 로그를 남기고 `None`으로 낮춥니다.

use renta_core::OfficialRate;
use tracing::{error, info, warn};

use crate::provider::{
    volume_weighted_price, OfficialRateSource, ParallelRateSource, TOP_OFFERS,
};

/// 공식/병행 환율 집계기.
pub struct ExchangeRateAggregator {
    official: Box<dyn OfficialRateSource>,
    parallel: Box<dyn ParallelRateSource>,
}

impl ExchangeRateAggregator {
    pub fn new(
        official: Box<dyn OfficialRateSource>,
        parallel: Box<dyn ParallelRateSource>,
    ) -> Self {
        Self { official, parallel }
    }

    /// 공식 환율. 조회 실패 시 `None`.
    pub async fn fetch_official_rate(&self) -> Option<OfficialRate> {
        match self.official.fetch_official_rate().await {
            Ok(rate) if rate.rate.is_finite() && rate.rate > 0.0 => Some(rate),
            Ok(rate) => {
                warn!(feed = "bcv", rate = rate.rate, "공식 환율이 양수가 아님");
                None
            }
            Err(e) => {
                let err = e.into_pipeline("bcv");
                error!(feed = "bcv", error = %err, "공식 환율 조회 실패");
                None
            }
        }
    }

    /// 상위 5건 호가의 거래량 가중 평균. 조회 실패나 유효 호가 없음은 `None`.
    pub async fn fetch_parallel_rate(&self) -> Option<f64> {
        let offers = match self.parallel.fetch_offers().await {
            Ok(offers) => offers,
            Err(e) => {
                let err = e.into_pipeline("p2p");
                error!(feed = "p2p", error = %err, "P2P 호가 조회 실패");
                return None;
            }
        };

        let top = &offers[..offers.len().min(TOP_OFFERS)];
        match volume_weighted_price(top) {
            Some(rate) => {
                info!(feed = "p2p", rate, offers = top.len(), "병행 환율 계산 완료");
                Some(rate)
            }
            None => {
                warn!(feed = "p2p", offers = offers.len(), "유효한 P2P 호가 없음");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{P2pOffer, SourceError};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedOfficial(Option<f64>);

    #[async_trait]
    impl OfficialRateSource for FixedOfficial {
        async fn fetch_official_rate(&self) -> Result<OfficialRate, SourceError> {
            match self.0 {
                Some(rate) => Ok(OfficialRate {
                    date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                    rate,
                }),
                None => Err(SourceError::Status(503)),
            }
        }
    }

    struct FixedOffers(Option<Vec<P2pOffer>>);

    #[async_trait]
    impl ParallelRateSource for FixedOffers {
        async fn fetch_offers(&self) -> Result<Vec<P2pOffer>, SourceError> {
            self.0
                .clone()
                .ok_or_else(|| SourceError::Structure("data 없음".into()))
        }
    }

    fn offer(price: f64, volume: f64) -> P2pOffer {
        P2pOffer {
            price: Some(price),
            volume: Some(volume),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_parallel_rate_uses_first_five_offers() {
        let mut offers: Vec<P2pOffer> = (0..5).map(|_| offer(100.0, 1.0)).collect();
        offers.push(offer(1_000.0, 100.0));

        let aggregator = ExchangeRateAggregator::new(
            Box::new(FixedOfficial(Some(50.0))),
            Box::new(FixedOffers(Some(offers))),
        );

        assert_eq!(aggregator.fetch_parallel_rate().await, Some(100.0));
    }

    #[tokio::test]
    async fn test_failures_become_none() {
        let aggregator = ExchangeRateAggregator::new(
            Box::new(FixedOfficial(None)),
            Box::new(FixedOffers(None)),
        );

        assert!(aggregator.fetch_official_rate().await.is_none());
        assert!(aggregator.fetch_parallel_rate().await.is_none());
    }

    #[tokio::test]
    async fn test_non_positive_official_rate_is_none() {
        let aggregator = ExchangeRateAggregator::new(
            Box::new(FixedOfficial(Some(0.0))),
            Box::new(FixedOffers(Some(vec![]))),
        );

        assert!(aggregator.fetch_official_rate().await.is_none());
        assert!(aggregator.fetch_parallel_rate().await.is_none());
    }
}

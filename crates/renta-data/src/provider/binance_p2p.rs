//! Binance P2P 호가 클라이언트.
//!
//! USDT/VES 매수 광고 상위 20건을 조회합니다. 병행 환율은 업스트림 순서 기준
//! 상위 5건의 거래량 가중 평균 가격입니다.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{check_status, ParallelRateSource, SourceError};

/// P2P 광고 검색 엔드포인트.
pub const P2P_URL: &str = "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search";

/// 병행 환율 계산에 사용하는 상위 광고 수.
pub const TOP_OFFERS: usize = 5;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X) AppleWebKit/537.36 Chrome/124 Safari/537.36";

/// 검색 요청 본문.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    asset: &'static str,
    fiat: &'static str,
    trade_type: &'static str,
    page: u32,
    rows: u32,
    pay_types: Vec<String>,
    publisher_type: Option<String>,
    merchant_check: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            asset: "USDT",
            fiat: "VES",
            trade_type: "BUY",
            page: 1,
            rows: 20,
            pay_types: Vec::new(),
            publisher_type: None,
            merchant_check: false,
        }
    }
}

// ==================== 응답 DTO ====================

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<RawAdvItem>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAdvItem {
    #[serde(default)]
    adv: Option<RawAdv>,
    #[serde(default)]
    advertiser: Option<RawAdvertiser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdv {
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    surplus_amount: Option<Value>,
    #[serde(default)]
    tradable_quantity: Option<Value>,
    #[serde(default)]
    min_single_trans_amount: Option<Value>,
    #[serde(default)]
    max_single_trans_amount: Option<Value>,
    #[serde(default)]
    trade_methods: Option<Vec<RawTradeMethod>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdvertiser {
    #[serde(default)]
    nick_name: Option<String>,
    #[serde(default)]
    user_no: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTradeMethod {
    #[serde(default)]
    trade_method_name: Option<String>,
}

/// P2P 매수 광고.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct P2pOffer {
    /// 가격 (VES/USDT)
    pub price: Option<f64>,
    /// 거래 가능 수량 (USDT)
    pub volume: Option<f64>,
    /// 최소 거래 금액 (VES)
    pub min_amount: Option<f64>,
    /// 최대 거래 금액 (VES)
    pub max_amount: Option<f64>,
    /// 광고주 닉네임 (없으면 사용자 번호)
    pub merchant: Option<String>,
    /// 결제 수단 이름
    pub payment_methods: Vec<String>,
}

impl From<RawAdvItem> for P2pOffer {
    fn from(item: RawAdvItem) -> Self {
        let adv = item.adv.unwrap_or_default();
        let advertiser = item.advertiser.unwrap_or_default();

        let volume = number(adv.surplus_amount.as_ref())
            .or_else(|| number(adv.tradable_quantity.as_ref()));

        let merchant = non_empty(advertiser.nick_name).or_else(|| non_empty(advertiser.user_no));

        let payment_methods = adv
            .trade_methods
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| non_empty(m.trade_method_name))
            .collect();

        Self {
            price: number(adv.price.as_ref()),
            volume,
            min_amount: number(adv.min_single_trans_amount.as_ref()),
            max_amount: number(adv.max_single_trans_amount.as_ref()),
            merchant,
            payment_methods,
        }
    }
}

/// 문자열 또는 숫자 JSON 값을 `f64`로 변환합니다. 빈 문자열은 `None`.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// 호가 목록의 거래량 가중 평균 가격.
///
/// 가격과 거래량이 모두 유효한(유한한 양수) 항목의 `Σ(price × volume) / Σ(volume)`.
/// 그런 항목이 없으면 유효한 가격의 산술 평균으로 대체하고, 유효한 가격도
/// 없으면 `None`.
pub fn volume_weighted_price(offers: &[P2pOffer]) -> Option<f64> {
    let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);

    let weighted: Vec<(f64, f64)> = offers
        .iter()
        .filter_map(|o| Some((usable(o.price)?, usable(o.volume)?)))
        .collect();
    let total_volume: f64 = weighted.iter().map(|(_, v)| v).sum();

    if total_volume > 0.0 {
        let notional: f64 = weighted.iter().map(|(p, v)| p * v).sum();
        return Some(notional / total_volume);
    }

    let prices: Vec<f64> = offers.iter().filter_map(|o| usable(o.price)).collect();
    if prices.is_empty() {
        None
    } else {
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    }
}

/// Binance P2P 클라이언트.
pub struct BinanceP2pClient {
    client: Client,
    url: String,
}

impl BinanceP2pClient {
    /// 운영 URL과 기본 타임아웃(15초)으로 생성합니다.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_options(P2P_URL, Duration::from_secs(15))
    }

    pub fn with_options(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// 매수 광고를 업스트림 순서 그대로 조회합니다 (최대 20건).
    pub async fn search(&self) -> Result<Vec<P2pOffer>, SourceError> {
        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "es-VE,es;q=0.9,en;q=0.8")
            .header(ORIGIN, "https://p2p.binance.com")
            .header(REFERER, "https://p2p.binance.com/es")
            .json(&SearchRequest::default())
            .send()
            .await?;

        let text = check_status(response)?.text().await?;
        let body: SearchResponse =
            serde_json::from_str(&text).map_err(|e| SourceError::Structure(e.to_string()))?;
        let offers: Vec<P2pOffer> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(P2pOffer::from)
            .collect();

        debug!(count = offers.len(), "P2P 광고 조회 완료");
        Ok(offers)
    }

    /// 상위 5건 광고.
    pub async fn top_offers(&self) -> Result<Vec<P2pOffer>, SourceError> {
        let mut offers = self.search().await?;
        offers.truncate(TOP_OFFERS);
        Ok(offers)
    }

    /// 상위 5건 기준 평균 매수 가격.
    pub async fn average_buy_price(&self) -> Result<Option<f64>, SourceError> {
        let offers = self.top_offers().await?;
        let price = volume_weighted_price(&offers);
        if let Some(price) = price {
            info!(price, "P2P 평균 매수 가격 계산");
        }
        Ok(price)
    }
}

#[async_trait]
impl ParallelRateSource for BinanceP2pClient {
    async fn fetch_offers(&self) -> Result<Vec<P2pOffer>, SourceError> {
        self.search().await
    }
}

//! BVC 종목 히스토리 클라이언트.
//!
//! WordPress admin-ajax 엔드포인트에 `action=getHistoricoSimbolo`와 종목 코드를
//! 폼으로 보내면 `cur_hist_mov_emisora` 키 아래 히스토리 행이 돌아옵니다.
//! 행은 10개 컬럼의 위치 기반 배열(또는 같은 순서의 객체)이며, 단일 행이면
//! 배열이 아닌 객체 하나로 오기도 합니다.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::Client;
use renta_core::RawQuoteRow;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{check_status, QuoteSource, SourceError};

/// 히스토리 조회 엔드포인트.
pub const BVC_URL: &str = "https://www.bolsadecaracas.com/wp-admin/admin-ajax.php";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const HISTORY_REFERER: &str = "https://www.bolsadecaracas.com/historicos/";
const HISTORY_ACTION: &str = "getHistoricoSimbolo";

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    cur_hist_mov_emisora: Option<HistoryRows>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryRows {
    Many(Vec<Value>),
    One(Value),
}

impl HistoryRows {
    fn into_vec(self) -> Vec<Value> {
        match self {
            Self::Many(rows) => rows,
            Self::One(row) => vec![row],
        }
    }
}

/// 히스토리 응답 본문을 원시 행 목록으로 변환합니다.
///
/// 히스토리 키가 없거나 `null`이면 빈 목록입니다. 배열/객체가 아닌 행은
/// 건너뜁니다.
pub fn parse_history_payload(body: &str) -> Result<Vec<RawQuoteRow>, SourceError> {
    let payload: HistoryPayload =
        serde_json::from_str(body).map_err(|e| SourceError::Structure(e.to_string()))?;

    let rows = payload
        .cur_hist_mov_emisora
        .map(HistoryRows::into_vec)
        .unwrap_or_default();

    Ok(rows.into_iter().filter_map(raw_row).collect())
}

fn raw_row(value: Value) -> Option<RawQuoteRow> {
    let cells: Vec<Value> = match value {
        Value::Array(cells) => cells,
        // 객체는 키 순서대로 (serde_json preserve_order)
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => return None,
    };

    Some(RawQuoteRow::from_cells(cells.into_iter().map(cell_text)))
}

/// 셀 값을 지역화 숫자 문자열로 맞춥니다.
///
/// 문자열은 그대로 두고, JSON 숫자는 소수점을 `,`로 바꿔 정규화기가 같은
/// 값을 얻도록 합니다.
fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string().replace('.', ",")),
        _ => None,
    }
}

/// BVC 히스토리 클라이언트.
pub struct BvcClient {
    client: Client,
    url: String,
}

impl BvcClient {
    /// 운영 URL과 기본 타임아웃(15초)으로 생성합니다.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_options(BVC_URL, Duration::from_secs(15))
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

    /// 한 종목의 히스토리를 조회합니다.
    pub async fn fetch_history(&self, symbol: &str) -> Result<Vec<RawQuoteRow>, SourceError> {
        let response = self
            .client
            .post(&self.url)
            .header(REFERER, HISTORY_REFERER)
            .form(&[("action", HISTORY_ACTION), ("simbolo", symbol)])
            .send()
            .await?;

        let body = check_status(response)?.text().await?;
        let rows = parse_history_payload(&body)?;

        debug!(symbol, rows = rows.len(), "BVC 히스토리 조회 완료");
        Ok(rows)
    }
}

#[async_trait]
impl QuoteSource for BvcClient {
    async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<RawQuoteRow>, SourceError> {
        self.fetch_history(symbol).await
    }
}

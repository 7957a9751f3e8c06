//! BCV 공식 환율 스크래퍼.
//!
//! 환율 페이지의 `div.view-content` 안 첫 번째 테이블에서 첫 데이터 행을 읽습니다.
//! 첫 번째 셀이 게시일, 두 번째 셀이 Bs/USD 환율입니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use renta_core::{parse_locale_number, OfficialRate};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::{check_status, OfficialRateSource, SourceError};

/// 공식 환율 페이지.
pub const BCV_URL: &str = "https://www.bcv.org.ve/estadisticas/tasa-de-cambio";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 게시일 형식. 순서대로 시도합니다.
const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

/// BCV 환율 페이지 스크래퍼.
pub struct BcvRateFetcher {
    client: Client,
    url: String,
    /// 게시일 파싱 실패 시 "오늘"을 결정하는 시간대
    timezone: Tz,
}

impl BcvRateFetcher {
    /// 운영 URL과 기본 타임아웃(10초)으로 생성합니다.
    pub fn new(timezone: Tz) -> Result<Self, SourceError> {
        Self::with_options(BCV_URL, Duration::from_secs(10), timezone)
    }

    pub fn with_options(
        url: impl Into<String>,
        timeout: Duration,
        timezone: Tz,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            timezone,
        })
    }

    /// 환율 페이지를 한 번 조회해 공식 환율을 반환합니다.
    pub async fn fetch(&self) -> Result<OfficialRate, SourceError> {
        info!(url = %self.url, "BCV 공식 환율 조회 시작");

        let response = check_status(self.client.get(&self.url).send().await?)?;
        let html = response.text().await?;

        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        let rate = parse_rate_page(&html, today)?;

        info!(rate = rate.rate, date = %rate.date, "BCV 공식 환율 조회 완료");
        Ok(rate)
    }
}

#[async_trait]
impl OfficialRateSource for BcvRateFetcher {
    async fn fetch_official_rate(&self) -> Result<OfficialRate, SourceError> {
        self.fetch().await
    }
}

/// 환율 페이지 HTML에서 첫 데이터 행을 파싱합니다.
///
/// 게시일을 인식하지 못하면 `today`를 사용합니다. 환율 셀이 숫자가 아니면
/// `SourceError::Number`.
pub fn parse_rate_page(html: &str, today: NaiveDate) -> Result<OfficialRate, SourceError> {
    let document = Html::parse_document(html);

    let wrapper = select_first(document.root_element(), "div.view-content")
        .ok_or_else(|| SourceError::Structure("view-content 컨테이너 없음".into()))?;
    let table = select_first(wrapper, "table")
        .ok_or_else(|| SourceError::Structure("환율 테이블 없음".into()))?;
    let row = select_first(table, "tbody tr")
        .ok_or_else(|| SourceError::Structure("데이터 행 없음".into()))?;

    let td = Selector::parse("td").map_err(|e| SourceError::Structure(format!("{:?}", e)))?;
    let cells: Vec<String> = row
        .select(&td)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect();

    if cells.len() < 2 {
        return Err(SourceError::Structure(format!(
            "셀 수 부족: {}",
            cells.len()
        )));
    }

    let date = parse_rate_date(&cells[0]).unwrap_or_else(|| {
        debug!(raw = %cells[0], "인식할 수 없는 게시일, 오늘 날짜 사용");
        today
    });

    let rate = parse_locale_number(&cells[1]);
    if !rate.is_finite() {
        return Err(SourceError::Number(cells[1].clone()));
    }

    Ok(OfficialRate { date, rate })
}

/// 게시일 문자열을 `DATE_FORMATS` 순서대로 파싱합니다.
fn parse_rate_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

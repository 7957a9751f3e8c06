//! 종목 시세 타입.
//!
//! 수집 단계별로 세 가지 형태가 있습니다:
//! - `RawQuoteRow`: 업스트림 응답의 위치 기반 문자열 셀
//! - `QuoteRow`: 숫자 정규화가 끝난 행 (결측값은 `NaN`)
//! - `EquityQuote`: 최신 거래일로 필터링되고 USD로 환산된 저장용 레코드

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// BVC 히스토리 응답의 고정 컬럼 순서.
pub const QUOTE_COLUMNS: [&str; 10] = [
    "FECHA",
    "PRECIO_APERT",
    "PRECIO_CIE",
    "VAR_ABS",
    "VAR_REL",
    "PRECIO_MAX",
    "PRECIO_MIN",
    "N_OPERACIONES",
    "TITULOS_NEGOCIADOS",
    "MONTO_EFECTIVO",
];

/// 정규화 전 원시 행.
///
/// 업스트림이 10개보다 적은 컬럼을 보내면 뒤쪽 필드는 `None`으로 남습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuoteRow {
    pub date: Option<String>,
    pub open_price: Option<String>,
    pub close_price: Option<String>,
    pub var_abs: Option<String>,
    pub var_rel: Option<String>,
    pub max_price: Option<String>,
    pub min_price: Option<String>,
    pub num_operations: Option<String>,
    pub titles_traded: Option<String>,
    pub amount_traded: Option<String>,
    /// 업스트림이 실제로 보낸 컬럼 수
    pub column_count: usize,
}

impl RawQuoteRow {
    /// 위치 기반 셀 목록을 스키마에 매핑합니다.
    ///
    /// 10번째 이후 셀은 무시합니다.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut row = Self::default();
        for (idx, cell) in cells.into_iter().take(QUOTE_COLUMNS.len()).enumerate() {
            row.column_count = idx + 1;
            let slot = match idx {
                0 => &mut row.date,
                1 => &mut row.open_price,
                2 => &mut row.close_price,
                3 => &mut row.var_abs,
                4 => &mut row.var_rel,
                5 => &mut row.max_price,
                6 => &mut row.min_price,
                7 => &mut row.num_operations,
                8 => &mut row.titles_traded,
                _ => &mut row.amount_traded,
            };
            *slot = cell;
        }
        row
    }

    /// 스키마보다 컬럼이 적은 행인지 확인합니다.
    pub fn is_short(&self) -> bool {
        self.column_count < QUOTE_COLUMNS.len()
    }
}

/// 보정 가능한 숫자 컬럼.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    OpenPrice,
    ClosePrice,
    TitlesTraded,
}

/// 숫자 정규화가 끝난 행.
///
/// 결측/파싱 실패 값은 `f64::NAN`입니다. `date`가 `None`인 행은
/// 최신 거래일 선택에서 제외됩니다.
#[derive(Debug, Clone)]
pub struct QuoteRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub open_price: f64,
    pub close_price: f64,
    pub var_abs: f64,
    pub var_rel: f64,
    pub max_price: f64,
    pub min_price: f64,
    pub num_operations: f64,
    pub titles_traded: f64,
    pub amount_traded: f64,
}

impl QuoteRow {
    /// 모든 숫자 필드가 `NaN`인 빈 행.
    pub fn empty(symbol: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open_price: f64::NAN,
            close_price: f64::NAN,
            var_abs: f64::NAN,
            var_rel: f64::NAN,
            max_price: f64::NAN,
            min_price: f64::NAN,
            num_operations: f64::NAN,
            titles_traded: f64::NAN,
            amount_traded: f64::NAN,
        }
    }

    /// 보정 대상 필드의 가변 참조.
    pub fn field_mut(&mut self, field: QuoteField) -> &mut f64 {
        match field {
            QuoteField::OpenPrice => &mut self.open_price,
            QuoteField::ClosePrice => &mut self.close_price,
            QuoteField::TitlesTraded => &mut self.titles_traded,
        }
    }
}

/// USD로 환산된 저장용 종목 시세.
///
/// (symbol, date)당 한 행이며, 한 배치의 모든 행은 같은 거래일을 가집니다.
/// 시가총액 필드는 발행주식수가 알려진 경우에만 채워집니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityQuote {
    /// 종목 코드
    pub symbol: String,
    /// 거래일
    pub date: NaiveDate,
    /// 종가 (Bs)
    pub close_price_local: Option<f64>,
    /// 종가 (USD, 공식 환율)
    pub close_usd_official: Option<f64>,
    /// 종가 (USD, 병행 환율)
    pub close_usd_parallel: Option<f64>,
    /// 거래대금 (USD, 공식 환율)
    pub amount_traded_usd_official: Option<f64>,
    /// 거래대금 (USD, 병행 환율)
    pub amount_traded_usd_parallel: Option<f64>,
    /// 체결 건수
    pub num_operations: i64,
    /// 거래 주식수
    pub titles_traded: i64,
    /// 시가총액 (USD, 공식 환율)
    pub market_cap_official: Option<f64>,
    /// 시가총액 (USD, 병행 환율)
    pub market_cap_parallel: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_raw_row_full_schema() {
        let row = RawQuoteRow::from_cells(cells(&[
            "14-03-25", "10,00", "11,50", "1,50", "15,00", "12,00", "9,80", "42", "1.000", "11.500,00",
        ]));
        assert_eq!(row.date.as_deref(), Some("14-03-25"));
        assert_eq!(row.close_price.as_deref(), Some("11,50"));
        assert_eq!(row.amount_traded.as_deref(), Some("11.500,00"));
        assert_eq!(row.column_count, 10);
        assert!(!row.is_short());
    }

    #[test]
    fn test_raw_row_short_schema() {
        let row = RawQuoteRow::from_cells(cells(&["14-03-25", "10,00", "11,50"]));
        assert_eq!(row.close_price.as_deref(), Some("11,50"));
        assert!(row.var_abs.is_none());
        assert!(row.amount_traded.is_none());
        assert!(row.is_short());
    }

    #[test]
    fn test_raw_row_ignores_extra_cells() {
        let mut values = vec!["x"; 12];
        values[0] = "14-03-25";
        let row = RawQuoteRow::from_cells(cells(&values));
        assert_eq!(row.column_count, 10);
    }

    #[test]
    fn test_equity_quote_serializes_null_caps() {
        let quote = EquityQuote {
            symbol: "BNC".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            close_price_local: Some(100.0),
            close_usd_official: Some(2.0),
            close_usd_parallel: Some(1.25),
            amount_traded_usd_official: None,
            amount_traded_usd_parallel: None,
            num_operations: 3,
            titles_traded: 10,
            market_cap_official: None,
            market_cap_parallel: None,
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["date"], "2025-03-14");
        assert!(json["market_cap_official"].is_null());

        let back: EquityQuote = serde_json::from_value(json).unwrap();
        assert_eq!(back, quote);
    }
}

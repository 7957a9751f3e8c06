//! 원시 행 정규화와 배치 변환 단계.

use chrono::NaiveDate;
use renta_core::{
    finite, parse_locale_number_opt, EquityQuote, ExchangeRatePair, QuoteRow, RawQuoteRow,
    CORPORATE_ADJUSTMENTS,
};

/// BVC 히스토리 일자 형식 (`14-03-25`).
pub const QUOTE_DATE_FORMAT: &str = "%d-%m-%y";

/// 원시 행 하나를 정규화합니다.
///
/// 모든 숫자 컬럼은 지역화 숫자 정규화를 거치며, 없거나 파싱할 수 없는 값은
/// `NaN`이 됩니다. 일자를 파싱할 수 없으면 `date`는 `None`입니다.
pub fn normalize_row(symbol: &str, raw: &RawQuoteRow) -> QuoteRow {
    let date = raw
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), QUOTE_DATE_FORMAT).ok());

    QuoteRow {
        symbol: symbol.to_string(),
        date,
        open_price: parse_locale_number_opt(raw.open_price.as_deref()),
        close_price: parse_locale_number_opt(raw.close_price.as_deref()),
        var_abs: parse_locale_number_opt(raw.var_abs.as_deref()),
        var_rel: parse_locale_number_opt(raw.var_rel.as_deref()),
        max_price: parse_locale_number_opt(raw.max_price.as_deref()),
        min_price: parse_locale_number_opt(raw.min_price.as_deref()),
        num_operations: parse_locale_number_opt(raw.num_operations.as_deref()),
        titles_traded: parse_locale_number_opt(raw.titles_traded.as_deref()),
        amount_traded: parse_locale_number_opt(raw.amount_traded.as_deref()),
    }
}

/// 한 종목 응답의 모든 행을 정규화합니다.
pub fn normalize_payload(symbol: &str, rows: &[RawQuoteRow]) -> Vec<QuoteRow> {
    rows.iter().map(|raw| normalize_row(symbol, raw)).collect()
}

/// 전체 배치에서 가장 최근 거래일.
pub fn latest_trading_date(rows: &[QuoteRow]) -> Option<NaiveDate> {
    rows.iter().filter_map(|r| r.date).max()
}

/// 가장 최근 거래일의 행만 남깁니다.
///
/// 일자가 없는 행은 항상 제외됩니다. 결과에 다시 적용해도 같은 결과가 나옵니다.
pub fn select_most_recent(rows: Vec<QuoteRow>) -> Vec<QuoteRow> {
    let Some(latest) = latest_trading_date(&rows) else {
        return Vec::new();
    };

    rows.into_iter()
        .filter(|r| r.date == Some(latest))
        .collect()
}

/// 기업 행위 보정 테이블을 적용하고 보정된 행 수를 반환합니다.
pub fn apply_corporate_adjustments(rows: &mut [QuoteRow]) -> usize {
    let mut adjusted = 0;
    for row in rows.iter_mut() {
        let mut touched = false;
        for rule in CORPORATE_ADJUSTMENTS {
            touched |= rule.apply(row);
        }
        if touched {
            adjusted += 1;
        }
    }
    adjusted
}

/// 정규화된 행을 USD 환산 시세로 변환합니다.
///
/// 시가총액은 비워 둡니다. 일자가 없는 행은 건너뜁니다.
pub fn convert_to_usd(rows: Vec<QuoteRow>, pair: &ExchangeRatePair) -> Vec<EquityQuote> {
    rows.into_iter()
        .filter_map(|row| {
            let date = row.date?;
            Some(EquityQuote {
                symbol: row.symbol,
                date,
                close_price_local: finite(row.close_price),
                close_usd_official: finite(pair.to_usd_official(row.close_price)),
                close_usd_parallel: finite(pair.to_usd_parallel(row.close_price)),
                amount_traded_usd_official: finite(pair.to_usd_official(row.amount_traded)),
                amount_traded_usd_parallel: finite(pair.to_usd_parallel(row.amount_traded)),
                num_operations: count(row.num_operations),
                titles_traded: count(row.titles_traded),
                market_cap_official: None,
                market_cap_parallel: None,
            })
        })
        .collect()
}

/// 건수 컬럼: 소수점 이하 버림, 결측은 0.
fn count(value: f64) -> i64 {
    if value.is_finite() {
        (value.trunc() as i64).max(0)
    } else {
        0
    }
}

//! 지역화된 숫자 문자열 정규화.
//!
//! BVC와 BCV는 천 단위 구분자로 `.`, 소수점으로 `,`를 사용합니다
//! (예: `"1.234,56"`). 이 모듈은 이런 토큰을 `f64`로 변환합니다.

/// 지역화된 숫자 문자열을 `f64`로 변환합니다.
///
/// 천 단위 구분자(`.`)를 제거하고 소수점(`,`)을 `.`으로 바꾼 뒤 파싱합니다.
/// 빈 문자열이나 파싱할 수 없는 토큰은 에러 대신 `f64::NAN`을 반환하므로
/// 호출자는 결과를 "데이터 없음"으로 취급해야 합니다.
///
/// # 예제
///
/// ```
/// use renta_core::parse_locale_number;
///
/// assert_eq!(parse_locale_number("1.234,56"), 1234.56);
/// assert!(parse_locale_number("").is_nan());
/// ```
pub fn parse_locale_number(token: &str) -> f64 {
    let token = token.trim();
    if token.is_empty() {
        return f64::NAN;
    }

    let cleaned = token.replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Option<&str>` 버전. 값이 없으면 `NaN`.
pub fn parse_locale_number_opt(token: Option<&str>) -> f64 {
    token.map_or(f64::NAN, parse_locale_number)
}

/// 유한한 값만 `Some`으로 변환합니다.
///
/// 정규화된 행의 `NaN` 센티널을 저장용 `Option`으로 바꿀 때 사용합니다.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

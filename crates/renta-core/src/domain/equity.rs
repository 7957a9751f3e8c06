//! 종목 기준 정보.

use serde::{Deserialize, Serialize};

/// BVC 상장 종목.
///
/// 외부 저장소가 소유하며, 파이프라인은 시가총액 계산을 위해 읽기만 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equity {
    /// 종목 코드 (고유 키, 예: "BNC")
    pub code: String,
    /// 종목명
    pub name: String,
    /// 발행주식수
    pub shares_outstanding: Option<i64>,
    /// 활성 여부
    pub active: bool,
}

impl Equity {
    /// 활성 종목을 생성합니다.
    pub fn new(code: impl Into<String>, name: impl Into<String>, shares: Option<i64>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            shares_outstanding: shares,
            active: true,
        }
    }

    /// 시가총액 계산에 사용할 수 있는 발행주식수.
    ///
    /// 값이 없거나 0이면 `None`.
    pub fn usable_shares(&self) -> Option<i64> {
        self.shares_outstanding.filter(|&shares| shares != 0)
    }
}

//! 기업 행위 보정 규칙.
//!
//! 과거 액면 변경(BNC)과 재평가(BPV)로 인해 업스트림 히스토리에 남아 있는
//! 불연속을 종목 + 일자 조건으로 정확히 보정합니다. 규칙은 고정 테이블이며
//! 저장되지 않습니다.

use chrono::{Datelike, NaiveDate};

use super::quote::{QuoteField, QuoteRow};

/// 보정 연산.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentOp {
    Multiply,
    Divide,
}

/// 보정 대상 일자 조건. 일자는 `(연, 월, 일)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// 나열된 일자 중 하나
    OneOf(&'static [(i32, u32, u32)]),
    /// 기준일 이전 (기준일 미포함)
    Before((i32, u32, u32)),
}

impl DateRule {
    /// 일자가 조건에 맞는지 확인합니다.
    pub fn matches(&self, date: NaiveDate) -> bool {
        let ymd = (date.year(), date.month(), date.day());
        match self {
            Self::OneOf(dates) => dates.contains(&ymd),
            Self::Before(cutoff) => ymd < *cutoff,
        }
    }
}

/// 단일 필드에 대한 선언적 보정.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorporateAdjustment {
    pub symbol: &'static str,
    pub dates: DateRule,
    pub field: QuoteField,
    pub op: AdjustmentOp,
    pub factor: f64,
}

/// BNC 액면 변경이 반영되지 않은 거래일.
const BNC_REDENOMINATION_DATES: &[(i32, u32, u32)] = &[
    (2024, 12, 30),
    (2025, 1, 2),
    (2025, 1, 3),
    (2025, 1, 7),
    (2025, 1, 8),
];

/// BPV 재평가 기준일.
const BPV_RESTATEMENT_CUTOFF: (i32, u32, u32) = (2025, 2, 3);

/// BPV 재평가 계수.
pub const BPV_RESTATEMENT_FACTOR: f64 = 0.63423423;

/// 적용 순서대로 나열된 보정 테이블.
pub const CORPORATE_ADJUSTMENTS: &[CorporateAdjustment] = &[
    CorporateAdjustment {
        symbol: "BNC",
        dates: DateRule::OneOf(BNC_REDENOMINATION_DATES),
        field: QuoteField::OpenPrice,
        op: AdjustmentOp::Multiply,
        factor: 1000.0,
    },
    CorporateAdjustment {
        symbol: "BNC",
        dates: DateRule::OneOf(BNC_REDENOMINATION_DATES),
        field: QuoteField::ClosePrice,
        op: AdjustmentOp::Multiply,
        factor: 1000.0,
    },
    CorporateAdjustment {
        symbol: "BNC",
        dates: DateRule::OneOf(BNC_REDENOMINATION_DATES),
        field: QuoteField::TitlesTraded,
        op: AdjustmentOp::Divide,
        factor: 1000.0,
    },
    CorporateAdjustment {
        symbol: "BPV",
        dates: DateRule::Before(BPV_RESTATEMENT_CUTOFF),
        field: QuoteField::ClosePrice,
        op: AdjustmentOp::Multiply,
        factor: BPV_RESTATEMENT_FACTOR,
    },
];

impl CorporateAdjustment {
    /// 행이 이 규칙의 대상인지 확인합니다. 일자가 없는 행은 대상이 아닙니다.
    pub fn applies_to(&self, row: &QuoteRow) -> bool {
        row.symbol == self.symbol && row.date.is_some_and(|d| self.dates.matches(d))
    }

    /// 대상 행이면 보정을 적용하고 `true`를 반환합니다.
    pub fn apply(&self, row: &mut QuoteRow) -> bool {
        if !self.applies_to(row) {
            return false;
        }

        let value = row.field_mut(self.field);
        *value = match self.op {
            AdjustmentOp::Multiply => *value * self.factor,
            AdjustmentOp::Divide => *value / self.factor,
        };
        true
    }
}

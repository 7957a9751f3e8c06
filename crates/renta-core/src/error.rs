//! 파이프라인 에러 분류.
//!
//! 수집 파이프라인의 모든 실패는 다섯 가지 종류 중 하나로 분류됩니다.
//! `SourceUnavailable`과 `MalformedPayload`는 조회 경계에서 항목 단위의
//! 부재로 낮춰지고, `DependencyMissing`만 작업 전체를 중단시킵니다.

use thiserror::Error;

/// 수집 파이프라인 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// 네트워크 오류, 타임아웃, 2xx 이외 응답
    #[error("소스 사용 불가 ({feed}): {reason}")]
    SourceUnavailable { feed: String, reason: String },

    /// 응답 구조 또는 숫자 파싱 실패
    #[error("잘못된 응답 ({feed}): {reason}")]
    MalformedPayload { feed: String, reason: String },

    /// 일부 종목만 수집됨
    #[error("부분 수집: 성공 {succeeded}, 실패 {failed}")]
    PartialBatch { succeeded: usize, failed: usize },

    /// 사용 가능한 환율 쌍 없이 시세 작업이 호출됨
    #[error("선행 조건 누락: {0}")]
    DependencyMissing(String),

    /// 개별 행 저장 실패
    #[error("저장 실패 ({table}): {reason}")]
    PersistenceFailure { table: String, reason: String },
}

/// 파이프라인 작업을 위한 Result 타입.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// 외부 소스 조회 실패인지 확인합니다.
    ///
    /// 이 종류는 조회 경계에서 부재 신호로 변환되어야 합니다.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::MalformedPayload { .. }
        )
    }

    /// 작업 전체를 중단시키는 에러인지 확인합니다.
    pub fn aborts_job(&self) -> bool {
        matches!(self, Self::DependencyMissing(_))
    }

    /// 소스 사용 불가 에러를 생성합니다.
    pub fn unavailable(feed: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            feed: feed.into(),
            reason: reason.to_string(),
        }
    }

    /// 잘못된 응답 에러를 생성합니다.
    pub fn malformed(feed: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            feed: feed.into(),
            reason: reason.to_string(),
        }
    }

    /// 저장 실패 에러를 생성합니다.
    pub fn persistence(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::PersistenceFailure {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(PipelineError::unavailable("bcv", "timeout").is_source_failure());
        assert!(PipelineError::malformed("p2p", "missing data").is_source_failure());
        assert!(!PipelineError::DependencyMissing("official".into()).is_source_failure());

        assert!(PipelineError::DependencyMissing("official".into()).aborts_job());
        assert!(!PipelineError::PartialBatch { succeeded: 1, failed: 1 }.aborts_job());
        assert!(!PipelineError::persistence("equity_quotes", "dup").aborts_job());
    }

    #[test]
    fn test_display() {
        let err = PipelineError::unavailable("bcv", "timeout");
        assert_eq!(err.to_string(), "소스 사용 불가 (bcv): timeout");

        let err = PipelineError::PartialBatch { succeeded: 1, failed: 2 };
        assert_eq!(err.to_string(), "부분 수집: 성공 1, 실패 2");
    }
}

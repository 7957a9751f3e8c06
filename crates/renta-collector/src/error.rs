//! 에러 타입 정의.

use std::fmt;

use renta_core::PipelineError;
use renta_data::{DataError, SourceError};

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 저장소 에러
    Data(DataError),
    /// 설정 에러
    Config(String),
    /// 데이터 소스 클라이언트 에러
    Source(SourceError),
    /// 파이프라인 작업 에러
    Pipeline(PipelineError),
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Source(e) => write!(f, "Data source error: {}", e),
            Self::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<SourceError> for CollectorError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

impl From<PipelineError> for CollectorError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;

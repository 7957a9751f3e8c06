//! # Renta Core
//!
//! 카라카스 증권거래소(BVC) 시세 수집 파이프라인의 핵심 도메인 모델을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 환율 쌍 (공식 환율 / 병행 환율)
//! - 종목 시세 및 정규화 전 원시 행
//! - 기업 행위(액면 변경, 재평가) 보정 테이블
//! - 지역화된 숫자 문자열 정규화
//! - 시가총액 계산 및 시장 요약
//! - 파이프라인 에러 분류
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;
pub mod valuation;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
pub use valuation::*;

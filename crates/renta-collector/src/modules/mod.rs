//! CLI 보조 명령 모듈.

pub mod probe;
pub mod seed;
pub mod summary;

pub use probe::{check_sources, SourceProbe, SymbolProbe};
pub use seed::seed_equities;
pub use summary::{last_update_marker, market_summary};

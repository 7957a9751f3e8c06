//! 기준 종목 등록.

use std::time::Instant;

use renta_core::Equity;
use renta_data::MarketStore;

use crate::{CollectionStats, Result};

/// 종목 목록을 등록합니다.
///
/// 이미 등록된 코드는 `skipped`로 집계하고 계속 진행합니다.
pub async fn seed_equities<S>(store: &S, equities: &[Equity]) -> Result<CollectionStats>
where
    S: MarketStore + ?Sized,
{
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(count = equities.len(), "종목 등록 시작");

    for equity in equities {
        stats.total += 1;
        match store.insert_equity(equity).await {
            Ok(()) => {
                stats.success += 1;
                tracing::debug!(code = %equity.code, "종목 등록");
            }
            Err(e) if e.is_duplicate() => {
                stats.skipped += 1;
                tracing::info!(code = %equity.code, "이미 등록된 종목");
            }
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(code = %equity.code, error = %e, "종목 등록 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renta_data::{reference_equities, MemoryStore};

    #[tokio::test]
    async fn test_seed_twice_skips_existing() {
        let store = MemoryStore::new();
        let equities = reference_equities();

        let first = seed_equities(&store, &equities).await.unwrap();
        assert_eq!(first.success, 8);
        assert_eq!(first.skipped, 0);

        let second = seed_equities(&store, &equities).await.unwrap();
        assert_eq!(second.success, 0);
        assert_eq!(second.skipped, 8);
        assert_eq!(second.errors, 0);

        assert_eq!(store.list_equities(false).await.unwrap().len(), 8);
    }
}

//! Per-region fan-out: one task per region, every region gets an outcome.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::domain::{Region, RegionFailure};
use crate::ports::StoreError;

/// Run `op` once per region, concurrently, and wait for all of them.
///
/// A failing region never cancels its siblings. Outcomes come back in the
/// order the regions were given, regardless of completion order.
pub(crate) async fn per_region<T, F, Fut>(
    regions: impl IntoIterator<Item = Region>,
    op: F,
) -> Vec<(Region, Result<T, StoreError>)>
where
    F: Fn(Region) -> Fut,
    Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<(Region, JoinHandle<Result<T, StoreError>>)> = regions
        .into_iter()
        .map(|region| {
            let task = tokio::spawn(op(region.clone()));
            (region, task)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (region, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::Unavailable(format!(
                "task for region {region} did not finish: {e}"
            ))),
        };
        outcomes.push((region, result));
    }
    outcomes
}

/// Split outcomes into successes and failures.
pub(crate) fn partition<T>(
    outcomes: Vec<(Region, Result<T, StoreError>)>,
) -> (Vec<(Region, T)>, Vec<RegionFailure>) {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for (region, result) in outcomes {
        match result {
            Ok(value) => succeeded.push((region, value)),
            Err(cause) => failed.push(RegionFailure { region, cause }),
        }
    }
    (succeeded, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn regions(names: &[&str]) -> Vec<Region> {
        names.iter().map(|r| Region::parse(r).unwrap()).collect()
    }

    #[tokio::test]
    async fn waits_for_slow_regions_after_a_fast_failure() {
        let outcomes = per_region(regions(&["fast-fail", "slow-ok"]), |region| async move {
            if region.as_str() == "fast-fail" {
                Err(StoreError::Unavailable("down".to_string()))
            } else {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(region.to_string())
            }
        })
        .await;

        let (ok, failed) = partition(outcomes);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].1, "slow-ok");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].region.as_str(), "fast-fail");
    }

    #[tokio::test]
    async fn regions_run_concurrently() {
        let names = ["r1", "r2", "r3", "r4", "r5"];
        let started = tokio::time::Instant::now();
        let outcomes = per_region(regions(&names), |region| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, StoreError>(region.to_string())
        })
        .await;
        let elapsed = started.elapsed();

        let (ok, failed) = partition(outcomes);
        assert_eq!(ok.len(), names.len());
        assert!(failed.is_empty());
        // 逐次なら 500ms 以上かかる
        assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn outcomes_keep_input_order() {
        let outcomes = per_region(regions(&["r1", "r2", "r3"]), |region| async move {
            // 後のリージョンほど早く終わる
            let delay = match region.as_str() {
                "r1" => 60,
                "r2" => 30,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, StoreError>(())
        })
        .await;

        let order: Vec<_> = outcomes.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(order, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn panicking_region_becomes_a_failure() {
        let outcomes = per_region(regions(&["r1", "r2"]), |region| async move {
            if region.as_str() == "r2" {
                panic!("boom");
            }
            Ok::<_, StoreError>(())
        })
        .await;

        let (ok, failed) = partition(outcomes);
        assert_eq!(ok.len(), 1);
        assert_eq!(failed[0].region.as_str(), "r2");
    }
}

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Drives source-run futures with bounded concurrency. Jobs resolving to
/// `None` (skipped after a shutdown request) are dropped from the output.
pub async fn run_bounded<T, Fut>(max_workers: usize, jobs: Vec<Fut>) -> Vec<T>
where
    Fut: Future<Output = Option<T>>,
{
    stream::iter(jobs)
        .buffer_unordered(max_workers.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_all_jobs_and_drops_skipped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<_> = (0..8)
            .map(|i| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i % 2 == 0 { Some(i) } else { None }
                }
            })
            .collect();

        let mut out = run_bounded(3, jobs).await;
        out.sort_unstable();

        assert_eq!(out, vec![0, 2, 4, 6]);
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}

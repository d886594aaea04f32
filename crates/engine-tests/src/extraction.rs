#[cfg(test)]
mod tests {
    use crate::utils::{
        AlwaysFailExecutor, FlakyExecutor, TableExecutor, fast_retry, order_row, source_config, ts,
    };
    use chrono::{Duration, Utc};
    use connectors::executor::QueryExecutor;
    use engine_core::checkpoint::CheckpointStore;
    use engine_core::checkpoint::json_store::JsonCheckpointStore;
    use engine_processing::error::ExtractError;
    use engine_processing::extract::engine::{ExtractionEngine, WindowResolution};
    use model::core::identifiers::{RunId, SourceId};
    use model::extraction::mode::ExtractionMode;
    use model::extraction::window::ExtractionWindow;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn store(dir: &TempDir) -> Arc<JsonCheckpointStore> {
        Arc::new(JsonCheckpointStore::new(dir.path().join("checkpoints.json")).unwrap())
    }

    fn engine(
        executor: impl QueryExecutor + 'static,
        store: Arc<JsonCheckpointStore>,
        batch_size: usize,
        lookback: Option<i64>,
    ) -> ExtractionEngine {
        ExtractionEngine::new(Arc::new(executor), store, batch_size, lookback)
    }

    fn five_orders() -> Vec<model::records::row::RowData> {
        (1..=5)
            .map(|id| order_row(id, Some(100 + id), ts(2025, 3, id as u32)))
            .collect()
    }

    #[tokio::test]
    async fn paginates_until_short_batch() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = engine(executor, store(&dir), 2, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Full)
            .await
            .unwrap();

        assert_eq!(dataset.row_count(), 5);
        assert_eq!(dataset.metadata.batch_count, 3);
        assert!(dataset.window.is_none());
        // Ordering is preserved across batch boundaries.
        let ids: Vec<_> = dataset
            .rows
            .iter()
            .map(|r| r.get_value("id").as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_extra_empty_batch() {
        let dir = tempdir().unwrap();
        let rows = five_orders()[..4].to_vec();
        let executor = TableExecutor::new().with_table("orders", rows);
        let engine = engine(executor, store(&dir), 2, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Full)
            .await
            .unwrap();

        assert_eq!(dataset.row_count(), 4);
        assert_eq!(dataset.metadata.batch_count, 3);
    }

    #[tokio::test]
    async fn rows_are_stamped_with_the_source_name() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = engine(executor, store(&dir), 100, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Full)
            .await
            .unwrap();

        assert!(dataset.rows.iter().all(|row| row.entity == "orders"));
    }

    #[tokio::test]
    async fn full_runs_render_the_unwindowed_query() {
        let dir = tempdir().unwrap();
        let executor = Arc::new(TableExecutor::new().with_table("orders", five_orders()));
        let engine = ExtractionEngine::new(Arc::clone(&executor) as _, store(&dir), 100, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Full)
            .await
            .unwrap();

        assert_eq!(dataset.row_count(), 5);
        // Every query reaching the source is fully substituted SQL.
        let queries = executor.queries();
        assert!(!queries.is_empty());
        assert!(queries.iter().all(|q| !q.contains('{')));
        assert!(queries[0].contains("LIMIT 100 OFFSET 0"));
    }

    #[tokio::test]
    async fn unbounded_run_without_a_full_query_is_rejected() {
        let dir = tempdir().unwrap();
        let executor = Arc::new(TableExecutor::new().with_table("orders", five_orders()));
        let engine = ExtractionEngine::new(Arc::clone(&executor) as _, store(&dir), 100, None);

        let mut config = source_config("orders");
        config.full_query = None;

        let result = engine.extract(&config, &ExtractionMode::Full).await;

        assert!(matches!(result, Err(ExtractError::MissingFullQuery { .. })));
        // The malformed query never reaches the source.
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn custom_window_filters_rows() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = engine(executor, store(&dir), 100, None);

        let window = ExtractionWindow::new(ts(2025, 3, 2), ts(2025, 3, 4)).unwrap();
        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Custom(window))
            .await
            .unwrap();

        // Half-open window: rows dated the 2nd and 3rd, not the 4th.
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.window, Some(window));
    }

    #[tokio::test]
    async fn adjacent_windows_partition_the_rows() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = engine(executor, store(&dir), 2, None);
        let config = source_config("orders");

        let whole = ExtractionWindow::new(ts(2025, 3, 1), ts(2025, 3, 6)).unwrap();
        let first = ExtractionWindow::new(ts(2025, 3, 1), ts(2025, 3, 4)).unwrap();
        let second = ExtractionWindow::new(ts(2025, 3, 4), ts(2025, 3, 6)).unwrap();

        let all = engine
            .extract(&config, &ExtractionMode::Custom(whole))
            .await
            .unwrap();
        let head = engine
            .extract(&config, &ExtractionMode::Custom(first))
            .await
            .unwrap();
        let tail = engine
            .extract(&config, &ExtractionMode::Custom(second))
            .await
            .unwrap();

        // Half-open adjacent windows cover each row exactly once.
        let ids = |d: &model::records::dataset::Dataset| -> Vec<i64> {
            d.rows
                .iter()
                .map(|r| r.get_value("id").as_i64().unwrap())
                .collect()
        };
        let mut split = ids(&head);
        split.extend(ids(&tail));
        assert_eq!(split, ids(&all));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_budget() {
        let dir = tempdir().unwrap();
        let inner = TableExecutor::new().with_table("orders", five_orders());
        let executor = FlakyExecutor::new(inner, 2);
        let engine = engine(executor, store(&dir), 100, None);

        let mut config = source_config("orders");
        config.retry = fast_retry(3);

        let dataset = engine.extract(&config, &ExtractionMode::Full).await.unwrap();

        assert_eq!(dataset.row_count(), 5);
        assert_eq!(dataset.metadata.retries, 2);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_fails_the_extraction() {
        let dir = tempdir().unwrap();
        let executor = AlwaysFailExecutor::new(true);
        let engine = engine(executor, store(&dir), 100, None);

        let mut config = source_config("orders");
        config.retry = fast_retry(3);

        let result = engine.extract(&config, &ExtractionMode::Full).await;
        match result {
            Err(ExtractError::ExtractionFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn permanent_error_aborts_after_one_attempt() {
        let dir = tempdir().unwrap();
        let executor = Arc::new(AlwaysFailExecutor::new(false));
        let engine = ExtractionEngine::new(Arc::clone(&executor) as _, store(&dir), 100, None);

        let result = engine
            .extract(&source_config("orders"), &ExtractionMode::Full)
            .await;

        assert!(matches!(result, Err(ExtractError::Query { .. })));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn incremental_window_starts_at_the_watermark() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        let source = SourceId::from("orders");
        store
            .commit(&source, ts(2025, 3, 3), &RunId::from("run-prev"))
            .await
            .unwrap();

        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = ExtractionEngine::new(Arc::new(executor), store, 100, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Incremental)
            .await
            .unwrap();

        let window = dataset.window.unwrap();
        assert_eq!(window.start, ts(2025, 3, 3));
        // Rows at or after the watermark only; the 1st and 2nd stay behind.
        assert_eq!(dataset.row_count(), 3);
    }

    #[tokio::test]
    async fn first_run_without_lookback_is_unbounded() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", five_orders());
        let engine = engine(executor, store(&dir), 100, None);

        let resolution = engine
            .resolve_window(&source_config("orders"), &ExtractionMode::Incremental)
            .await
            .unwrap();
        assert_eq!(resolution, WindowResolution::Unbounded);
    }

    #[tokio::test]
    async fn first_run_honors_the_configured_lookback() {
        let dir = tempdir().unwrap();
        let executor = TableExecutor::new().with_table("orders", Vec::new());
        let engine = engine(executor, store(&dir), 100, Some(7));

        let resolution = engine
            .resolve_window(&source_config("orders"), &ExtractionMode::Incremental)
            .await
            .unwrap();
        match resolution {
            WindowResolution::Bounded(window) => {
                assert_eq!(window.end - window.start, Duration::days(7));
            }
            other => panic!("expected bounded window, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_watermark_short_circuits_to_empty() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        store
            .commit(
                &SourceId::from("orders"),
                Utc::now() + Duration::hours(1),
                &RunId::from("run-prev"),
            )
            .await
            .unwrap();

        let executor = Arc::new(TableExecutor::new().with_table("orders", five_orders()));
        let engine = ExtractionEngine::new(Arc::clone(&executor) as _, store, 100, None);

        let dataset = engine
            .extract(&source_config("orders"), &ExtractionMode::Incremental)
            .await
            .unwrap();

        assert!(dataset.is_empty());
        // Nothing was queried at all.
        assert_eq!(executor.call_count(), 0);
    }
}

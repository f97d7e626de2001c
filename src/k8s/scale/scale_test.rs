//! Tests for guarded replica updates.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::{ScaleController, ScaleOutcome};
    use crate::error::Error;
    use crate::support::FakeControlPlane;

    const NS: &str = "team-ns";

    #[tokio::test]
    async fn test_get_replicas_reads_fresh_value() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-a-1"]).with_replicas("svc-a-1", 2));
        let scaler = ScaleController::new(fake.clone());

        assert_eq!(scaler.get_replicas(NS, "svc-a-1").await.unwrap(), 2);
        assert_eq!(scaler.get_replicas(NS, "svc-a-1").await.unwrap(), 2);
        assert_eq!(fake.read_calls(), 2, "replica counts are never cached");
    }

    #[tokio::test]
    async fn test_same_target_is_not_written() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-a-1"]).with_replicas("svc-a-1", 3));
        let scaler = ScaleController::new(fake.clone());

        let outcome = scaler.set_replicas(3, NS, "svc-a-1").await.unwrap();

        assert_eq!(outcome, ScaleOutcome { changed: false, replicas: 3 });
        assert_eq!(fake.read_calls(), 1);
        assert_eq!(fake.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_new_target_is_written_once() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-a-1"]).with_replicas("svc-a-1", 3));
        let scaler = ScaleController::new(fake.clone());

        let outcome = scaler.set_replicas(5, NS, "svc-a-1").await.unwrap();

        assert_eq!(outcome, ScaleOutcome { changed: true, replicas: 5 });
        assert_eq!(fake.read_calls(), 1);
        assert_eq!(fake.write_calls(), 1);
        assert_eq!(*fake.written.lock(), vec![("svc-a-1".to_string(), 5)]);
        assert_eq!(fake.replicas_of("svc-a-1"), Some(5));
    }

    #[tokio::test]
    async fn test_scale_down_to_zero() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-b-2"]).with_replicas("svc-b-2", 4));
        let scaler = ScaleController::new(fake.clone());

        let outcome = scaler.set_replicas(0, NS, "svc-b-2").await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.replicas, 0);
    }

    #[tokio::test]
    async fn test_read_failure_skips_write() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-a-1"]));
        let scaler = ScaleController::new(fake.clone());

        let err = scaler.set_replicas(2, NS, "missing").await.unwrap_err();

        assert!(matches!(err, Error::ControlPlane(_)));
        assert!(err.to_string().contains("not found"));
        assert_eq!(fake.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced_without_retry() {
        let fake = Arc::new(FakeControlPlane::with_names(&["svc-a-1"]).with_replicas("svc-a-1", 1));
        fake.fail_update_with("the object has been modified");
        let scaler = ScaleController::new(fake.clone());

        let err = scaler.set_replicas(2, NS, "svc-a-1").await.unwrap_err();

        assert!(matches!(err, Error::ControlPlane(_)));
        assert_eq!(fake.write_calls(), 1, "no retry after a failed write");
        assert_eq!(fake.replicas_of("svc-a-1"), Some(1));
    }
}

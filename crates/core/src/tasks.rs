use std::future::Future;

use crate::error::DomainResult;

/// Spawn a detached task on the ambient Tokio runtime.
///
/// The task is never awaited by the caller; a failure is logged and
/// swallowed. Used for side effects that must not affect the primary
/// operation, such as hook-execution events and post-registration
/// membership linking.
pub fn fire_and_forget<F>(task: &'static str, fut: F)
where
    F: Future<Output = DomainResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::warn!(task, error = %e, "Detached task failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    #[tokio::test]
    async fn test_detached_task_runs() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        fire_and_forget("test-task", async move {
            tx.send(42).ok();
            Ok(())
        });
        assert_eq!(rx.recv().await, Some(42));
    }

    #[tokio::test]
    async fn test_detached_task_failure_is_swallowed() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        fire_and_forget("failing-task", async move {
            tx.send(()).ok();
            Err(DomainError::infrastructure("sink offline"))
        });
        // The failure is logged inside the spawned task; nothing propagates.
        assert_eq!(rx.recv().await, Some(()));
    }
}

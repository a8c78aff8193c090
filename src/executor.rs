//! Query executor abstraction
//!
//! The cache layer never talks to a database directly. Hosts implement
//! [`QueryExecutor`] over their driver or connection pool; timeouts, retries
//! and pooling stay on that side.

use crate::error::ExecutorError;
use crate::result::QueryResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Runs SQL text with bound parameters
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` with positional `params`.
    ///
    /// Implementations tag statements that return several result sets with
    /// [`Rows::Multi`](crate::result::Rows::Multi).
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult, ExecutorError>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult, ExecutorError> {
        (**self).execute(sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl QueryExecutor for EchoExecutor {
        async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult, ExecutorError> {
            if sql.is_empty() {
                return Err(ExecutorError::QueryError("empty statement".to_string()));
            }
            Ok(QueryResult::single(params.to_vec(), vec![]))
        }
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let executor: Arc<dyn QueryExecutor> = Arc::new(EchoExecutor);
        let shared = Arc::new(executor);

        let result = shared.execute("select ?", &[json!(1)]).await.unwrap();
        assert_eq!(result.row_count(), 1);

        let err = shared.execute("", &[]).await.unwrap_err();
        assert_eq!(err, ExecutorError::QueryError("empty statement".to_string()));
    }

    #[test]
    fn test_execute_without_runtime() {
        let result = tokio_test::block_on(EchoExecutor.execute("select 1", &[])).unwrap();
        assert!(result.rows.is_empty());
    }
}

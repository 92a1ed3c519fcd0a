use async_trait::async_trait;

use crate::{error::PersistenceError, models::Run};

/// Durable home of finished runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Stores the run and returns its id.
    async fn create(&self, run: Run) -> Result<String, PersistenceError>;

    /// All stored runs, in no particular order.
    async fn list(&self) -> Result<Vec<Run>, PersistenceError>;

    async fn delete(&self, id: &str) -> Result<(), PersistenceError>;
}

use crate::models::{Point, VectorSpec};
use crate::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore {
    /// Name of the collection this store writes into.
    fn collection(&self) -> &str;

    async fn collection_exists(&self) -> Result<bool, StoreError>;

    async fn create_collection(&self, vector: &VectorSpec) -> Result<(), StoreError>;

    /// Inserts or overwrites points by id.
    async fn upsert_points(&self, points: &[Point]) -> Result<(), StoreError>;

    /// Creates the collection when absent. Returns `true` if it was created.
    async fn ensure_collection(&self, vector: &VectorSpec) -> Result<bool, StoreError> {
        if self.collection_exists().await? {
            return Ok(false);
        }
        self.create_collection(vector).await?;
        Ok(true)
    }
}

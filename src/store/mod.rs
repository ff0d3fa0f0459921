//! Persistence for product records.
//!
//! Handlers only see [`ProductStore`]; the backend is chosen at startup.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{NewProduct, Product},
};

pub use memory::MemoryProductStore;
pub use postgres::PgProductStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a record and returns it with its assigned id.
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Every record, in insertion order.
    async fn find_all(&self) -> Result<Vec<Product>>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>>;

    /// Writes every mutable field of `product` back to its row.
    ///
    /// Fails with `AppError::NotFound` when the row no longer exists.
    async fn save(&self, product: &Product) -> Result<Product>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> Result<bool>;

    async fn check_health(&self) -> Result<()>;
}

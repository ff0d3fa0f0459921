use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::ProductStore;
use crate::{
    error::{AppError, Result},
    models::{NewProduct, Product},
};

/// In-process store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i32,
    rows: BTreeMap<i32, Product>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let id = inner
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::InternalError("Product id space exhausted".to_string()))?;
        inner.last_id = id;

        let now = Utc::now();
        let product = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(id, product.clone());

        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, product: &Product) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&product.id).ok_or(AppError::NotFound)?;

        row.name = product.name.clone();
        row.description = product.description.clone();
        row.price = product.price;
        row.image = product.image.clone();
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

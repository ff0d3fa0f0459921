use async_trait::async_trait;
use sqlx::PgPool;

use super::ProductStore;
use crate::{
    database,
    error::{AppError, Result},
    models::{NewProduct, Product},
};

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, image)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn save(&self, product: &Product) -> Result<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET
                name = $1,
                description = $2,
                price = $3,
                image = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn check_health(&self) -> Result<()> {
        database::check_health(&self.pool).await
    }
}

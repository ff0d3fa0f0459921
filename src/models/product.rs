use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, Result},
    validation::ValidatedFields,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Assigned by the store on creation.
    #[schema(read_only, example = 2)]
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 9.99)]
    pub price: Decimal,
    /// Stored filename of the uploaded image, served under `/images/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(read_only, example = "upload_a91d4e4b79e6995d963cb0a8048d5cbc.png")]
    pub image: Option<String>,
    #[schema(value_type = String, format = DateTime, read_only)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime, read_only)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductChanges {
    pub fn from_validated(mut fields: ValidatedFields, image: Option<String>) -> Self {
        Self {
            name: fields.take_text("name"),
            description: fields.take_text("description"),
            price: fields.decimal("price"),
            image,
        }
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
    }

    pub fn into_new_product(self) -> Result<NewProduct> {
        let missing =
            |field: &str| AppError::InternalError(format!("{} missing after validation", field));

        Ok(NewProduct {
            name: self.name.ok_or_else(|| missing("name"))?,
            description: self.description.ok_or_else(|| missing("description"))?,
            price: self.price.ok_or_else(|| missing("price"))?,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
}

/// Multipart body accepted by create and edit. Documentation only.
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    /// Product name, at most 255 characters.
    pub name: String,
    pub description: String,
    /// Rounded to 2 decimal places.
    #[schema(value_type = f64)]
    pub price: Decimal,
    /// Image to attach. Non-image files are dropped; the limit is 2 MiB.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{CREATE_PRODUCT, EDIT_PRODUCT, FormFields};
    use serde_json::json;

    fn sample() -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: "Widget".to_string(),
            description: "d".to_string(),
            price: Decimal::new(999, 2),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serializes_price_as_number_and_omits_missing_image() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["price"], json!(9.99));
        assert!(json.get("image").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut fields = FormFields::new();
        fields.insert("price".to_string(), json!("19.99"));
        let validated = EDIT_PRODUCT.validate(&fields).unwrap();

        let mut product = sample();
        ProductChanges::from_validated(validated, Some("upload_x.png".to_string()))
            .apply(&mut product);

        assert_eq!(product.name, "Widget");
        assert_eq!(product.description, "d");
        assert_eq!(product.price, Decimal::new(1999, 2));
        assert_eq!(product.image.as_deref(), Some("upload_x.png"));
    }

    #[test]
    fn into_new_product_needs_every_required_field() {
        let mut fields = FormFields::new();
        fields.insert("name".to_string(), json!("Widget"));
        fields.insert("description".to_string(), json!("d"));
        fields.insert("price".to_string(), json!(9.99));
        let validated = CREATE_PRODUCT.validate(&fields).unwrap();

        let new = ProductChanges::from_validated(validated, None)
            .into_new_product()
            .unwrap();
        assert_eq!(new.price, Decimal::new(999, 2));
        assert!(new.image.is_none());

        assert!(ProductChanges::default().into_new_product().is_err());
    }
}

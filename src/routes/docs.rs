use axum::Json;
use utoipa::OpenApi;

use super::products;
use crate::models::{Product, ProductForm, ProductList};

#[derive(OpenApi)]
#[openapi(
    info(title = "Product API", description = "Create, list, edit and delete products"),
    paths(
        products::create_product,
        products::get_all_products,
        products::get_product,
        products::edit_product,
        products::delete_product,
    ),
    components(schemas(Product, ProductForm, ProductList)),
    tags((name = "Products", description = "Product management"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

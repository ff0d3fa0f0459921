use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{FormData, Product, ProductChanges, ProductForm, ProductList},
    validation::{CREATE_PRODUCT, EDIT_PRODUCT},
};

/// Multipart field carrying the product image.
pub const IMAGE_FIELD: &str = "imageFile";

/// Reads the leading base-10 integer of `raw`, ignoring anything after it,
/// so `"7abc"` and `"7.5"` both name record 7. No digits, or a value outside
/// `i32`, is treated as a missing record.
pub fn parse_id(raw: &str) -> Option<i32> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['+', '-']));
    let digit_len = raw[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digit_len == 0 {
        return None;
    }

    raw[..sign_len + digit_len].parse().ok()
}

async fn find_product(state: &AppState, raw_id: &str) -> Result<Product> {
    let id = parse_id(raw_id).ok_or(AppError::NotFound)?;

    state.store.find_by_id(id).await?.ok_or(AppError::NotFound)
}

fn attached_image(form: &FormData) -> Option<String> {
    form.file(IMAGE_FIELD).map(|file| file.stored_name.clone())
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 422, description = "Form fields failed validation"),
        (status = 500, description = "Store or upload failure"),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(form): Extension<FormData>,
) -> Result<(StatusCode, Json<Product>)> {
    let fields = CREATE_PRODUCT.validate(&form.fields)?;
    let new_product =
        ProductChanges::from_validated(fields, attached_image(&form)).into_new_product()?;

    let product = state.store.create(new_product).await?;
    tracing::info!(id = product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Get all products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Success", body = ProductList),
        (status = 500, description = "Store failure"),
    )
)]
pub async fn get_all_products(State(state): State<AppState>) -> Result<Json<ProductList>> {
    let products = state.store.find_all().await?;

    Ok(Json(ProductList { products }))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID of the product to get")),
    responses(
        (status = 200, description = "Success", body = Product),
        (status = 404, description = "The requested product cannot be found"),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = find_product(&state, &id).await?;

    Ok(Json(product))
}

/// Edit a product
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID of the product to edit")),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product edited successfully", body = Product),
        (status = 404, description = "The requested product cannot be found"),
        (status = 422, description = "Form fields failed validation"),
    )
)]
pub async fn edit_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(form): Extension<FormData>,
) -> Result<Json<Product>> {
    let mut product = find_product(&state, &id).await?;

    let fields = EDIT_PRODUCT.validate(&form.fields)?;
    ProductChanges::from_validated(fields, attached_image(&form)).apply(&mut product);

    let product = state.store.save(&product).await?;
    tracing::info!(id = product.id, "Product updated");

    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = i32, Path, description = "ID of the product to delete")),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 404, description = "The requested product cannot be found"),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let product = find_product(&state, &id).await?;

    if !state.store.delete(product.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id = product.id, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}

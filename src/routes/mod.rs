mod docs;
mod health;
mod index;
pub mod products;

use axum::{Router, middleware, routing::get};

use crate::{AppState, middleware::form_middleware};

pub use docs::ApiDoc;

pub fn create_router(state: &AppState) -> Router<AppState> {
    let product_routes = Router::new()
        .route(
            "/products",
            get(products::get_all_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .patch(products::edit_product)
                .delete(products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), form_middleware));

    Router::new()
        .route("/", get(index::root))
        .route("/api", get(index::api_root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/docs/openapi.json", get(docs::openapi_json))
        .nest("/api", product_routes)
}

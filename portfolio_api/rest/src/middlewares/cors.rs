use axum::{
    http::{header, Method},
    Router,
};
use portfolio_utils::Apply;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::AllowedOrigins;

pub fn add<S: Clone + Send + Sync + 'static>(
    allowed_origins: &AllowedOrigins,
) -> impl FnOnce(Router<S>) -> Router<S> {
    let layer = make_layer(allowed_origins);
    |router| router.apply_map(layer, Router::layer)
}

fn make_layer(allowed_origins: &AllowedOrigins) -> Option<CorsLayer> {
    let allow_origin = match allowed_origins {
        AllowedOrigins::None => return None,
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => AllowOrigin::list(origins.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .into()
}

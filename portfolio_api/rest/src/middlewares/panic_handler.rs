use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use futures::FutureExt;

use super::request_id::RequestId;
use crate::routes::internal_server_error;

/// Turn panics in request handlers into a regular `500` json response.
pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(middleware))
}

async fn middleware(request: Request, next: Next) -> Response {
    let route = request.uri().path().to_owned();
    let request_id = RequestId::of(request.extensions());
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => internal_server_error(
            request_id,
            anyhow!("request handler for {route} panicked"),
        ),
    }
}

use std::{net::SocketAddr, sync::Arc};

use axum::{http::HeaderValue, Router};
use portfolio_core_contact_contracts::ContactFeatureService;
use portfolio_utils::Apply;
use tokio::net::TcpListener;
use tracing::info;

mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Contact> {
    config: RestServerConfig,
    contact: Contact,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub addr: SocketAddr,
    pub allowed_origins: AllowedOrigins,
}

/// Origins which browsers may submit the contact form from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Only same-origin requests (no CORS headers are sent).
    None,
    Any,
    List(Vec<HeaderValue>),
}

impl<Contact> RestServer<Contact>
where
    Contact: ContactFeatureService,
{
    pub fn new(config: RestServerConfig, contact: Contact) -> Self {
        Self { config, contact }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.addr;
        let router = self.router();
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, router).await.map_err(Into::into)
    }

    pub fn router(self) -> Router<()> {
        let contact = Arc::new(self.contact);

        Router::new()
            .merge(routes::health::router(Arc::clone(&contact)))
            .merge(routes::contact::router(contact))
            .apply(middlewares::panic_handler::add)
            .apply(middlewares::trace::add)
            .apply(middlewares::request_id::add)
            .apply(middlewares::cors::add(&self.config.allowed_origins))
    }
}

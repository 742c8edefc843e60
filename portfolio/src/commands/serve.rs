use portfolio_config::Config;
use tracing::info;

use crate::environment;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let server = environment::rest_server(&config)?;
    info!("Starting http server on {}", config.http.address);
    server.serve().await
}

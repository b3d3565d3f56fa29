//! `sandql serve` - start the HTTP server.

use sandql_core::SandqlConfig;

pub async fn run(config: SandqlConfig) -> anyhow::Result<()> {
    config.validate()?;
    sandql_server::run(config).await
}

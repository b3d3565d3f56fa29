use sandql_core::SandqlConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SandqlConfig::load(None)?;
    sandql_server::init_tracing(&config.observability.log_level);
    sandql_server::run(config).await
}

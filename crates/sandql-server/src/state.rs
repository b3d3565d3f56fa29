use axum::http::HeaderName;
use sandql_core::SandqlConfig;
use sandql_store::SandqlService;

/// Shared application state.
pub struct AppState {
    pub service: SandqlService,

    /// Header the authenticating front end uses to pass the tenant id.
    pub tenant_header: HeaderName,
}

impl AppState {
    pub fn init(cfg: &SandqlConfig) -> anyhow::Result<Self> {
        let service = SandqlService::from_config(cfg)?;
        Self::with_service(service, &cfg.server.tenant_header)
    }

    pub fn with_service(service: SandqlService, tenant_header: &str) -> anyhow::Result<Self> {
        let tenant_header = HeaderName::from_bytes(tenant_header.trim().as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid tenant header {tenant_header:?}: {e}"))?;
        Ok(Self {
            service,
            tenant_header,
        })
    }
}

//! Statement execution and schema commands.
//!
//! `sandql exec --tenant <id> <SQL>` - run one statement.
//! `sandql schema --tenant <id>` - print the tenant's schema.

use sandql_core::ExecutionResult;
use sandql_store::SandqlService;

/// Run one statement and print the result. Failures still print their JSON
/// and then exit non-zero.
pub async fn exec(service: &SandqlService, tenant: &str, sql: &str) -> anyhow::Result<()> {
    let result = service.execute_query(tenant, sql).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let ExecutionResult::Failure { error, message } = result {
        anyhow::bail!("{error}: {message}");
    }
    Ok(())
}

pub async fn schema(service: &SandqlService, tenant: &str) -> anyhow::Result<()> {
    let schema = service.describe_schema(tenant).await?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

//! History and saved-query commands.

use sandql_store::SandqlService;

pub async fn history(service: &SandqlService, tenant: &str, limit: Option<u32>) -> anyhow::Result<()> {
    let entries = service.list_history(tenant, limit).await?;
    if entries.is_empty() {
        println!("No history for {tenant}.");
        return Ok(());
    }
    for entry in entries {
        println!("{:>5}  {}  {}", entry.id, entry.executed_at.to_rfc3339(), entry.statement);
    }
    Ok(())
}

pub async fn clear_history(service: &SandqlService, tenant: &str) -> anyhow::Result<()> {
    let removed = service.clear_history(tenant).await?;
    println!("✔ Removed {removed} history entries for {tenant}");
    Ok(())
}

pub async fn list_saved(service: &SandqlService, tenant: &str) -> anyhow::Result<()> {
    let saved = service.list_saved(tenant).await?;
    if saved.is_empty() {
        println!("No saved queries for {tenant}.");
        return Ok(());
    }
    for query in saved {
        println!("{:>5}  {}", query.id, query.title);
        println!("       {}", query.statement);
    }
    Ok(())
}

pub async fn save(service: &SandqlService, tenant: &str, title: &str, sql: &str) -> anyhow::Result<()> {
    let saved = service.save_query(tenant, title, sql).await?;
    println!("✔ Saved query {} ({})", saved.id, saved.title);
    Ok(())
}

pub async fn remove_saved(service: &SandqlService, tenant: &str, id: i64) -> anyhow::Result<()> {
    if service.delete_saved(tenant, id).await? {
        println!("✔ Removed saved query {id}");
        Ok(())
    } else {
        anyhow::bail!("saved query {id} not found for {tenant}")
    }
}

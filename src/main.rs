use anyhow::Result;
use sgdatastore::{fetch, Dataset, Explorer};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) resource ids from the command line ───────────────────────
    let resource_ids: Vec<String> = std::env::args().skip(1).collect();
    if resource_ids.is_empty() {
        error!("no resource ids given; pass one or more data.gov.sg resource ids");
        return Ok(());
    }

    // ─── 3) load datasets sequentially ───────────────────────────────
    let client = fetch::client()?;
    let mut datasets = Vec::with_capacity(resource_ids.len());
    for id in &resource_ids {
        datasets.push(Dataset::load(&client, id).await);
    }

    // ─── 4) explore: describe, preview, charts ───────────────────────
    Explorer::new(&datasets, "charts").run()?;

    info!("all done");
    Ok(())
}

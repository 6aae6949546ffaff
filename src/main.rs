use tally::{storefront, trace_init, Script, Till, Upshot, TOTAL};

#[tokio::main]
async fn main() -> Upshot<()> {
    trace_init();
    let page = storefront();
    let till = Till::open(page.clone())?;
    let script = match Script::from_path("data/script.csv".into()) {
        Ok(script) => script,
        Err(e) => {
            tracing::warn!("No script to read, running the rehearsal: {}", e.to_string());
            Script::rehearsal()
        }
    };
    script.run(&page).await?;
    till.settle().await;
    tracing::info!("Final total: {}", page.value(TOTAL)?);
    Ok(())
}

/// Smoke-test for `BrowserRenderer` against the live B3 page.
///
/// Launches a headless Chromium, renders the IBOV composition page with the
/// default wait conditions, and parses the table.
///
/// Run with:
///   cargo run -p ibov-client --example browser_smoke --features browser
use chrono::Local;
use ibov_client::{BrowserRenderer, HtmlTableExtractor};
use ibov_core::config::{DEFAULT_TARGET_URL, RenderOptions};
use ibov_core::traits::{PageRenderer, TableExtractor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Rendering {DEFAULT_TARGET_URL} …");
    let renderer = BrowserRenderer::new();
    let page = renderer
        .render(DEFAULT_TARGET_URL, &RenderOptions::default())
        .await?;

    assert!(
        page.html.len() > 500,
        "HTML suspiciously short ({} bytes)",
        page.html.len()
    );

    let dataset = HtmlTableExtractor::new().extract(&page, Local::now().date_naive())?;
    assert!(!dataset.is_empty(), "No constituent rows found");

    println!("OK — {} constituents", dataset.len());
    for record in dataset.records.iter().take(5) {
        println!(
            "  {:<6} {:<20} {:>8}",
            record.code, record.name, record.participation_percent
        );
    }
    Ok(())
}

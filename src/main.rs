use anyhow::Result;
use chrono::Local;
use reqwest::Client;
use skusync::{
    aggregate::ReportWindow,
    config::Config,
    fetch::CsvExportFetcher,
    pipeline::Pipeline,
    publish::SheetsClient,
    sink::MySqlSink,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // ─── 3) capabilities: source fetch, relational sink, sheet writer ─
    let client = Client::new();
    let fetcher = CsvExportFetcher::new(client.clone(), config.source_worksheet.clone());
    let sink = MySqlSink::connect(&config.database_url, config.pool_size).await?;
    let writer = SheetsClient::new(client, config.sheets_token.clone());

    // ─── 4) run one full refresh over the month-to-date window ──────
    let window = ReportWindow::month_to_date(Local::now().naive_local());
    let pipeline = Pipeline::new(&config, &fetcher, &sink, &writer);
    let report = pipeline.run(window).await?;

    info!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "all done"
    );
    Ok(())
}

use ello::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ello=info"));
    // Ignore a second init (hot reload)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = AppConfig::from_env()?;
    tracing::info!(backend = %config.backend_url, "starting Ello");

    dioxus::LaunchBuilder::new()
        .with_context(config)
        .launch(ello::ui::App);
    Ok(())
}

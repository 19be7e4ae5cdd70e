/// User Directory server
///
/// Serves the user CRUD API, avatar uploads and the stored avatar files.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_directory::{config::LoggingConfig, server, AppContext, DirectoryResult, ServerConfig};

#[tokio::main]
async fn main() -> DirectoryResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_logging(&config.logging);

    // Print banner
    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| fmt::layer().json()))
        .with((!logging.json).then(fmt::layer))
        .init();
}

fn print_banner() {
    println!(
        r#"
    User Directory v{}
    JSON-file user records with avatar uploads
        "#,
        env!("CARGO_PKG_VERSION")
    );
}

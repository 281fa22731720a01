mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting meetings service");

    // Load configuration
    let config = startup::load_config()?;

    // Serve the meeting handlers
    startup::start_server(config).await
}

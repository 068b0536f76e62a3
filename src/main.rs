use tracing_subscriber::EnvFilter;
use vigil::cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = Cli::run().await {
        vigil::cli::print_error(&e.to_string());
        std::process::exit(1);
    }
}

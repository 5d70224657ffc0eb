use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(error) = staybook::run().await {
        error!("staybook exited with error: {:#}", error);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    strike_server::run_with_config().await
}

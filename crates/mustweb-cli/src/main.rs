#[tokio::main]
async fn main() {
    mustweb_cli::run().await;
}

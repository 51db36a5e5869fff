#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aviation_english_backend::run().await
}

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    huename_cli::main_entry().await
}

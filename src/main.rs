use clap::Parser;
use entity_lens::{cli::{self, Cli}, utils::init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    cli::run(cli).await
}

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    extern crate colorkey;

    colorkey::init_logger();
    colorkey::cli_main(colorkey::cli::Cli::parse()).await
}

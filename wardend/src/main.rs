use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use prople_wardend::errors::WardenError;
use prople_wardend::svc::server::Server;

#[derive(Parser)]
#[command(name = "wardend")]
#[command(version = "1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "run")]
    #[command(about = "Running webhook intake, status lists and scheduled jobs")]
    Run {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), WardenError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Run { config } => {
            let server = Server::new(config.to_owned());
            server.serve().await?;
        }
    }

    Ok(())
}

mod codes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qrshop-cli")]
#[command(about = "QR code admin command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// List a shop's QR codes, newest first.
    List {
        /// Shop domain, e.g. `example.myshopify.com`.
        #[arg(long)]
        shop: String,
    },
    /// Print a QR code's SVG image.
    Image {
        id: i64,
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("qrshop-cli: use --help to list commands");
        return Ok(());
    };

    let config = qrshop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = qrshop_db::PoolConfig::from_app_config(&config);
    let pool = qrshop_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = qrshop_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::List { shop } => codes::run_list(&pool, &shop).await?,
        Commands::Image { id, output } => {
            codes::run_image(&pool, &config.app_url, id, output.as_deref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;

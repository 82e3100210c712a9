use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use newsdesk::cli::{article_line, fetch_summary, Cli, Command};
use newsdesk::{Config, Database, FetchOrchestrator, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = newsdesk::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        newsdesk::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        warn!("{}", e);
    }

    match run(cli.command(), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> newsdesk::Result<()> {
    let db = Database::open(&config.database.path).await?;

    match command {
        Command::Fetch => {
            let result = FetchOrchestrator::new(&db).fetch_latest(&config.news).await?;
            println!("{}", fetch_summary(&result.report));
            for article in &result.latest {
                println!("{}", article_line(article, &config.server.timezone));
            }
            db.close().await;
            Ok(())
        }
        Command::Serve => {
            info!(
                "newsdesk serving on {}:{}",
                config.server.host, config.server.port
            );
            let server = WebServer::from_database(&config.server, db, config.news.clone())?;
            server.run().await?;
            Ok(())
        }
    }
}

//! Colloquy CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colloquy::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    let orchestrator = match cli::build_orchestrator(args.config.as_deref()) {
        Ok(orchestrator) => orchestrator,
        Err(err) => cli::handle_error(err, args.json),
    };
    orchestrator.start_background();

    let result = match args.command {
        Commands::Balance(cmd) => cli::commands::balance::execute(&orchestrator, cmd, args.json).await,
        Commands::Chat(cmd) => cli::commands::chat::execute(&orchestrator, cmd, args.json).await,
        Commands::Upload(cmd) => {
            cli::commands::chat::execute_upload(&orchestrator, cmd, args.json).await
        }
        Commands::Tasks(cmd) => cli::commands::tasks::execute(&orchestrator, cmd, args.json).await,
        Commands::Cancel(cmd) => {
            cli::commands::tasks::execute_cancel(&orchestrator, cmd, args.json).await
        }
        Commands::Conversation(cmd) => {
            cli::commands::conversation::execute(&orchestrator, cmd, args.json).await
        }
    };

    orchestrator.shutdown();
    if let Err(err) = result {
        cli::handle_error(err, args.json);
    }
}

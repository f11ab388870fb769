//! near-fees CLI entry point.

use clap::Parser;

use near_fees::cli::{commands, handle_error, AppContext, Cli, Commands};
use near_fees::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let context = match AppContext::load(cli.config.as_deref()) {
        Ok(context) => context,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&context.config.logging)
        .and_then(|config| LoggerImpl::init(&config))
    {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args, &context, cli.json).await,
        Commands::Query(args) => commands::query::execute(args, &context, cli.json).await,
        Commands::Report(args) => commands::report::execute(args, &context, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

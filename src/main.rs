use clap::Parser;
use foreman::cli::commands::Cli;
use foreman::cli::handlers;
use foreman::logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref()) {
        eprintln!("warning: {}", e);
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

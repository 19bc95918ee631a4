use clap::Parser;
use colored::Colorize;

use opus_recorder::cli::app;
use opus_recorder::cli::args::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Record(args) => app::run_record(args),
        Commands::Check { mime } => {
            app::run_check(&mime);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

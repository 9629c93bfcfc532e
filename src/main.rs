use clap::Parser;
use tracing::debug;

use faultline::adapter::inbound::cli::command::{Cli, ColorChoice, Commands, ConfigCommand};
use faultline::adapter::inbound::cli::output::{self, OutputConfig};
use faultline::adapter::inbound::cli::{config, migrate, normalize};

fn init_logging(cli: &Cli) {
    let path = match &cli.command {
        Commands::Migrate(arg) => Some(&arg.config),
        Commands::Config(ConfigCommand::Show(arg) | ConfigCommand::Validate(arg)) => {
            Some(&arg.config)
        }
        Commands::Normalize(_) => None,
    };
    let mut logging = path
        .and_then(|p| config::load_or_default(p).ok())
        .map(|c| c.logging)
        .unwrap_or_default();
    match cli.verbose {
        0 if cli.quiet => logging.level = "error".into(),
        0 => {}
        1 => logging.level = "debug".into(),
        _ => logging.level = "trace".into(),
    }
    logging.init();
}

fn apply_color(choice: &ColorChoice) {
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    apply_color(&cli.color);
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    init_logging(&cli);
    debug!(verbosity = output::verbosity(), "faultline starting");

    let result = match &cli.command {
        Commands::Migrate(arg) => migrate::execute(&arg.config),
        Commands::Normalize(args) => normalize::execute(args).await,
        Commands::Config(ConfigCommand::Show(arg)) => config::execute_show(&arg.config),
        Commands::Config(ConfigCommand::Validate(arg)) => config::execute_validate(&arg.config),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
    Ok(())
}

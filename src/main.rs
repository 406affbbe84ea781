use clap::Parser;
use form_pilot::cli::commands::{
    Runtime, cmd_context, cmd_detect, cmd_fill, cmd_health, cmd_profile, cmd_suggest, cmd_tools,
};
use form_pilot::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let runtime = Runtime::new(config, cli.api_base_url);

    match cli.command {
        Commands::Detect { page } => cmd_detect(&page)?,
        Commands::Fill {
            page,
            out,
            clear_wrong,
            offline,
        } => cmd_fill(&runtime, &page, out.as_deref(), clear_wrong, offline)?,
        Commands::Suggest { page, field } => cmd_suggest(&runtime, &page, field)?,
        Commands::Profile { action } => cmd_profile(&runtime, &action)?,
        Commands::Context { action } => cmd_context(&runtime, &action)?,
        Commands::Tools => cmd_tools()?,
        Commands::Health => cmd_health(&runtime)?,
    }

    Ok(())
}

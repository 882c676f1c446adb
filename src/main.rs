use clap::Parser;
use tally::{
    config::{CliArgs, Config, LoggingConfig},
    demo,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_tracing(&config.logging);

    tracing::info!(path = %config.storage.path, "running ledger demo");
    let rows = demo::run(&config)?;
    demo::render(&rows).printstd();

    Ok(())
}

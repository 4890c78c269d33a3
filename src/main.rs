use anyhow::Result;
use bump::{arguments::Arguments, config::Config, updater};
use clap::Parser;
use log::{LevelFilter, debug, info};

fn main() -> Result<()> {
    let args = Arguments::parse();
    pretty_env_logger::env_logger::builder()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .format_timestamp(None)
        .init();

    let config = Config::load(&args.path)?;
    if let Some(source) = &config.source {
        debug!("Using defaults from {}", source.display());
    }
    let options = config.resolve(&args);
    debug!("Resolved options: {:?}", options);

    let report = updater::run(&args.path, &options)?;
    for file in report.files.iter().filter(|file| !file.modified) {
        info!("Left '{}' unchanged", file.path.display());
    }

    println!("{}", report.version);
    Ok(())
}

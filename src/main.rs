mod args;
mod transform;

use chrono::{DateTime, FixedOffset, Local};
use clap::Parser;
use log::{error, info};

use crate::args::Args;
use crate::transform::*;

fn settings_from_args(args: &Args) -> TResult<TransformSettings> {
    let from_args = TransformSettings {
        raw_data_directory: args.raw_dir.clone(),
        transformed_data_directory: args.transformed_dir.clone(),
        corrections_path: args.corrections.clone(),
        corrections_worksheet: args.corrections_worksheet.clone(),
    };
    match &args.config {
        Some(config_path) => Ok(from_args.or(read_settings(config_path)?)),
        None => Ok(from_args),
    }
}

fn run(args: &Args) -> TResult<()> {
    let settings = settings_from_args(args)?;
    let config = TransformConfig::from_settings(&settings);
    let scraped_at: DateTime<FixedOffset> = Local::now().into();
    let batch = run_transform(&config, &scraped_at, args.reference.clone())?;
    info!(
        "Transformed {} contests at {}",
        batch.races.len(),
        batch.scraped_datetime
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(e) = run(&args) {
        error!("Error occurred {:?}", e);
        eprintln!("An error occurred: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

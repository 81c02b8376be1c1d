use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use csv_crop::cli::Args;
use csv_crop::data::timestamp::TimestampFormat;
use csv_crop::{ConfigError, job};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let args = Args::parse();

    match job::run(&args) {
        Ok(path) => {
            log::info!("Done: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.downcast_ref::<ConfigError>() {
            Some(config) => {
                log::error!("{config}");
                if matches!(config, ConfigError::InvalidFormat(_)) {
                    println!("valid formats are: {}", TimestampFormat::TAGS.join(", "));
                }
                Ok(ExitCode::from(1))
            }
            None => Err(err),
        },
    }
}

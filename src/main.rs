use std::process::ExitCode;

use stardust::{EngineConfig, RunError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RunError> {
    // Optional JSON config path as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {}", path);
            EngineConfig::from_json_file(&path)?
        }
        None => EngineConfig::default(),
    };
    stardust::run(config)
}

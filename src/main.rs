use std::process::ExitCode;

use medlens_lib::config::AppConfig;

fn main() -> ExitCode {
    medlens_lib::init_tracing();

    let result = AppConfig::from_env()
        .map_err(medlens_lib::StartupError::from)
        .and_then(medlens_lib::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// src/main.rs

use std::process::ExitCode;

use menusync::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("menusync: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "menusync failed");
            eprintln!("menusync error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

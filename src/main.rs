use crate::config::{Env, ProcessEnv};
use crate::error::Error;
use reqwest::StatusCode;
use std::process::ExitCode;
use tracing::{debug, error};

mod config;
mod error;
mod log;
mod notify;
mod slack;

fn run(env: &dyn Env) -> Result<StatusCode, Error> {
    let config = config::get_config(env)?;
    debug!("Loaded config: {:?}", config);

    let message = notify::build_message(&config);

    Ok(slack::send_message(&config.webhook_url, &message)?)
}

fn main() -> ExitCode {
    log::init();

    match run(&ProcessEnv) {
        Ok(status) => {
            println!("{}", status);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(exit_code = e.exit_code(), "Notification failed");
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

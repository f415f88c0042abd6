// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use clap::error::ErrorKind;
use disk_usage_agent::application::DefaultApplication;
use disk_usage_agent::configuration::{self, AgentOptions};
use disk_usage_agent::errors::AgentError;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in collected logs.
        .with_ansi(false)
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    match configuration::load_env_file() {
        Ok(Some(path)) => tracing::debug!("[agent] loaded {}", path.display()),
        Ok(None) => {}
        Err(err) => return fail(&err),
    }

    // get configuration options from environment variables
    let options = match AgentOptions::try_parse() {
        Ok(options) => options.read_password(|name| std::env::var(name).ok()),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return fail(&AgentError::ConfigError(err.to_string())),
    };

    if let Err(err) = options.validate() {
        return fail(&err);
    }

    tracing::debug!("[agent] {:?}", &options);

    let application = DefaultApplication::build(&options).await;

    match application.run(Utc::now()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn fail(err: &AgentError) -> ExitCode {
    tracing::error!(stage = err.stage(), "[agent] {}", err);
    ExitCode::FAILURE
}

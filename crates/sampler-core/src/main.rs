//! ADC sampler binary.
//!
//! Configuration comes from the environment only. The process runs until
//! SIGINT/SIGTERM or a fatal error, then exits with a stable code.

use std::io::IsTerminal;

use sampler_common::{format_error_human, StructuredError};
use sampler_config::SamplerConfig;
use sampler_core::exit_codes::ExitCode;
use sampler_core::logging::{init_logging, LogConfig};
use sampler_core::shutdown::{signal_received, Shutdown};
use sampler_core::startup::{build_runtime, StartupError};
use tracing::{error, info};

fn main() -> std::process::ExitCode {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            let common = sampler_common::Error::from(&err);
            let code = err.exit_code();
            error!(
                code = common.code(),
                exit_code = code.code_name(),
                error = %err,
                detail = %StructuredError::from(&common).to_json(),
                "startup failed"
            );
            eprintln!("{}", format_error_human(&common, std::io::stderr().is_terminal()));
            code
        }
    };
    code.into()
}

fn run() -> Result<ExitCode, StartupError> {
    init_logging(&LogConfig::from_env())?;
    let config = SamplerConfig::from_env()?;
    let shutdown = Shutdown::with_signals().map_err(StartupError::Signals)?;

    let runtime = build_runtime(&config, shutdown.clone())?;
    let display = runtime
        .display
        .spawn(runtime.display_refresh, shutdown.clone())
        .map_err(|source| StartupError::Thread {
            name: "display",
            source,
        })?;

    let mut sampling = runtime.sampling;
    let summary = sampling.run();

    shutdown.trigger();
    let renders = display.join();

    let code = if summary.stopped_on_error.is_some() {
        ExitCode::InternalError
    } else if signal_received() {
        ExitCode::Interrupted
    } else {
        ExitCode::Clean
    };
    info!(
        batches_published = summary.batches_published,
        failed_cycles = summary.failed_cycles,
        next_batch_id = summary.next_batch_id,
        display_renders = renders,
        exit_code = code.code_name(),
        "sampler exiting"
    );
    Ok(code)
}

//! fftacc - FFT accelerator test client
//!
//! Drives simulated FFT accelerator instances through their register
//! protocol: reset, configure, load samples, process, drain the spectrum.
//!
//! # Architecture
//!
//! The client only talks to `AcceleratorHandle`s from fftacc-host. The handle
//! owns a `RegisterBus` (the in-process model today) and serializes access to
//! it, so the same commands work with any backend that answers 32-bit register
//! reads and writes.

mod cli;
mod commands;
mod signal;

use clap::Parser;
use cli::{Cli, Commands};
use fftacc_core::protocol::PollConfig;
use fftacc_host::{open_backend, AcceleratorHandle, HostConfig, InstanceSettings};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
        Commands::Regs { backend } => {
            let handle = open(&backend, &config)?;
            commands::cmd_regs(&handle)
        }
        Commands::Run {
            backend,
            input,
            mode,
            output,
            check,
            wave,
        } => {
            let handle = open(&backend, &config)?;
            commands::cmd_run(
                &handle,
                input.as_deref(),
                mode.into(),
                output.as_deref(),
                check,
                &wave,
            )
        }
        Commands::Transform {
            input,
            mode,
            output,
        } => commands::cmd_transform(&input, mode.into(), output.as_deref()),
        Commands::Exec {
            backend,
            script,
            request,
        } => {
            let handle = open(&backend, &config)?;
            commands::cmd_exec(&handle, script.as_deref(), &request)
        }
        Commands::Gen { output, name, wave } => commands::cmd_gen(&wave, &name, output.as_deref()),
    }
}

/// Load the host configuration, or fall back to defaults
fn load_config(path: Option<&Path>) -> Result<HostConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config = HostConfig::from_toml_file(path)?;
            log::info!(
                "Loaded {} accelerator definition(s) from {}",
                config.accelerators.len(),
                path.display()
            );
            Ok(config)
        }
        None => Ok(HostConfig::default()),
    }
}

/// Open a backend, using the first configured instance as the base settings
fn open(
    backend: &str,
    config: &HostConfig,
) -> Result<AcceleratorHandle, Box<dyn std::error::Error>> {
    let base = config
        .accelerators
        .first()
        .cloned()
        .unwrap_or_else(InstanceSettings::default);
    let poll: PollConfig = config.poll;
    Ok(open_backend(backend, &base, poll)?)
}

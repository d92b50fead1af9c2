#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bench;
mod cli;
mod error_fmt;
mod logging;

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;
use tester_config::Config;
use tester_core::SweepCfg;
use tester_ui::{render_display_frame, render_progress_bar};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{EXIT_ERROR, EXIT_PASS, exit_code_for_verdict, format_error_json, humanize};

const PROGRESS_WIDTH: usize = 30;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    let code = match real_main(cli) {
        Ok(code) => code,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

/// Read the config file; a missing file yields the reference defaults.
fn load_config(path: &Path) -> eyre::Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    Ok((tester_config::load_file(path)?, true))
}

fn real_main(cli: Cli) -> eyre::Result<i32> {
    let (mut cfg, found) = load_config(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    if found {
        tracing::debug!(path = %cli.config.display(), "config loaded");
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found; using defaults");
    }

    match cli.cmd {
        Commands::Run {
            device,
            curve,
            trace,
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            hardware,
        } => {
            bench::apply_device_overrides(&mut cfg, device, curve);
            cfg.validate().wrap_err("invalid configuration")?;

            #[cfg(all(feature = "hardware", target_os = "linux"))]
            let mut rig = if hardware {
                bench::hardware(&cfg, None)?
            } else {
                bench::simulated(&cfg, None)?
            };
            #[cfg(not(all(feature = "hardware", target_os = "linux")))]
            let mut rig = bench::simulated(&cfg, None)?;

            let cycle = bench::run_cycle(&mut rig)?;
            let sweep = SweepCfg::from(&cfg.sweep);
            if let Some(path) = trace.as_deref() {
                bench::write_trace(path, &cycle.report)?;
                tracing::info!(path = %path.display(), steps = cycle.report.steps.len(), "trace written");
            }

            if cli.json {
                let mut obj = bench::report_json(&cycle.report, &sweep);
                obj["display"] = json!(cycle.shown);
                println!("{obj}");
            } else {
                println!("{}", render_display_frame(&cycle.shown, cfg.display.width));
                println!(
                    "{}",
                    render_progress_bar(cycle.report.advances, sweep.advances(), PROGRESS_WIDTH)
                );
                println!("{}", bench::report_line(&cycle.report, &sweep));
            }
            Ok(exit_code_for_verdict(cycle.report.verdict))
        }
        Commands::Serve { device, curve } => {
            bench::apply_device_overrides(&mut cfg, device, curve);
            cfg.validate().wrap_err("invalid configuration")?;
            serve(&cfg, cli.json)
        }
        Commands::SelfCheck => {
            cfg.validate().wrap_err("invalid configuration")?;
            drop(bench::simulated(&cfg, None)?);
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            drop(bench::hardware(&cfg, None)?);

            let sweep = SweepCfg::from(&cfg.sweep);
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "status": "ok",
                        "device": format!("{:?}", cfg.simulation.device).to_lowercase(),
                        "levels": sweep.levels(),
                        "sample_count": sweep.sample_count,
                        "fail_threshold": sweep.fail_threshold,
                    })
                );
            } else {
                println!(
                    "OK: {} levels 0..={} step {}, {} samples per level, fail at {}",
                    sweep.levels(),
                    sweep.reference_max,
                    sweep.step_size,
                    sweep.sample_count,
                    sweep.fail_threshold
                );
            }
            Ok(EXIT_PASS)
        }
    }
}

/// Interactive bench: every stdin line is a button press. Stops on Ctrl-C or
/// end of input, after the events already queued are handled.
fn serve(cfg: &Config, json_out: bool) -> eyre::Result<i32> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    let width = cfg.display.width;
    let observer: bench::DisplayObserver = Box::new(move |text: &str| {
        if !json_out {
            println!("{}", render_display_frame(text, width));
        }
    });
    let mut rig = bench::simulated(cfg, Some(observer))?;

    if let Some(button) = rig.button.clone() {
        let shutdown = shutdown.clone();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() || button.press().is_err() {
                    break;
                }
            }
            shutdown.store(true, Ordering::SeqCst);
        });
    }
    if !json_out {
        println!("press Enter to start or clear a run; Ctrl-C to quit");
    }

    let sweep = SweepCfg::from(&cfg.sweep);
    let completed = rig.events.serve(&shutdown, |report| {
        if json_out {
            println!("{}", bench::report_json(report, &sweep));
        } else {
            println!(
                "{}",
                render_progress_bar(report.advances, sweep.advances(), PROGRESS_WIDTH)
            );
            println!("{}", bench::report_line(report, &sweep));
        }
    })?;

    tracing::info!(completed, "serve stopped");
    if !json_out {
        println!("served {completed} run(s)");
    }
    Ok(EXIT_PASS)
}

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod logging;
mod rt;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::RunArgs;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "exiting with error");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = fbc_config::load_file(&cli.config)?;
    logging::init_tracing(cli.log_level.as_deref(), cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), strategy = cfg.strategy.kind(), "config loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }

    match cli.cmd {
        Commands::Run {
            goal,
            timeout_ms,
            tick_ms,
            parallel,
            duration_ms,
            rt,
            rt_prio,
            rt_lock,
        } => {
            let args = RunArgs {
                goal,
                timeout_ms,
                tick_ms,
                parallel,
                duration_ms,
                rt,
                rt_prio,
                rt_lock,
            };
            let report = run::run(&cfg, &args, shutdown)?;
            if cli.json {
                println!("{}", report.to_json());
            } else {
                println!("{}", report.to_text());
            }
        }
        Commands::SelfCheck => {
            let moved = run::self_check(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "ok": true, "position": moved }));
            } else {
                println!("ok: simulated plant moved to {moved}");
            }
        }
    }
    Ok(())
}

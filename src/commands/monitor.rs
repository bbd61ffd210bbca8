use anyhow::{Context, Result};
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::core::thermal::{AlertIntent, EngineHandle, EnginePhase, EngineRuntime, SeverityLevel, Window};
use crate::core::Config;
use crate::platform;
use crate::ui::{format_aggregate, format_snapshot_line, print_history_table, print_stats};

/// Rows shown in the `--summary` history table
const SUMMARY_ROWS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct MonitorOptions {
    json: bool,
    once: bool,
    summary: bool,
}

/// Run the thermal engine in the foreground until Ctrl+C
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(interval) = matches.get_one::<u64>("interval") {
        config.log_interval = *interval;
    }

    let options = MonitorOptions {
        json: matches.get_flag("json"),
        once: matches.get_flag("once"),
        summary: matches.get_flag("summary"),
    };

    let settings = config.engine_settings()?;
    let source = platform::build_source(&config.sensor)?;
    let actuator = platform::build_actuator(&config.fan);
    let sinks = platform::build_sinks(&config.alerts)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .thread_name("thermwatch-engine")
        .build()
        .context("Failed to start async runtime")?;

    let engine = {
        let _guard = runtime.enter();
        EngineRuntime::start(settings, source, actuator, sinks)?
    };
    let handle = engine.handle();

    let ctrlc_handle = handle.clone();
    let quiet = options.json;
    ctrlc::set_handler(move || {
        if !quiet {
            println!();
            println!("{}", "Stopping monitor...".yellow().bold());
        }
        ctrlc_handle.request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    if !options.json {
        println!("{}", "Thermal monitor".white().bold());
        println!(
            "{}",
            format!(
                "High at {:.1}°C, critical at {:.1}°C, sampling every {}s. Press Ctrl+C to stop.",
                config.thresholds.high_enter, config.thresholds.critical_enter, config.log_interval
            )
            .dimmed()
        );
        println!();
    }

    let stats = runtime.block_on(async move {
        watch_engine(&handle, options).await;
        engine.shutdown().await
    })?;

    if options.summary && !options.json {
        println!();
        print_stats(&stats, Utc::now());
    }

    Ok(())
}

async fn watch_engine(handle: &EngineHandle, options: MonitorOptions) {
    let mut snapshots = handle.snapshots();
    let mut alerts = handle.subscribe_alerts();
    // the first cycle may already be published before we get here
    let mut printed_cycles = 0;
    snapshots.mark_changed();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.phase == EnginePhase::Stopped {
                    break;
                }
                if snapshot.stats.cycles == printed_cycles {
                    continue;
                }
                printed_cycles = snapshot.stats.cycles;

                if options.json {
                    match serde_json::to_string(&json!({ "event": "sample", "snapshot": &*snapshot })) {
                        Ok(line) => println!("{}", line),
                        Err(e) => log::error!("Failed to serialize snapshot: {}", e),
                    }
                } else {
                    println!("{}", format_snapshot_line(&snapshot));
                }

                if options.once {
                    handle.request_shutdown();
                }
            }
            alert = alerts.recv() => {
                match alert {
                    Ok(intent) => print_alert(&intent, options.json),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Skipped {} alert notifications", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    if options.summary && !options.json {
        println!();
        print_history_table(&handle.history_recent(SUMMARY_ROWS));
        println!();
        println!(
            "{} {}",
            "Session:".white().bold(),
            format_aggregate(handle.aggregate(Window::Count(usize::MAX)).as_ref())
        );
    }
}

fn print_alert(intent: &AlertIntent, json: bool) {
    if json {
        match serde_json::to_string(&json!({ "event": "alert", "alert": intent })) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to serialize alert: {}", e),
        }
        return;
    }

    let line = format!("[{}] {}", intent.channel, intent.message);
    match intent.severity {
        SeverityLevel::Critical => println!("{}", line.red().bold()),
        _ => println!("{}", line.yellow().bold()),
    }
}

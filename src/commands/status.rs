use anyhow::Result;
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use serde_json::json;

use crate::core::thermal::{classify, SamplerAdapter, SeverityLevel};
use crate::core::Config;
use crate::platform;
use crate::ui::{format_clock, format_fan, format_severity, format_temperature};

/// Take a single reading and show how the engine would classify it
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let mut sampler = SamplerAdapter::new(platform::build_source(&config.sensor)?);
    let now = Utc::now();
    let reading = sampler.sample(now);

    let thresholds = &config.thresholds;
    let severity = match &reading {
        Ok(r) => classify(r.temperature, SeverityLevel::Normal, thresholds),
        Err(_) => SeverityLevel::Normal,
    };
    let fan_level = config.fan.mapping.level_for(severity);

    if matches.get_flag("json") {
        let value = json!({
            "timestamp": now,
            "source": sampler.source_name(),
            "temperature": reading.as_ref().ok().map(|r| r.temperature),
            "error": reading.as_ref().err().map(|e| e.to_string()),
            "severity": severity,
            "fan_level": fan_level,
            "thresholds": thresholds,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Thermal status".white().bold());
    println!("  {:<14} {}", "Time:", format_clock(now));
    println!("  {:<14} {}", "Source:", sampler.source_name());

    match &reading {
        Ok(r) => {
            println!(
                "  {:<14} {}",
                "Temperature:",
                format_temperature(Some(r.temperature), severity)
            );
            println!("  {:<14} {}", "Status:", format_severity(severity));
            println!("  {:<14} {}", "Fan:", format_fan(fan_level));
        }
        Err(e) => {
            println!("  {:<14} {}", "Temperature:", "unavailable".yellow());
            println!("  {:<14} {}", "Error:", e.to_string().red());
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "High {:.1}/{:.1}°C, critical {:.1}/{:.1}°C (enter/exit)",
            thresholds.high_enter,
            thresholds.high_exit,
            thresholds.critical_enter,
            thresholds.critical_exit
        )
        .dimmed()
    );

    Ok(())
}

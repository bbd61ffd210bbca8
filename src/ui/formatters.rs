use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};

use crate::core::thermal::{Aggregate, EngineSnapshot, EngineStats, FanLevel, Sample, SeverityLevel};

/// Severity label coloured like the dashboard (green / orange / red)
pub fn format_severity(severity: SeverityLevel) -> ColoredString {
    match severity {
        SeverityLevel::Normal => severity.label().green().bold(),
        SeverityLevel::High => severity.label().yellow().bold(),
        SeverityLevel::Critical => severity.label().red().bold(),
    }
}

pub fn format_temperature(temperature: Option<f32>, severity: SeverityLevel) -> ColoredString {
    let text = match temperature {
        Some(t) => format!("{:.1}°C", t),
        None => "--.-°C".to_string(),
    };
    match severity {
        SeverityLevel::Normal => text.green(),
        SeverityLevel::High => text.yellow(),
        SeverityLevel::Critical => text.red(),
    }
}

pub fn format_fan(level: FanLevel) -> ColoredString {
    if level.is_running() {
        level.label().cyan()
    } else {
        level.label().dimmed()
    }
}

/// Local time as HH:MM:SS
pub fn format_clock(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%H:%M:%S").to_string()
}

/// Human readable uptime, e.g. `2d 03:14:07`
pub fn format_uptime(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - since).num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// One status line per cycle for the monitor command
pub fn format_snapshot_line(snapshot: &EngineSnapshot) -> String {
    let time = snapshot
        .last_sample_time
        .map(format_clock)
        .unwrap_or_else(|| "--:--:--".to_string());

    let mut line = format!(
        "{}  {}  {:<8}  fan {}",
        time.dimmed(),
        format_temperature(snapshot.last_reading, snapshot.severity),
        format_severity(snapshot.severity),
        format_fan(snapshot.fan_level),
    );

    if snapshot.degraded {
        line.push_str(&format!("  {}", "sensor unavailable".yellow()));
    }
    line
}

pub fn format_aggregate(aggregate: Option<&Aggregate>) -> String {
    match aggregate {
        Some(agg) => format!(
            "min {:.1}°C  max {:.1}°C  avg {:.1}°C  ({} samples)",
            agg.min, agg.max, agg.mean, agg.count
        ),
        None => "no valid samples".dimmed().to_string(),
    }
}

pub fn print_stats(stats: &EngineStats, now: DateTime<Utc>) {
    let temp = |t: Option<f32>| t.map_or("-".to_string(), |v| format!("{:.1}°C", v));

    println!("{}", "Statistics".white().bold());
    println!("  {:<20} {}", "Uptime:", format_uptime(stats.started_at, now));
    println!("  {:<20} {}", "Cycles:", stats.cycles);
    println!("  {:<20} {}", "Degraded cycles:", stats.degraded_cycles);
    println!("  {:<20} {}", "Min temperature:", temp(stats.min_temp));
    println!("  {:<20} {}", "Max temperature:", temp(stats.max_temp));
    println!("  {:<20} {}", "Fan cycles:", stats.fan_cycles);
    println!(
        "  {:<20} {} triggered, {} delivered, {} failed",
        "Alerts:", stats.alerts_triggered, stats.alerts_delivered, stats.delivery_failures
    );
    if stats.actuation_failures > 0 {
        println!(
            "  {:<20} {}",
            "Fan failures:",
            stats.actuation_failures.to_string().red()
        );
    }
}

pub fn print_history_table(samples: &[Sample]) {
    if samples.is_empty() {
        println!("{}", "No temperature history available yet.".dimmed());
        return;
    }

    println!(
        "{}",
        format!("{:<10} {:>9}  {:<9} {:<5}", "TIME", "TEMP", "STATUS", "FAN")
            .white()
            .bold()
    );
    for sample in samples {
        let status = if sample.degraded {
            "DEGRADED".yellow().bold()
        } else {
            format_severity(sample.severity)
        };
        println!(
            "{:<10} {:>9}  {:<9} {:<5}",
            format_clock(sample.timestamp),
            format_temperature(sample.temperature, sample.severity).to_string(),
            status.to_string(),
            format_fan(sample.fan_level).to_string(),
        );
    }
}

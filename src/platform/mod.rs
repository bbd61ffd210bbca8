// Hardware and I/O adapters plugged into the thermal engine

pub mod fan;
pub mod sensors;
pub mod sinks;

pub use fan::{GpioFan, SimulatedFan};
pub use sensors::{SysinfoSource, ThermalZoneSource, VcgencmdSource};
pub use sinks::{CommandSink, LogSink, WebhookSink};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::config::{ActuatorKind, AlertsConfig, ChannelKind, FanConfig, SensorConfig, SensorKind};
use crate::core::thermal::{ChannelId, FanActuator, NotificationSink, TemperatureSource};

/// Build the configured temperature source
pub fn build_source(config: &SensorConfig) -> Result<Box<dyn TemperatureSource>> {
    let source: Box<dyn TemperatureSource> = match config.kind {
        SensorKind::Auto => match VcgencmdSource::locate() {
            Some(vcgencmd) => Box::new(vcgencmd),
            None => {
                log::info!("vcgencmd not found, using thermal zone {}", config.zone);
                Box::new(ThermalZoneSource::new(config.zone))
            }
        },
        SensorKind::Vcgencmd => {
            Box::new(VcgencmdSource::locate().context("vcgencmd was not found on PATH")?)
        }
        SensorKind::ThermalZone => Box::new(ThermalZoneSource::new(config.zone)),
        SensorKind::Sysinfo => Box::new(SysinfoSource::new(config.label.clone())),
    };

    log::debug!("Using temperature source: {}", source.name());
    Ok(source)
}

/// Build the configured fan actuator.
///
/// GPIO initialization failures fall back to simulation mode, like the monitor
/// always did when no fan hardware is present.
pub fn build_actuator(config: &FanConfig) -> Box<dyn FanActuator> {
    match config.actuator {
        ActuatorKind::Simulated => Box::new(SimulatedFan::new()),
        ActuatorKind::Gpio => match GpioFan::open(config.pin) {
            Ok(fan) => Box::new(fan),
            Err(e) => {
                log::error!("GPIO initialization failed: {:#}", e);
                log::warn!("Running fan control in simulation mode");
                Box::new(SimulatedFan::new())
            }
        },
    }
}

/// Build one sink per configured channel
pub fn build_sinks(config: &AlertsConfig) -> Result<Vec<(ChannelId, Arc<dyn NotificationSink>)>> {
    let timeout = Duration::from_millis(config.delivery_timeout_ms);

    config
        .channels
        .iter()
        .map(|channel| {
            let sink: Arc<dyn NotificationSink> = match &channel.kind {
                ChannelKind::Log => Arc::new(LogSink),
                ChannelKind::Webhook { url } => Arc::new(
                    WebhookSink::new(url, timeout)
                        .with_context(|| format!("Invalid channel '{}'", channel.name))?,
                ),
                ChannelKind::Command { program, args } => {
                    Arc::new(CommandSink::new(program.clone(), args.clone()))
                }
            };
            Ok((ChannelId::new(channel.name.clone()), sink))
        })
        .collect()
}

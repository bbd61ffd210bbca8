//! Fan actuators.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::thermal::{FanActuator, FanLevel};

const SYSFS_GPIO: &str = "/sys/class/gpio";

/// No hardware attached; only logs the requested level
#[derive(Debug, Default)]
pub struct SimulatedFan {
    current: FanLevel,
}

impl SimulatedFan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FanLevel {
        self.current
    }
}

impl FanActuator for SimulatedFan {
    fn set_fan_level(&mut self, level: FanLevel) -> Result<()> {
        log::info!("[simulation] fan {} -> {}", self.current, level);
        self.current = level;
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// On/off fan on a sysfs GPIO output pin. Any level above Idle switches it on.
#[derive(Debug)]
pub struct GpioFan {
    pin: u8,
    value_path: PathBuf,
}

impl GpioFan {
    pub fn open(pin: u8) -> Result<Self> {
        Self::open_at(pin, Path::new(SYSFS_GPIO))
    }

    /// Open a pin under a custom sysfs root, exporting it if needed
    pub fn open_at(pin: u8, gpio_root: &Path) -> Result<Self> {
        let pin_dir = gpio_root.join(format!("gpio{}", pin));

        if !pin_dir.exists() {
            fs::write(gpio_root.join("export"), pin.to_string())
                .with_context(|| format!("Failed to export GPIO pin {}", pin))?;
        }

        fs::write(pin_dir.join("direction"), "out")
            .with_context(|| format!("Failed to configure GPIO pin {} as output", pin))?;

        log::info!("GPIO initialized successfully. Fan connected to pin {}", pin);

        Ok(Self {
            pin,
            value_path: pin_dir.join("value"),
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl FanActuator for GpioFan {
    fn set_fan_level(&mut self, level: FanLevel) -> Result<()> {
        let value = if level.is_running() { "1" } else { "0" };
        fs::write(&self.value_path, value)
            .with_context(|| format!("Failed to write GPIO pin {}", self.pin))
    }

    fn name(&self) -> &str {
        "gpio"
    }
}

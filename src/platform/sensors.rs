//! Local temperature sources.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sysinfo::Components;

use crate::core::thermal::TemperatureSource;

static VCGENCMD_TEMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"temp=(-?\d+(?:\.\d+)?)'C").expect("valid vcgencmd regex"));

/// Parse `vcgencmd measure_temp` output, e.g. `temp=48.3'C`
pub fn parse_vcgencmd_output(output: &str) -> Result<f32> {
    let caps = VCGENCMD_TEMP
        .captures(output)
        .with_context(|| format!("Unexpected vcgencmd output: {:?}", output.trim()))?;
    let value = caps[1]
        .parse::<f32>()
        .with_context(|| format!("Invalid temperature in vcgencmd output: {:?}", &caps[1]))?;
    Ok(value)
}

/// Parse a sysfs thermal zone value (millidegrees Celsius)
pub fn parse_millidegrees(raw: &str) -> Result<f32> {
    let milli: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid thermal zone value: {:?}", raw.trim()))?;
    Ok(milli as f32 / 1000.0)
}

/// Raspberry Pi firmware sensor via `vcgencmd measure_temp`
pub struct VcgencmdSource {
    binary: PathBuf,
}

impl VcgencmdSource {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Find `vcgencmd` on PATH
    pub fn locate() -> Option<Self> {
        which::which("vcgencmd").ok().map(Self::new)
    }
}

impl TemperatureSource for VcgencmdSource {
    fn read_celsius(&mut self) -> Result<f32> {
        let output = Command::new(&self.binary)
            .arg("measure_temp")
            .output()
            .with_context(|| format!("Failed to run {:?}", self.binary))?;

        if !output.status.success() {
            bail!(
                "vcgencmd exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let temp = parse_vcgencmd_output(&String::from_utf8_lossy(&output.stdout))?;
        log::debug!("CPU temperature: {}°C", temp);
        Ok(temp)
    }

    fn name(&self) -> &str {
        "vcgencmd"
    }
}

/// Linux sysfs thermal zone (`/sys/class/thermal/thermal_zoneN/temp`)
pub struct ThermalZoneSource {
    path: PathBuf,
}

impl ThermalZoneSource {
    pub fn new(zone: u32) -> Self {
        Self::with_path(format!("/sys/class/thermal/thermal_zone{}/temp", zone))
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSource for ThermalZoneSource {
    fn read_celsius(&mut self) -> Result<f32> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        parse_millidegrees(&raw)
    }

    fn name(&self) -> &str {
        "thermal-zone"
    }
}

/// Hottest hardware component reported by sysinfo, optionally filtered by label
pub struct SysinfoSource {
    components: Components,
    label_filter: Option<String>,
}

impl SysinfoSource {
    pub fn new(label_filter: Option<String>) -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
            label_filter: label_filter.map(|l| l.to_lowercase()),
        }
    }
}

impl TemperatureSource for SysinfoSource {
    fn read_celsius(&mut self) -> Result<f32> {
        self.components.refresh(true);

        let hottest = self
            .components
            .iter()
            .filter(|comp| match &self.label_filter {
                Some(filter) => comp.label().to_lowercase().contains(filter.as_str()),
                None => true,
            })
            .filter_map(|comp| comp.temperature())
            .filter(|t| t.is_finite())
            .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.max(t))));

        match hottest {
            Some(t) => Ok(t),
            None => bail!("No matching temperature sensor found"),
        }
    }

    fn name(&self) -> &str {
        "sysinfo"
    }
}

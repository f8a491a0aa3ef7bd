//! Status indicator adapters

use super::traits::Indicator;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// LED exposed through `/sys/class/leds/<name>/brightness`
#[derive(Debug, Clone)]
pub struct SysfsLed {
    brightness: PathBuf,
}

impl SysfsLed {
    /// `path` is either the LED directory or its brightness file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let brightness = if path.ends_with("brightness") {
            path
        } else {
            path.join("brightness")
        };
        Self { brightness }
    }
}

impl Indicator for SysfsLed {
    fn set(&mut self, on: bool) -> Result<()> {
        std::fs::write(&self.brightness, if on { "1" } else { "0" })
            .with_context(|| format!("writing {}", self.brightness.display()))
    }
}

/// Indicator for hosts without an LED; state changes are only logged
#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl LogIndicator {
    #[cfg(test)]
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Indicator for LogIndicator {
    fn set(&mut self, on: bool) -> Result<()> {
        self.on = on;
        info!("[LED] {}", if on { "ON" } else { "OFF" });
        Ok(())
    }
}

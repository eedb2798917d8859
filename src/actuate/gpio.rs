#![cfg(feature = "gpio-rppal")]

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use rppal::gpio::{Gpio, OutputPin};

use crate::actuate::OutputDriver;
use crate::ClassId;

/// Raspberry Pi GPIO driver via rppal.
///
/// Lines are claimed at startup and driven low; they are released (and
/// driven low again) when the driver is dropped.
pub struct GpioPins {
    lines: BTreeMap<ClassId, OutputPin>,
}

impl GpioPins {
    pub fn new(mapping: &BTreeMap<ClassId, u8>) -> Result<Self> {
        let gpio = Gpio::new().context("open GPIO controller")?;
        let mut lines = BTreeMap::new();
        for (class, pin) in mapping {
            let line = gpio
                .get(*pin)
                .with_context(|| format!("claim GPIO pin {} for {}", pin, class))?
                .into_output_low();
            log::info!("GPIO pin {} mapped to {}", pin, class);
            lines.insert(*class, line);
        }
        Ok(Self { lines })
    }

    fn line(&mut self, class: ClassId) -> Result<&mut OutputPin> {
        self.lines
            .get_mut(&class)
            .ok_or_else(|| anyhow!("no GPIO pin mapped for class {}", class))
    }
}

impl OutputDriver for GpioPins {
    fn activate(&mut self, class: ClassId) -> Result<()> {
        self.line(class)?.set_high();
        Ok(())
    }

    fn deactivate(&mut self, class: ClassId) -> Result<()> {
        self.line(class)?.set_low();
        Ok(())
    }
}

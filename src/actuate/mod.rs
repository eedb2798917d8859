//! Output channel drivers.
//!
//! The decision engine only calls `activate`/`deactivate` on state
//! transitions, but drivers stay idempotent anyway: asserting an already
//! active channel is harmless.

#[cfg(feature = "gpio-rppal")]
pub mod gpio;

#[cfg(feature = "gpio-rppal")]
pub use gpio::GpioPins;

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::ClassId;

/// Per-class digital output driver.
pub trait OutputDriver: Send {
    /// Assert the channel mapped to `class`.
    fn activate(&mut self, class: ClassId) -> Result<()>;

    /// Release the channel mapped to `class`.
    fn deactivate(&mut self, class: ClassId) -> Result<()>;
}

/// Simulated pin driver.
///
/// Tracks pin levels and a full call history, with injectable one-shot
/// failures. This is the default driver on platforms without GPIO and the
/// workhorse of the test suite.
pub struct MemoryPins {
    pins: BTreeMap<ClassId, bool>,
    activations: Vec<ClassId>,
    deactivations: Vec<ClassId>,
    fail_next_activate: bool,
    fail_next_deactivate: bool,
}

impl MemoryPins {
    pub fn new(mapping: &BTreeMap<ClassId, u8>) -> Self {
        Self {
            pins: mapping.keys().map(|class| (*class, false)).collect(),
            activations: Vec::new(),
            deactivations: Vec::new(),
            fail_next_activate: false,
            fail_next_deactivate: false,
        }
    }

    /// Current level of a class's pin.
    pub fn pin_state(&self, class: ClassId) -> bool {
        self.pins.get(&class).copied().unwrap_or(false)
    }

    /// Number of successful activate calls for a class.
    pub fn activation_count(&self, class: ClassId) -> usize {
        self.activations.iter().filter(|c| **c == class).count()
    }

    /// Number of successful deactivate calls for a class.
    pub fn deactivation_count(&self, class: ClassId) -> usize {
        self.deactivations.iter().filter(|c| **c == class).count()
    }

    /// Make the next activate call fail once.
    pub fn fail_next_activate(&mut self) {
        self.fail_next_activate = true;
    }

    /// Make the next deactivate call fail once.
    pub fn fail_next_deactivate(&mut self) {
        self.fail_next_deactivate = true;
    }
}

impl OutputDriver for MemoryPins {
    fn activate(&mut self, class: ClassId) -> Result<()> {
        if self.fail_next_activate {
            self.fail_next_activate = false;
            return Err(anyhow!("injected activate failure for {}", class));
        }
        let Some(level) = self.pins.get_mut(&class) else {
            return Err(anyhow!("no pin mapped for class {}", class));
        };
        *level = true;
        self.activations.push(class);
        Ok(())
    }

    fn deactivate(&mut self, class: ClassId) -> Result<()> {
        if self.fail_next_deactivate {
            self.fail_next_deactivate = false;
            return Err(anyhow!("injected deactivate failure for {}", class));
        }
        let Some(level) = self.pins.get_mut(&class) else {
            return Err(anyhow!("no pin mapped for class {}", class));
        };
        *level = false;
        self.deactivations.push(class);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> BTreeMap<ClassId, u8> {
        let mut map = BTreeMap::new();
        map.insert(ClassId::Squirrel, 18);
        map
    }

    #[test]
    fn activate_is_idempotent() {
        let mut pins = MemoryPins::new(&mapping());
        pins.activate(ClassId::Squirrel).unwrap();
        pins.activate(ClassId::Squirrel).unwrap();
        assert!(pins.pin_state(ClassId::Squirrel));
        assert_eq!(pins.activation_count(ClassId::Squirrel), 2);

        pins.deactivate(ClassId::Squirrel).unwrap();
        assert!(!pins.pin_state(ClassId::Squirrel));
    }

    #[test]
    fn unmapped_class_is_an_error() {
        let mut pins = MemoryPins::new(&mapping());
        assert!(pins.activate(ClassId::Raccoon).is_err());
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut pins = MemoryPins::new(&mapping());
        pins.fail_next_activate();
        assert!(pins.activate(ClassId::Squirrel).is_err());
        assert!(pins.activate(ClassId::Squirrel).is_ok());
        assert_eq!(pins.activation_count(ClassId::Squirrel), 1);
    }
}

//! The process's package descriptor
//!
//! Single owner: the slot creates the descriptor on first access from any
//! call site, lends it out by reference, and gives it up exactly once at
//! teardown. Access after teardown is an error; the descriptor is never
//! recreated.

use std::fmt;

use tracing::{debug, info};

use crate::descriptor::PackageDescriptor;
use crate::error::PackageError;

enum SlotState {
    Vacant,
    Live(PackageDescriptor),
    Released,
}

pub struct PackageSlot {
    state: SlotState,
    factory: Box<dyn Fn() -> PackageDescriptor>,
    creations: u32,
}

impl PackageSlot {
    /// A slot that builds its descriptor with `factory` on first access.
    pub fn new(factory: impl Fn() -> PackageDescriptor + 'static) -> Self {
        Self {
            state: SlotState::Vacant,
            factory: Box::new(factory),
            creations: 0,
        }
    }

    /// A slot discovering the package from this process's arguments and
    /// working directory.
    pub fn from_process() -> Self {
        Self::new(|| {
            let cwd = std::env::current_dir().unwrap_or_default();
            PackageDescriptor::discover(std::env::args_os().skip(1), &cwd)
        })
    }

    pub fn get_or_create(&mut self) -> Result<&PackageDescriptor, PackageError> {
        if matches!(self.state, SlotState::Vacant) {
            let package = (self.factory)();
            self.creations += 1;
            debug!(root = %package.path().display(), "package descriptor created");
            self.state = SlotState::Live(package);
        }
        match &self.state {
            SlotState::Live(package) => Ok(package),
            SlotState::Released => Err(PackageError::Released),
            SlotState::Vacant => Err(PackageError::NoPackage),
        }
    }

    /// The descriptor if it currently exists. Never creates one.
    pub fn get(&self) -> Option<&PackageDescriptor> {
        match &self.state {
            SlotState::Live(package) => Some(package),
            _ => None,
        }
    }

    /// Tear the descriptor down. Later accesses fail with [`PackageError::Released`].
    pub fn release(&mut self) -> Option<PackageDescriptor> {
        match std::mem::replace(&mut self.state, SlotState::Released) {
            SlotState::Live(package) => {
                info!(root = %package.path().display(), "package descriptor released");
                Some(package)
            }
            _ => None,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, SlotState::Released)
    }

    /// How many descriptors this slot has built. Never above one.
    pub fn creations(&self) -> u32 {
        self.creations
    }
}

impl fmt::Debug for PackageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            SlotState::Vacant => "vacant",
            SlotState::Live(_) => "live",
            SlotState::Released => "released",
        };
        f.debug_struct("PackageSlot")
            .field("state", &state)
            .field("creations", &self.creations)
            .finish()
    }
}

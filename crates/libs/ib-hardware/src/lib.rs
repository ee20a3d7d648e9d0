//! Hardware and system facts for the installer frontend.
//!
//! Every detector observes the machine through a [`Probe`] and never fails:
//! a missing command or unreadable file degrades to a conservative default.
//! [`detect`] gathers all facts at once.
//!
//! ```rust,no_run
//! use ib_hardware::{SystemProbe, detect};
//!
//! let facts = detect(&SystemProbe);
//! println!("{} GB RAM, suggested swap {} GB", facts.ram_gb, facts.suggested_swap_gb);
//! ```

pub mod detect;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod probe;

#[cfg(test)]
mod testing;

pub use detect::{Facts, block_devices, detect};
pub use probe::{Probe, SystemProbe};

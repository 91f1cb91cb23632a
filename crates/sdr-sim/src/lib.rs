//! SDR Device Simulation Library
//!
//! This crate provides a simulated device tree for exercising the property
//! tree, the daughterboard subsystem and the multi-board layer without
//! physical hardware. It includes:
//!
//! - **SimDevice**: a device root holding any number of motherboards
//! - **SimMboard**: clocking, PPS timekeeping, sub-device specs, DSP chains
//! - **SimXcvr**: a transceiver daughterboard with gain stages and a shared
//!   antenna switch
//! - **SimClock**: a clock that only moves when slept on or advanced
//!
//! # Example
//!
//! ```rust
//! use sdr_props::{Prop, TimeSpec};
//! use sdr_sim::SimDevice;
//! use std::time::Duration;
//!
//! let device = SimDevice::with_mboards(2).unwrap();
//! let mb = device.root().child(Prop::Mboard.named("1")).unwrap();
//!
//! mb.set(Prop::TimeNow, TimeSpec::from_secs(10.0)).unwrap();
//! device.clock().advance(Duration::from_secs(1));
//!
//! let now: TimeSpec = mb.get_as(Prop::TimeNow).unwrap();
//! assert_eq!(now, TimeSpec::from_secs(11.0));
//! ```

pub mod clock;
pub mod dboard;
pub mod device;
pub mod dsp;
pub mod iface;
pub mod mboard;
pub mod xcvr;

pub use clock::SimClock;
pub use dboard::{SimDboardNode, SubdevGainGroup};
pub use device::SimDevice;
pub use dsp::SimDsp;
pub use iface::{GpioOp, SimDboardIface, SimMboardIface};
pub use mboard::{SimMboard, SimMboardConfig, DBOARD_SLOT};
pub use xcvr::{SimXcvr, SIM_XCVR_ID};

use sdr_dboard::DboardRegistry;

/// Registry with the built-in boards plus the simulated transceiver
pub fn sim_registry() -> DboardRegistry {
    let mut registry = DboardRegistry::with_defaults();
    registry.register(SIM_XCVR_ID, SimXcvr::ctor(), ["0"]);
    registry
}

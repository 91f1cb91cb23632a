//! Daughterboard Subsystem
//!
//! This crate turns daughterboard identity codes read from a motherboard into
//! addressable sub-device nodes:
//!
//! - [`DboardRegistry`] maps an identity code to a named constructor and the
//!   sub-device names that constructor supports
//! - [`DboardManager`] resolves the RX and TX codes of one motherboard,
//!   initializes the daughterboard GPIO banks and builds the drivers
//! - [`SubdevProxy`] exposes the RX or TX half of a driver as a property node
//!
//! A single physical board that serves both directions (a transceiver) is
//! built once and wrapped by two proxies, so both directions observe the same
//! board state.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use sdr_dboard::{DboardId, DboardManager, DboardRegistry};
//! use sdr_props::{DboardIface, Prop};
//!
//! # fn iface() -> Rc<dyn DboardIface> { unimplemented!() }
//! let registry = DboardRegistry::with_defaults();
//! let manager = DboardManager::new(&registry, DboardId::BASIC_RX, DboardId::BASIC_TX, iface())?;
//!
//! for name in manager.rx_subdev_names() {
//!     let subdev = manager.rx_subdev(&name)?;
//!     println!("{}", subdev.get_as::<String>(Prop::Name)?);
//! }
//! # Ok::<(), sdr_dboard::DboardError>(())
//! ```

pub mod basic;
pub mod driver;
pub mod error;
pub mod id;
pub mod manager;
pub mod proxy;
pub mod registry;

pub use basic::BasicDboard;
pub use driver::{CtorArgs, Dboard, DboardCtor};
pub use error::DboardError;
pub use id::DboardId;
pub use manager::DboardManager;
pub use proxy::{SharedDboard, SubdevProxy};
pub use registry::{CtorEntry, DboardRegistry};

//! Multi-board SDR Facade
//!
//! This crate presents a device made of several motherboards, each carrying
//! RX and TX daughterboards, as one radio:
//!
//! - **Channel resolution**: logical channels are numbered across every
//!   board's sub-device spec ([`chan_to_mcp`])
//! - **Facade**: per-board and per-channel accessors for clocking, time,
//!   streaming, rate, frequency, gain, antenna, bandwidth and sensors
//!   ([`MultiUsrp`])
//! - **Time synchronization**: aligning every board's time on a shared PPS
//!   edge ([`MultiUsrp::set_time_unknown_pps`])
//!
//! Hardware that cannot meet a request exactly is reported through
//! [`Diagnostic`]s rather than errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use sdr_multi::{MultiUsrp, Select, TuneRequest};
//! use sdr_props::{Direction, Node, TimeSpec};
//!
//! # fn device_root() -> Node { unimplemented!() }
//! let mut usrp = MultiUsrp::new(device_root());
//!
//! usrp.set_rate(Direction::Rx, 1e6, Select::All)?;
//! usrp.set_freq(Direction::Rx, &TuneRequest::new(915e6), Select::One(0))?;
//! usrp.set_time_unknown_pps(TimeSpec::from_secs(0.0))?;
//!
//! for diagnostic in usrp.drain_diagnostics() {
//!     println!("{}", diagnostic);
//! }
//! # Ok::<(), sdr_multi::MultiError>(())
//! ```

pub mod channel;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod multi;
pub mod time_sync;
pub mod tune;

pub use channel::{chan_to_mcp, McPair, Select};
pub use config::MultiConfig;
pub use diagnostics::Diagnostic;
pub use error::MultiError;
pub use multi::MultiUsrp;
pub use time_sync::SyncState;
pub use tune::{DefaultTuner, TuneRequest, TuneResult, Tuner};

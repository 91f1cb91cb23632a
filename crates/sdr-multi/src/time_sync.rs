//! PPS time synchronization
//!
//! Aligns the time of every board to one instant using the shared PPS edge:
//!
//! 1. wait for board 0 to capture an edge, so the next one is a full second
//!    away
//! 2. arm every board with the new time for the next edge
//! 3. sleep past that edge
//! 4. compare every board against board 0
//!
//! Board 0 is the reference. A board behind it, or ahead of it by more than
//! the sync bound, is reported; the procedure itself still succeeds.

use tracing::{debug, info};

use sdr_props::TimeSpec;

use crate::diagnostics::Diagnostic;
use crate::error::MultiError;
use crate::multi::MultiUsrp;

/// Host-clock bound on the PPS wait, as a multiple of the board-time bound
const HOST_GUARD_FACTOR: f64 = 2.0;

/// Progress of the synchronization procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Waiting for board 0 to capture a PPS edge
    WaitForEdge,
    /// Writing the time for the next edge to every board
    ArmNextEdge,
    /// Sleeping past the edge
    Settle,
    /// Comparing board times
    Verify,
    /// Every board agrees with board 0
    Synchronized,
    /// At least one board disagrees; diagnostics were reported
    DeviationWarned,
}

impl MultiUsrp {
    /// Set the time of every board on a PPS edge whose timing is unknown
    ///
    /// Returns the final state: [`SyncState::Synchronized`] or
    /// [`SyncState::DeviationWarned`]. Fails with
    /// [`MultiError::PpsTimeout`] if board 0 sees no edge in time, in which
    /// case nothing has been armed.
    pub fn set_time_unknown_pps(&mut self, time: TimeSpec) -> Result<SyncState, MultiError> {
        enter(SyncState::WaitForEdge);
        self.wait_for_pps_edge()?;

        enter(SyncState::ArmNextEdge);
        self.set_time_next_pps(time)?;

        enter(SyncState::Settle);
        self.clock.sleep(self.config().settle());

        enter(SyncState::Verify);
        let deviations = self.time_deviations()?;
        let state = if deviations.is_empty() {
            info!("Time sync: all boards at {}", time);
            SyncState::Synchronized
        } else {
            for deviation in deviations {
                self.report(deviation);
            }
            SyncState::DeviationWarned
        };
        enter(state);
        Ok(state)
    }

    /// Whether every board agrees with board 0 within the sync bound
    ///
    /// Reads the board times only; nothing is reported or changed.
    pub fn is_time_synchronized(&self) -> Result<bool, MultiError> {
        Ok(self.time_deviations()?.is_empty())
    }

    /// Poll board 0 until its last-PPS time changes
    fn wait_for_pps_edge(&self) -> Result<(), MultiError> {
        let timeout = self.config().pps_timeout().as_secs_f64();
        let poll_interval = self.config().pps_poll_interval();

        let host_start = self.clock.elapsed();
        let time_start = self.time_now(0)?;
        let pps_start = self.time_last_pps(0)?;
        let mut polls = 0u64;

        loop {
            if self.time_last_pps(0)? != pps_start {
                debug!("PPS edge captured after {} polls", polls);
                return Ok(());
            }

            let waited = (self.time_now(0)? - time_start).real_secs();
            let host_waited = self
                .clock
                .elapsed()
                .saturating_sub(host_start)
                .as_secs_f64();
            if waited > timeout || host_waited > timeout * HOST_GUARD_FACTOR {
                return Err(MultiError::PpsTimeout {
                    waited: waited.max(host_waited),
                });
            }

            self.clock.sleep(poll_interval);
            polls += 1;
        }
    }

    /// Boards behind board 0, or ahead of it by more than the bound
    fn time_deviations(&self) -> Result<Vec<Diagnostic>, MultiError> {
        let bound = self.config().sync_bound_secs;
        let mut deviations = Vec::new();
        for m in 1..self.num_mboards()? {
            let time_0 = self.time_now(0)?;
            let time_m = self.time_now(m)?;
            if time_m < time_0 || (time_m - time_0).real_secs() > bound {
                deviations.push(Diagnostic::TimeDeviation {
                    mboard: m,
                    board0_secs: time_0.real_secs(),
                    board_secs: time_m.real_secs(),
                });
            }
        }
        Ok(deviations)
    }
}

fn enter(state: SyncState) {
    info!("Time sync: {:?}", state);
}

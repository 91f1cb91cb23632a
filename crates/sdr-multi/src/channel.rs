//! Channel resolution
//!
//! Logical channels are numbered across all motherboards: board 0 owns the
//! first `spec_0.len()` channels, board 1 the next `spec_1.len()`, and so
//! on. Resolution is recomputed from the current sub-device specs on every
//! call, so a spec change takes effect immediately.

/// A board-local channel: motherboard index plus channel on that board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct McPair {
    /// Motherboard index
    pub mboard: usize,
    /// Channel index within the motherboard's sub-device spec
    pub chan: usize,
}

/// Map a logical channel to a motherboard and local channel
///
/// `spec_sizes[m]` is the channel count of board `m`. An out-of-range
/// channel yields `mboard == spec_sizes.len()`; callers must check.
pub fn chan_to_mcp(chan: usize, spec_sizes: &[usize]) -> McPair {
    let mut mcp = McPair { mboard: 0, chan };
    for &size in spec_sizes {
        if mcp.chan < size {
            break;
        }
        mcp.chan -= size;
        mcp.mboard += 1;
    }
    mcp
}

/// Target of a fan-out operation: every board / channel, or just one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Select {
    /// Every board or channel, in index order
    #[default]
    All,
    /// A single board or channel
    One(usize),
}

impl Select {
    /// Indices addressed out of `count`, in order
    ///
    /// `One` is passed through unchecked; the accessor it reaches reports an
    /// invalid index.
    pub fn indices(self, count: usize) -> Vec<usize> {
        match self {
            Select::All => (0..count).collect(),
            Select::One(index) => vec![index],
        }
    }
}

impl From<usize> for Select {
    fn from(index: usize) -> Self {
        Select::One(index)
    }
}

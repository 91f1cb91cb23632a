//! Daughterboard constructor registry
//!
//! Maps identity codes to constructors. Built-in boards are seeded once;
//! anything registered afterwards overwrites the entry for its code, which is
//! how externally supplied drivers replace the defaults.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::basic::BasicDboard;
use crate::driver::DboardCtor;
use crate::error::DboardError;
use crate::id::DboardId;

/// Constructor entry for one identity code
#[derive(Debug, Clone)]
pub struct CtorEntry {
    /// Identity code this entry serves
    pub id: DboardId,
    /// Driver constructor
    pub ctor: DboardCtor,
    /// Sub-devices the constructor is built for, in order
    pub subdev_names: Vec<String>,
}

/// Registry of daughterboard constructors
///
/// Construct one at startup and hand it to whatever builds managers. There is
/// no unregister: entries only ever get added or replaced.
#[derive(Debug, Default)]
pub struct DboardRegistry {
    entries: HashMap<DboardId, CtorEntry>,
    seeded: bool,
}

impl DboardRegistry {
    /// Create an empty, unseeded registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in boards
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.seed_defaults();
        registry
    }

    /// Whether the built-in boards have been seeded
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Seed the built-in boards (runs at most once)
    ///
    /// A missing daughterboard is served by the basic RX board so that the
    /// slot still yields a usable pass-through channel.
    pub fn seed_defaults(&mut self) {
        if self.seeded {
            return;
        }
        self.seeded = true;

        let basic_rx = BasicDboard::rx_ctor();
        let basic_tx = BasicDboard::tx_ctor();

        self.insert(DboardId::NONE, basic_tx.clone(), vec![String::new()]);
        self.insert(DboardId::NONE, basic_rx.clone(), vec!["ab".into()]);
        self.insert(DboardId::BASIC_TX, basic_tx, vec![String::new()]);
        self.insert(
            DboardId::BASIC_RX,
            basic_rx,
            vec!["a".into(), "b".into(), "ab".into()],
        );

        debug!("Seeded {} built-in dboard ids", self.entries.len());
    }

    /// Register a constructor for an identity code
    ///
    /// Seeds the built-in boards first, so a registration made at any time
    /// overrides the default for its code. Re-registering a code replaces
    /// the previous entry.
    pub fn register<I, S>(&mut self, id: DboardId, ctor: DboardCtor, subdev_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_defaults();
        let names: Vec<String> = subdev_names.into_iter().map(Into::into).collect();
        if let Some(previous) = self.entries.get(&id) {
            info!(
                "Overriding dboard id {}: {} -> {}",
                id,
                previous.ctor.name(),
                ctor.name()
            );
        }
        self.insert(id, ctor, names);
    }

    /// Look up the constructor entry for an identity code
    pub fn resolve(&self, id: DboardId) -> Result<&CtorEntry, DboardError> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(DboardError::UnknownId { id })?;
        debug!("Resolved dboard id {} to {}", id, entry.ctor.name());
        Ok(entry)
    }

    /// Whether an identity code has an entry
    pub fn contains(&self, id: DboardId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registered identity codes, ascending
    pub fn ids(&self) -> Vec<DboardId> {
        let mut ids: Vec<DboardId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    fn insert(&mut self, id: DboardId, ctor: DboardCtor, subdev_names: Vec<String>) {
        self.entries.insert(
            id,
            CtorEntry {
                id,
                ctor,
                subdev_names,
            },
        );
    }
}

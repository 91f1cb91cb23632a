//! Integration tests for the daughterboard manager
//!
//! These tests verify:
//! - Slot GPIO initialization order and values
//! - Transceiver boards sharing one instance across directions
//! - Separate RX / TX boards staying independent
//! - Name lookup and identity code failures
//! - Registry override semantics

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sdr_dboard::{
    CtorArgs, Dboard, DboardCtor, DboardError, DboardId, DboardManager, DboardRegistry,
};
use sdr_props::{
    AtrReg, DboardIface, Direction, GpioBank, Prop, PropError, PropKey, PropValue,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub type OpLog = Rc<RefCell<Vec<String>>>;

    /// Slot interface that records every call into a shared log
    pub struct RecordingIface {
        pub log: OpLog,
    }

    impl DboardIface for RecordingIface {
        fn set_gpio_ddr(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError> {
            self.log
                .borrow_mut()
                .push(format!("ddr {:?} {:04x}/{:04x}", bank, value, mask));
            Ok(())
        }

        fn write_gpio(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError> {
            self.log
                .borrow_mut()
                .push(format!("write {:?} {:04x}/{:04x}", bank, value, mask));
            Ok(())
        }

        fn read_gpio(&self, _bank: GpioBank) -> Result<u16, PropError> {
            Ok(0)
        }

        fn set_atr_reg(&self, bank: GpioBank, atr: AtrReg) -> Result<(), PropError> {
            self.log.borrow_mut().push(format!(
                "atr {:?} {:04x}/{:04x}/{:04x}",
                bank, atr.rx_value, atr.tx_value, atr.mask
            ));
            Ok(())
        }
    }

    /// Driver storing every write in one map shared by both directions
    pub struct MemoryDboard {
        pub label: String,
        pub values: BTreeMap<PropKey, PropValue>,
    }

    impl MemoryDboard {
        fn read(&self, key: &PropKey) -> Result<PropValue, PropError> {
            if key.prop == Prop::Name {
                return Ok(self.label.as_str().into());
            }
            self.values
                .get(key)
                .cloned()
                .ok_or_else(|| PropError::UnknownKey(key.to_string()))
        }
    }

    impl Dboard for MemoryDboard {
        fn rx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
            self.read(key)
        }

        fn rx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
            self.values.insert(key.clone(), value);
            Ok(())
        }

        fn tx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
            self.read(key)
        }

        fn tx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
            self.values.insert(key.clone(), value);
            Ok(())
        }
    }

    /// Constructor for [`MemoryDboard`] that logs each build
    pub fn memory_ctor(name: &'static str, log: OpLog) -> DboardCtor {
        DboardCtor::new(name, move |args: CtorArgs| {
            log.borrow_mut()
                .push(format!("ctor {} {}", name, args.subdev_name));
            Ok(Box::new(MemoryDboard {
                label: format!("{}:{}", name, args.subdev_name),
                values: BTreeMap::new(),
            }) as Box<dyn Dboard>)
        })
    }

    pub fn failing_ctor(name: &'static str) -> DboardCtor {
        DboardCtor::new(name, move |args: CtorArgs| {
            Err(DboardError::CtorFailed {
                ctor: name.to_string(),
                subdev: args.subdev_name,
                reason: "synthesizer did not respond".into(),
            })
        })
    }

    pub fn recording_iface() -> (Rc<dyn DboardIface>, OpLog) {
        let log: OpLog = Rc::new(RefCell::new(Vec::new()));
        (Rc::new(RecordingIface { log: log.clone() }), log)
    }

    pub const XCVR_ID: DboardId = DboardId(0x0061);
    pub const RX_ID: DboardId = DboardId(0x0070);
    pub const TX_ID: DboardId = DboardId(0x0071);
}

use helpers::*;

// ============================================================================
// GPIO Initialization
// ============================================================================

#[test]
fn test_gpio_initialized_before_ctor() {
    let (iface, log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(XCVR_ID, memory_ctor("xcvr", log.clone()), ["0"]);

    DboardManager::new(&registry, XCVR_ID, XCVR_ID, iface).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "ddr Rx ffff/ffff",
            "ddr Tx ffff/ffff",
            "write Rx 0000/ffff",
            "write Tx 0000/ffff",
            "atr Rx 0000/0000/0000",
            "atr Tx 0000/0000/0000",
            "ctor xcvr 0",
        ]
    );
}

#[test]
fn test_unknown_id_fails_before_gpio() {
    let (iface, log) = recording_iface();
    let registry = DboardRegistry::with_defaults();

    let err = DboardManager::new(&registry, DboardId::BASIC_RX, DboardId(0x0bad), iface)
        .unwrap_err();

    assert!(matches!(err, DboardError::UnknownId { id } if id == DboardId(0x0bad)));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_ctor_failure_propagates() {
    let (iface, _log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(RX_ID, failing_ctor("broken_rx"), ["0"]);

    let err = DboardManager::new(&registry, RX_ID, DboardId::BASIC_TX, iface).unwrap_err();

    match err {
        DboardError::CtorFailed { ctor, subdev, .. } => {
            assert_eq!(ctor, "broken_rx");
            assert_eq!(subdev, "0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Transceiver vs Separate Boards
// ============================================================================

#[test]
fn test_transceiver_shares_instance() {
    let (iface, log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(XCVR_ID, memory_ctor("xcvr", log.clone()), ["0", "1"]);

    let manager = DboardManager::new(&registry, XCVR_ID, XCVR_ID, iface).unwrap();
    assert!(manager.is_transceiver());
    assert_eq!(manager.rx_subdev_names(), vec!["0", "1"]);
    assert_eq!(manager.tx_subdev_names(), vec!["0", "1"]);

    // One build per sub-device, not per direction
    let builds = log.borrow().iter().filter(|op| op.starts_with("ctor")).count();
    assert_eq!(builds, 2);

    let tx = manager.tx_subdev("1").unwrap();
    tx.set(Prop::Freq, 2.4e9).unwrap();
    let rx = manager.rx_subdev("1").unwrap();
    assert_eq!(rx.get_as::<f64>(Prop::Freq).unwrap(), 2.4e9);

    // Sub-device "0" is a different instance
    assert!(manager.rx_subdev("0").unwrap().get(Prop::Freq).is_err());
}

#[test]
fn test_separate_boards_independent() {
    let (iface, log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(RX_ID, memory_ctor("rx_board", log.clone()), ["0"]);
    registry.register(TX_ID, memory_ctor("tx_board", log.clone()), ["0"]);

    let manager = DboardManager::new(&registry, RX_ID, TX_ID, iface).unwrap();
    assert!(!manager.is_transceiver());

    let rx = manager.rx_subdev("0").unwrap();
    let tx = manager.tx_subdev("0").unwrap();
    assert_eq!(rx.get_as::<String>(Prop::Name).unwrap(), "rx_board:0");
    assert_eq!(tx.get_as::<String>(Prop::Name).unwrap(), "tx_board:0");

    tx.set(Prop::Freq, 915e6).unwrap();
    assert!(rx.get(Prop::Freq).is_err());
}

#[test]
fn test_same_factory_under_two_ids_is_transceiver() {
    let (iface, log) = recording_iface();
    let wide = memory_ctor("wide", log.clone());
    let mut registry = DboardRegistry::with_defaults();
    registry.register(RX_ID, wide.clone(), ["0"]);
    registry.register(TX_ID, wide, ["0"]);

    let manager = DboardManager::new(&registry, RX_ID, TX_ID, iface).unwrap();
    assert!(manager.is_transceiver());

    let builds = log.borrow().iter().filter(|op| op.starts_with("ctor")).count();
    assert_eq!(builds, 1);
}

#[test]
fn test_distinct_factories_sharing_a_name_stay_separate() {
    let (iface, log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(RX_ID, memory_ctor("dup", log.clone()), ["0"]);
    registry.register(
        TX_ID,
        DboardCtor::new("dup", |_args: CtorArgs| {
            Ok(Box::new(MemoryDboard {
                label: "TX-FACTORY".into(),
                values: BTreeMap::new(),
            }) as Box<dyn Dboard>)
        }),
        ["0"],
    );

    let manager = DboardManager::new(&registry, RX_ID, TX_ID, iface).unwrap();
    assert!(!manager.is_transceiver());

    let tx = manager.tx_subdev("0").unwrap();
    assert_eq!(tx.get_as::<String>(Prop::Name).unwrap(), "TX-FACTORY");
    let rx = manager.rx_subdev("0").unwrap();
    assert_eq!(rx.get_as::<String>(Prop::Name).unwrap(), "dup:0");
}

#[test]
fn test_basic_boards_default_names() {
    let (iface, _log) = recording_iface();
    let registry = DboardRegistry::with_defaults();

    let manager =
        DboardManager::new(&registry, DboardId::BASIC_RX, DboardId::BASIC_TX, iface).unwrap();

    assert!(!manager.is_transceiver());
    assert_eq!(manager.rx_subdev_names(), vec!["a", "b", "ab"]);
    assert_eq!(manager.tx_subdev_names(), vec![""]);

    let a = manager.rx_subdev("a").unwrap();
    assert_eq!(a.get_as::<String>(Prop::Connection).unwrap(), "I");
}

#[test]
fn test_missing_boards_yield_pass_through() {
    let (iface, _log) = recording_iface();
    let registry = DboardRegistry::with_defaults();

    let manager = DboardManager::new(&registry, DboardId::NONE, DboardId::NONE, iface).unwrap();

    // Both slots resolve to the basic RX factory, so RX and TX share it
    assert!(manager.is_transceiver());
    assert_eq!(manager.rx_subdev_names(), vec!["ab"]);
    assert_eq!(manager.tx_subdev_names(), vec!["ab"]);
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_unknown_subdev_name() {
    let (iface, _log) = recording_iface();
    let registry = DboardRegistry::with_defaults();
    let manager =
        DboardManager::new(&registry, DboardId::BASIC_RX, DboardId::BASIC_TX, iface).unwrap();

    let err = manager.rx_subdev("c").unwrap_err();
    assert!(matches!(
        &err,
        DboardError::UnknownSubdev { direction: Direction::Rx, name } if name == "c"
    ));
    assert_eq!(err.to_string(), "unknown rx subdev name c");

    let err = manager.subdev(Direction::Tx, "a").unwrap_err();
    assert_eq!(err.to_string(), "unknown tx subdev name a");
}

#[test]
fn test_duplicate_names_keep_last_build() {
    let (iface, log) = recording_iface();
    let mut registry = DboardRegistry::with_defaults();
    registry.register(RX_ID, memory_ctor("dup", log.clone()), ["0", "0"]);

    let manager = DboardManager::new(&registry, RX_ID, DboardId::BASIC_TX, iface).unwrap();
    assert_eq!(manager.rx_subdev_names(), vec!["0"]);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn last_registration_wins(
            code in 0x0100u16..0x0200,
            first in proptest::collection::vec("[a-z]{1,3}", 1..4),
            second in proptest::collection::vec("[a-z]{1,3}", 1..4),
        ) {
            let log: OpLog = Rc::new(RefCell::new(Vec::new()));
            let mut registry = DboardRegistry::new();
            registry.register(DboardId(code), memory_ctor("first", log.clone()), first);
            registry.register(DboardId(code), memory_ctor("second", log), second.clone());

            let entry = registry.resolve(DboardId(code)).unwrap();
            prop_assert_eq!(entry.ctor.name(), "second");
            prop_assert_eq!(&entry.subdev_names, &second);
        }

        #[test]
        fn every_listed_name_is_reachable(
            names in proptest::collection::btree_set("[a-z0-9]{1,4}", 1..6),
        ) {
            let (iface, log) = recording_iface();
            let mut registry = DboardRegistry::with_defaults();
            registry.register(RX_ID, memory_ctor("many", log), names.clone());

            let manager = DboardManager::new(&registry, RX_ID, DboardId::BASIC_TX, iface).unwrap();
            for name in &names {
                let node = manager.rx_subdev(name).unwrap();
                prop_assert_eq!(
                    node.get_as::<String>(Prop::Name).unwrap(),
                    format!("many:{}", name)
                );
            }
            prop_assert_eq!(manager.rx_subdev_names().len(), names.len());
        }
    }
}

//! Integration tests for the simulated device
//!
//! These tests walk the device tree the way a host layer would:
//! - Daughterboard bring-up order on the GPIO interface
//! - Transceiver and basic boards behind the slot nodes
//! - PPS timekeeping across boards sharing one clock
//! - Board configuration from JSON

use std::time::Duration;

use sdr_dboard::DboardId;
use sdr_props::{
    AtrReg, DboardIface, Direction, GainGroup, GpioBank, Node, Prop, SubdevSpec, TimeSpec,
    ALL_GAINS,
};
use sdr_sim::{GpioOp, SimDboardIface, SimDevice, SimMboardConfig, DBOARD_SLOT, SIM_XCVR_ID};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub fn mboard_node(device: &SimDevice, index: usize) -> Node {
        device
            .root()
            .child(Prop::Mboard.named(index.to_string()))
            .unwrap()
    }

    pub fn slot(device: &SimDevice, index: usize, direction: Direction) -> Node {
        let prop = match direction {
            Direction::Rx => Prop::RxDboard,
            Direction::Tx => Prop::TxDboard,
        };
        mboard_node(device, index)
            .child(prop.named(DBOARD_SLOT))
            .unwrap()
    }

    pub fn subdev(device: &SimDevice, direction: Direction, name: &str) -> Node {
        slot(device, 0, direction)
            .child(Prop::Subdev.named(name))
            .unwrap()
    }

    /// One board with basic pass-through boards in both slots
    pub fn basic_device() -> SimDevice {
        SimDevice::new(vec![SimMboardConfig {
            rx_dboard_id: DboardId::BASIC_RX.as_u16(),
            tx_dboard_id: DboardId::BASIC_TX.as_u16(),
            ..Default::default()
        }])
        .unwrap()
    }
}

use helpers::*;

// ============================================================================
// Bring-up Tests
// ============================================================================

#[test]
fn test_gpio_reset_precedes_driver_activity() {
    let device = SimDevice::with_mboards(1).unwrap();
    let iface = device.mboard(0).unwrap().dboard_iface();

    assert_eq!(
        iface.ops(),
        vec![
            GpioOp::Ddr { bank: GpioBank::Rx, value: 0xffff, mask: 0xffff },
            GpioOp::Ddr { bank: GpioBank::Tx, value: 0xffff, mask: 0xffff },
            GpioOp::Write { bank: GpioBank::Rx, value: 0, mask: 0xffff },
            GpioOp::Write { bank: GpioBank::Tx, value: 0, mask: 0xffff },
            GpioOp::Atr { bank: GpioBank::Rx, atr: AtrReg::DISABLED },
            GpioOp::Atr { bank: GpioBank::Tx, atr: AtrReg::DISABLED },
        ]
    );
}

#[test]
fn test_driver_gpio_writes_follow_reset() {
    let device = SimDevice::with_mboards(1).unwrap();
    let iface = device.mboard(0).unwrap().dboard_iface();
    iface.clear_ops();

    subdev(&device, Direction::Tx, "0")
        .set(Prop::Antenna, "TX/RX")
        .unwrap();
    let ops = iface.ops();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].bank(), GpioBank::Rx);
    assert!(matches!(ops[0], GpioOp::Write { .. }));
}

#[test]
fn test_slot_names_its_board() {
    let device = SimDevice::with_mboards(1).unwrap();
    let rx = slot(&device, 0, Direction::Rx);
    assert_eq!(rx.get_as::<String>(Prop::Name).unwrap(), "RX dboard 0x0062");
    assert_eq!(
        rx.get_as::<Vec<String>>(Prop::SubdevNames).unwrap(),
        vec!["0"]
    );
}

#[test]
fn test_transceiver_serves_both_slots() {
    let device = SimDevice::with_mboards(1).unwrap();
    let manager = device.mboard(0).unwrap().dboard_manager();
    assert!(manager.is_transceiver());
    assert_eq!(manager.rx_id(), SIM_XCVR_ID);

    subdev(&device, Direction::Tx, "0")
        .set(Prop::Antenna, "TX/RX")
        .unwrap();
    let rx_antenna: String = subdev(&device, Direction::Rx, "0")
        .get_as(Prop::Antenna)
        .unwrap();
    assert_eq!(rx_antenna, "RX2");
}

#[test]
fn test_basic_boards_behind_slots() {
    let device = basic_device();
    let manager = device.mboard(0).unwrap().dboard_manager();
    assert!(!manager.is_transceiver());

    let rx_names: Vec<String> = slot(&device, 0, Direction::Rx)
        .get_as(Prop::SubdevNames)
        .unwrap();
    assert_eq!(rx_names, vec!["a", "b", "ab"]);

    let a = subdev(&device, Direction::Rx, "a");
    assert_eq!(a.get_as::<String>(Prop::Name).unwrap(), "Basic RX (a)");
    assert_eq!(a.get_as::<String>(Prop::Connection).unwrap(), "I");

    // Default spec picks the first sub-device
    let spec: SubdevSpec = mboard_node(&device, 0)
        .get_as(Prop::RxSubdevSpec)
        .unwrap();
    assert_eq!(spec.to_string(), "A:a");
}

#[test]
fn test_basic_board_has_no_gain() {
    let device = basic_device();
    let group: std::rc::Rc<dyn GainGroup> = slot(&device, 0, Direction::Rx)
        .get_as(Prop::GainGroup.named("ab"))
        .unwrap();
    assert!(group.names().unwrap().is_empty());
    assert_eq!(group.value(ALL_GAINS).unwrap(), 0.0);
}

#[test]
fn test_slot_exposes_shared_iface() {
    let device = SimDevice::with_mboards(1).unwrap();
    let iface: std::rc::Rc<dyn DboardIface> = slot(&device, 0, Direction::Tx)
        .get_as(Prop::DboardIface)
        .unwrap();
    iface.write_gpio(GpioBank::Tx, 0x00a0, 0x00f0).unwrap();
    assert_eq!(
        device.mboard(0).unwrap().dboard_iface().out(GpioBank::Tx),
        0x00a0
    );
}

// ============================================================================
// Timekeeping Tests
// ============================================================================

#[test]
fn test_boards_share_one_clock() {
    let device = SimDevice::with_mboards(2).unwrap();
    for m in 0..2 {
        mboard_node(&device, m)
            .set(Prop::TimeNow, TimeSpec::from_secs(7.0))
            .unwrap();
    }
    device.clock().advance(Duration::from_millis(1250));

    for m in 0..2 {
        let now: TimeSpec = mboard_node(&device, m).get_as(Prop::TimeNow).unwrap();
        assert_eq!(now, TimeSpec::from_secs(8.25));
    }
}

#[test]
fn test_pps_phase_shifts_latch() {
    let device = SimDevice::new(vec![
        SimMboardConfig::default(),
        SimMboardConfig {
            name: "SIM-B2".into(),
            pps_phase: 0.5,
            ..Default::default()
        },
    ])
    .unwrap();
    let clock = device.clock();
    clock.advance(Duration::from_millis(100));
    for m in 0..2 {
        mboard_node(&device, m)
            .set(Prop::TimeNextPps, TimeSpec::from_secs(20.0))
            .unwrap();
    }

    // Board 1 latches at host 0.5, board 0 not until host 1.0
    clock.advance(Duration::from_millis(600));
    let b0: TimeSpec = mboard_node(&device, 0).get_as(Prop::TimeNow).unwrap();
    let b1: TimeSpec = mboard_node(&device, 1).get_as(Prop::TimeNow).unwrap();
    assert!(b0.real_secs() < 1.0);
    assert!((b1.real_secs() - 20.2).abs() < 1e-9);
}

#[test]
fn test_last_pps_without_signal_is_zero() {
    let device = SimDevice::new(vec![SimMboardConfig {
        pps_connected: false,
        ..Default::default()
    }])
    .unwrap();
    device.clock().advance(Duration::from_secs(5));
    let pps: TimeSpec = mboard_node(&device, 0).get_as(Prop::TimePps).unwrap();
    assert_eq!(pps, TimeSpec::default());
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_partial_json_config() {
    let config: SimMboardConfig =
        serde_json::from_str(r#"{ "name": "LAB-3", "rx_dsps": 4, "pps_phase": 0.25 }"#).unwrap();
    assert_eq!(config.name, "LAB-3");
    assert_eq!(config.rx_dsps, 4);
    assert_eq!(config.pps_phase, 0.25);
    assert_eq!(config.clock_rate, 64e6);
    assert_eq!(config.rx_dboard_id, SIM_XCVR_ID.as_u16());

    let device = SimDevice::new(vec![config]).unwrap();
    let names: Vec<String> = mboard_node(&device, 0).get_as(Prop::RxDspNames).unwrap();
    assert_eq!(names, vec!["0", "1", "2", "3"]);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn masked_write_touches_only_masked_pins(
            before in any::<u16>(),
            value in any::<u16>(),
            mask in any::<u16>(),
        ) {
            let iface = SimDboardIface::new();
            iface.write_gpio(GpioBank::Rx, before, 0xffff).unwrap();
            iface.write_gpio(GpioBank::Rx, value, mask).unwrap();

            let out = iface.out(GpioBank::Rx);
            prop_assert_eq!(out & mask, value & mask);
            prop_assert_eq!(out & !mask, before & !mask);
            prop_assert_eq!(iface.out(GpioBank::Tx), 0);
        }

        #[test]
        fn time_advances_with_clock(start in 0.0f64..1e6, millis in 0u64..100_000) {
            let device = SimDevice::with_mboards(1).unwrap();
            let mb = mboard_node(&device, 0);
            mb.set(Prop::TimeNow, TimeSpec::from_secs(start)).unwrap();
            device.clock().advance(Duration::from_millis(millis));

            let now: TimeSpec = mb.get_as(Prop::TimeNow).unwrap();
            let expected = start + millis as f64 / 1000.0;
            prop_assert!((now.real_secs() - expected).abs() < 1e-6);
        }
    }
}

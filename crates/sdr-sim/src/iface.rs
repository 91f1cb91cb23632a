//! Simulated low-level interfaces
//!
//! [`SimDboardIface`] keeps the GPIO state of both daughterboard banks and
//! records every call so tests can check ordering. [`SimMboardIface`] is a
//! plain register file.

use std::cell::RefCell;
use std::collections::HashMap;

use sdr_props::{AtrReg, DboardIface, GpioBank, MboardIface, PropError};

/// One recorded daughterboard interface call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioOp {
    /// Direction register write
    Ddr { bank: GpioBank, value: u16, mask: u16 },
    /// Output latch write
    Write { bank: GpioBank, value: u16, mask: u16 },
    /// Automatic switching register write
    Atr { bank: GpioBank, atr: AtrReg },
}

impl GpioOp {
    /// Bank the call addressed
    pub fn bank(&self) -> GpioBank {
        match self {
            GpioOp::Ddr { bank, .. } | GpioOp::Write { bank, .. } | GpioOp::Atr { bank, .. } => {
                *bank
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BankState {
    ddr: u16,
    out: u16,
    atr: AtrReg,
}

/// Recording daughterboard interface
#[derive(Debug, Default)]
pub struct SimDboardIface {
    rx: RefCell<BankState>,
    tx: RefCell<BankState>,
    ops: RefCell<Vec<GpioOp>>,
}

impl SimDboardIface {
    /// Create an interface with every register cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, oldest first
    pub fn ops(&self) -> Vec<GpioOp> {
        self.ops.borrow().clone()
    }

    /// Forget the recorded calls (register state is kept)
    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    /// Current direction register of a bank
    pub fn ddr(&self, bank: GpioBank) -> u16 {
        self.bank(bank).borrow().ddr
    }

    /// Current output latch of a bank
    pub fn out(&self, bank: GpioBank) -> u16 {
        self.bank(bank).borrow().out
    }

    /// Current switching register of a bank
    pub fn atr(&self, bank: GpioBank) -> AtrReg {
        self.bank(bank).borrow().atr
    }

    fn bank(&self, bank: GpioBank) -> &RefCell<BankState> {
        match bank {
            GpioBank::Rx => &self.rx,
            GpioBank::Tx => &self.tx,
        }
    }
}

fn merge(current: u16, value: u16, mask: u16) -> u16 {
    (current & !mask) | (value & mask)
}

impl DboardIface for SimDboardIface {
    fn set_gpio_ddr(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError> {
        let mut state = self.bank(bank).borrow_mut();
        state.ddr = merge(state.ddr, value, mask);
        self.ops.borrow_mut().push(GpioOp::Ddr { bank, value, mask });
        Ok(())
    }

    fn write_gpio(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError> {
        let mut state = self.bank(bank).borrow_mut();
        state.out = merge(state.out, value, mask);
        self.ops.borrow_mut().push(GpioOp::Write { bank, value, mask });
        Ok(())
    }

    fn read_gpio(&self, bank: GpioBank) -> Result<u16, PropError> {
        // Input pins float low
        let state = self.bank(bank).borrow();
        Ok(state.out & !state.ddr)
    }

    fn set_atr_reg(&self, bank: GpioBank, atr: AtrReg) -> Result<(), PropError> {
        self.bank(bank).borrow_mut().atr = atr;
        self.ops.borrow_mut().push(GpioOp::Atr { bank, atr });
        Ok(())
    }
}

/// Motherboard register file
#[derive(Debug, Default)]
pub struct SimMboardIface {
    regs: RefCell<HashMap<u32, u32>>,
}

impl SimMboardIface {
    /// Create an empty register file
    pub fn new() -> Self {
        Self::default()
    }
}

impl MboardIface for SimMboardIface {
    fn peek32(&self, addr: u32) -> Result<u32, PropError> {
        if addr % 4 != 0 {
            return Err(PropError::Hardware(format!("unaligned peek at {:#010x}", addr)));
        }
        Ok(self.regs.borrow().get(&addr).copied().unwrap_or(0))
    }

    fn poke32(&self, addr: u32, data: u32) -> Result<(), PropError> {
        if addr % 4 != 0 {
            return Err(PropError::Hardware(format!("unaligned poke at {:#010x}", addr)));
        }
        self.regs.borrow_mut().insert(addr, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_writes() {
        let iface = SimDboardIface::new();
        iface.set_gpio_ddr(GpioBank::Rx, 0x00ff, 0xffff).unwrap();
        iface.write_gpio(GpioBank::Rx, 0xffff, 0x0f00).unwrap();
        iface.write_gpio(GpioBank::Rx, 0x0000, 0x0100).unwrap();

        assert_eq!(iface.ddr(GpioBank::Rx), 0x00ff);
        assert_eq!(iface.out(GpioBank::Rx), 0x0e00);
        assert_eq!(iface.read_gpio(GpioBank::Rx).unwrap(), 0x0e00);
        assert_eq!(iface.out(GpioBank::Tx), 0);
        assert_eq!(iface.ops().len(), 3);
    }

    #[test]
    fn test_input_pins_read_low() {
        let iface = SimDboardIface::new();
        iface.write_gpio(GpioBank::Tx, 0xffff, 0xffff).unwrap();
        iface.set_gpio_ddr(GpioBank::Tx, 0xff00, 0xffff).unwrap();
        assert_eq!(iface.read_gpio(GpioBank::Tx).unwrap(), 0x00ff);
    }

    #[test]
    fn test_register_file() {
        let iface = SimMboardIface::new();
        assert_eq!(iface.peek32(0x10).unwrap(), 0);
        iface.poke32(0x10, 0xdead_beef).unwrap();
        assert_eq!(iface.peek32(0x10).unwrap(), 0xdead_beef);
        assert!(iface.poke32(0x11, 1).is_err());
    }
}

//! CPU architectural state components: register file and CSR bank.

use std::collections::BTreeMap;

/// ABI names of x0..x31.
pub const REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2",
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7",
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// Look up a GPR index by ABI name. `0` is accepted as an alias of `zero`.
pub fn reg_index(name: &str) -> Option<u8> {
    if name == "0" {
        return Some(0);
    }
    REG_NAMES.iter().position(|n| *n == name).map(|i| i as u8)
}

/// Integer register file x0..x31.
///
/// x0 may be written by an instruction body; the engine clears it again
/// after every instruction via `clear_zero`.
#[derive(Clone, Default)]
pub struct RegFile {
    regs: [u32; 32],
}

impl RegFile {
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        self.regs[(reg & 0x1F) as usize]
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        self.regs[(reg & 0x1F) as usize] = value;
    }

    #[inline]
    pub fn clear_zero(&mut self) {
        self.regs[0] = 0;
    }
}

/// Table entry for CSR declaration: name, address, reset value.
#[derive(Clone, Copy, Debug)]
pub struct CsrEntry {
    pub name: &'static str,
    pub addr: u16,
    pub reset: u32,
}

/// CSR bank indexed by address. Only registered addresses exist.
#[derive(Clone, Default)]
pub struct CsrBank {
    table: BTreeMap<u16, (&'static str, u32)>,
}

impl CsrBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of CSRs declared as a table.
    pub fn register(&mut self, entries: &[CsrEntry]) {
        for e in entries {
            self.table.insert(e.addr, (e.name, e.reset));
        }
    }

    /// `None` when `addr` is not a registered CSR.
    #[inline]
    pub fn read(&self, addr: u16) -> Option<u32> {
        self.table.get(&addr).map(|(_, value)| *value)
    }

    /// Returns false (and stores nothing) when `addr` is not registered.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u32) -> bool {
        match self.table.get_mut(&addr) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Registered CSRs in address order: (addr, name, value).
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'static str, u32)> + '_ {
        self.table.iter().map(|(addr, (name, value))| (*addr, *name, *value))
    }
}

/// Aggregated architectural state: integer RF and CSR bank.
#[derive(Clone)]
pub struct Status {
    pub int: RegFile,
    pub csr: CsrBank,
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    pub fn new() -> Self {
        let mut csr = CsrBank::new();
        csr.register(super::csr_def::M_CSRS);
        Self {
            int: RegFile::new(),
            csr,
        }
    }
}

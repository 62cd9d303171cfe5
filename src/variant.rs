//! CPU variant selection.

/// Which member of the 6502 family a [`crate::Cpu`] emulates.
///
/// Each variant has its own 256-entry pipeline table built by overlaying
/// variant-specific opcodes onto a shared documented base (see `tables`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Original NMOS 6502, illegal/undocumented opcodes behave as silicon does.
    Nmos6502,
    /// NMOS 6502 with every illegal opcode slot replaced by a same-length,
    /// same-cycle-count NOP instead of its undocumented behavior.
    Nmos6502NoIllegal,
    /// WDC 65C02S: full CMOS instruction set (BRA/STZ/PHX/PHY/PLX/PLY/TRB/TSB,
    /// `(zp)` addressing, RMB/SMB/BBR/BBS, WAI, STP) plus the fixed JMP
    /// `($xxFF)` indirection and documented-NOP-free opcode map.
    Wdc65C02,
    /// Rockwell 65C02: identical to [`Variant::Wdc65C02`] except WAI and STP
    /// are treated as ordinary NOPs of the correct cycle count and byte
    /// length rather than halting the CPU.
    Rockwell65C02,
}

impl Variant {
    /// True for either CMOS variant (WDC or Rockwell).
    #[must_use]
    pub const fn is_cmos(self) -> bool {
        matches!(self, Self::Wdc65C02 | Self::Rockwell65C02)
    }

    /// True when illegal/undocumented NMOS opcodes retain their real silicon
    /// behavior (only [`Variant::Nmos6502`]).
    #[must_use]
    pub const fn has_illegal_opcodes(self) -> bool {
        matches!(self, Self::Nmos6502)
    }

    /// True when WAI/STP halt the CPU instead of behaving as NOPs.
    #[must_use]
    pub const fn wai_stop_halts(self) -> bool {
        matches!(self, Self::Wdc65C02)
    }
}

//! Cycle-accurate MOS 6502 family CPU core.
//!
//! The 6502 and its descendants execute one bus access per clock cycle.
//! [`Cpu::clock`] advances execution by exactly one such cycle, popping the
//! next micro-op off an internal pipeline built from the current
//! instruction's table entry. Four variants are supported through
//! [`Variant`]: the original NMOS 6502 (with its full illegal-opcode set),
//! an NMOS core with illegal opcodes flattened to timing-matched NOPs, and
//! the WDC 65C02S and Rockwell 65C02 CMOS descendants.
//!
//! A [`Cpu`] owns no memory of its own — callers supply a [`Bus`]
//! implementation and clock the CPU against it one cycle at a time.

mod bus;
mod cpu;
mod flags;
mod microop;
mod pipeline;
mod registers;
mod state;
mod status;
mod tables;
mod variant;

pub use bus::{Bus, Observable, Value};
pub use cpu::Cpu;
pub use flags::Flags;
pub use registers::Registers;
pub use status::{CpuStatus, Pending};
pub use variant::Variant;

pub mod flag_bits {
    //! Individual status-register bit masks, re-exported for callers that
    //! want to test `Flags` bits directly rather than through
    //! [`crate::Observable::query`].
    pub use crate::flags::{B, C, D, I, N, U, V, Z};
}

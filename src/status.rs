//! CPU execution status and pending-interrupt reporting.
//!
//! Distinct from [`crate::flags::Flags`] (the "P" status register pushed and
//! pulled by the instruction set) — this is the engine's own run state.

/// Execution state of the engine, as distinct from the 6502's own P register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStatus {
    /// Normal execution.
    Running,
    /// Halted by a CMOS STP instruction. Only `reset()` recovers from this.
    Stopped,
    /// Halted by an NMOS JAM/KIL opcode. Only `reset()` recovers from this.
    Jammed,
    /// Halted by a WDC WAI instruction, waiting for NMI or IRQ to resume.
    Waiting,
    /// A halt/stop/wait condition was reached but `ignore_halt_stop_wait` is
    /// set, so the engine treats the opcode as a correctly-timed NOP instead
    /// of entering a terminal state.
    Bypassed,
}

impl CpuStatus {
    /// True if the engine will not advance the pipeline on the next `clock`.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Stopped | Self::Jammed)
    }
}

/// Which interrupt source, if any, is latched and waiting to be serviced.
///
/// Reported at instruction-boundary poll time in priority order
/// Reset > NMI > IRQ, matching `spec.md` Section 4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// No interrupt latched.
    None,
    /// Level-triggered IRQ latched and the I flag is currently clear.
    Irq,
    /// Edge-triggered NMI latched.
    Nmi,
    /// Reset line latched; takes priority over NMI and IRQ.
    Reset,
}

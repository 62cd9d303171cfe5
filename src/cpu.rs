//! The clock-stepped execution engine tying a [`Variant`]'s pipeline table
//! to a host-supplied [`Bus`].
//!
//! Grounded on the teacher's tick-one-cycle-at-a-time 68000 core (each
//! public `tick`/`clock` call performs exactly one bus access and advances
//! the micro-op queue by one slot); the interrupt-priority poll and the
//! `Waiting`/halt handling are new, since the teacher's 68000 core has no
//! equivalent of WAI/STP or the 6502's three-latch interrupt model.

use crate::bus::{Bus, Observable, Value};
use crate::microop::execute;
use crate::state::CpuState;
use crate::status::{CpuStatus, Pending};
use crate::tables::{self, irq_nmi_pipeline, reset_pipeline};
use crate::variant::Variant;

/// A cycle-accurate 6502-family core. One [`Cpu::clock`] call advances
/// execution by exactly one bus cycle.
#[derive(Debug, Clone)]
pub struct Cpu {
    state: CpuState,
    variant: Variant,
}

impl Cpu {
    /// Construct a CPU of the given variant. Registers are zeroed and `PC`
    /// is `0`; call [`Cpu::reset`] before clocking to load the reset vector,
    /// matching real hardware's power-on behavior.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        Self {
            state: CpuState::new(),
            variant,
        }
    }

    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// When true, WAI/STP/NMOS-JAM opcodes execute as correctly-timed NOPs
    /// instead of halting the engine. Useful for test harnesses that must
    /// run past an accidental illegal opcode without hanging.
    pub fn set_ignore_halt_stop_wait(&mut self, ignore: bool) {
        self.state.ignore_halt_stop_wait = ignore;
    }

    #[must_use]
    pub const fn status(&self) -> CpuStatus {
        self.state.status
    }

    #[must_use]
    pub const fn total_cycles(&self) -> u64 {
        self.state.total_cycles
    }

    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.state.regs.pc
    }

    #[must_use]
    pub const fn registers(&self) -> &crate::registers::Registers {
        &self.state.regs
    }

    /// True when the working pipeline has fully drained: the next `clock`
    /// call will begin a fresh instruction (or service a pending interrupt).
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.state.is_instruction_complete()
    }

    /// Force the register file directly, bypassing `reset`/bus access
    /// entirely. Used by conformance harnesses that seed a CPU from a test
    /// vector's initial snapshot rather than from a reset vector.
    pub fn set_registers(
        &mut self,
        pc: u16,
        s: u8,
        a: u8,
        x: u8,
        y: u8,
        p: crate::flags::Flags,
    ) {
        self.state.regs.pc = pc;
        self.state.regs.s = s;
        self.state.regs.a = a;
        self.state.regs.x = x;
        self.state.regs.y = y;
        self.state.regs.p = p;
    }

    /// Immediate, non-cycle-stepped reset: loads `PC` from the reset vector
    /// directly rather than modelling the 7-cycle in-band sequence. Use
    /// this for power-on/test-harness setup; use [`Cpu::signal_reset`] to
    /// model a reset line asserted while the CPU is already running.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        let ignore_halt_stop_wait = self.state.ignore_halt_stop_wait;
        self.state = CpuState::new();
        self.state.ignore_halt_stop_wait = ignore_halt_stop_wait;
        let lo = bus.read(0xFFFC);
        let hi = bus.read(0xFFFD);
        self.state.regs.pc = u16::from(hi) << 8 | u16::from(lo);
    }

    /// Latch a reset request. Serviced at the next instruction boundary
    /// (or immediately, if the CPU is currently halted or waiting) via the
    /// cycle-stepped 7-cycle in-band sequence, taking priority over NMI
    /// and IRQ.
    pub fn signal_reset(&mut self) {
        self.state.reset_pending = true;
    }

    /// Latch an edge-triggered NMI request.
    pub fn signal_nmi(&mut self) {
        self.state.nmi_pending = true;
    }

    /// Assert the level-triggered IRQ line. Stays latched until
    /// [`Cpu::clear_irq`] is called; serviced only while the I flag is
    /// clear.
    pub fn signal_irq(&mut self) {
        self.state.irq_pending = true;
    }

    /// Deassert the IRQ line.
    pub fn clear_irq(&mut self) {
        self.state.irq_pending = false;
    }

    fn poll_pending(&self) -> Pending {
        let s = &self.state;
        if s.reset_pending {
            Pending::Reset
        } else if s.nmi_pending {
            Pending::Nmi
        } else if s.irq_pending && !s.regs.p.is_set(crate::flags::I) {
            Pending::Irq
        } else {
            Pending::None
        }
    }

    /// Advance execution by exactly one bus cycle. Returns `true` iff the
    /// just-executed cycle completed an instruction; a halted CPU (or one
    /// waiting with nothing to wake it) returns `true` without touching the
    /// bus at all.
    pub fn clock(&mut self, bus: &mut impl Bus) -> bool {
        if self.state.status.is_halted() {
            if !self.state.reset_pending {
                return true;
            }
            self.state.status = CpuStatus::Running;
            self.state.pipeline.clear();
        }

        if self.state.status == CpuStatus::Waiting {
            let woken =
                self.state.reset_pending || self.state.nmi_pending || self.state.irq_pending;
            if woken {
                self.state.status = CpuStatus::Running;
                self.state.pipeline.clear();
            } else {
                return true;
            }
        }

        if self.state.pipeline.is_empty() {
            self.state.software_interrupt = false;
            match self.poll_pending() {
                Pending::Reset => {
                    self.state.reset_pending = false;
                    self.state.interrupt_vector = 0xFFFC;
                    self.state.pipeline.load(reset_pipeline());
                }
                Pending::Nmi => {
                    self.state.nmi_pending = false;
                    self.state.interrupt_vector = 0xFFFA;
                    self.state
                        .pipeline
                        .load(irq_nmi_pipeline(self.variant.is_cmos()));
                }
                Pending::Irq => {
                    self.state.interrupt_vector = 0xFFFE;
                    self.state
                        .pipeline
                        .load(irq_nmi_pipeline(self.variant.is_cmos()));
                }
                Pending::None => {
                    let opcode = bus.peek(self.state.regs.pc);
                    self.state.opcode = opcode;
                    let entry = tables::lookup(self.variant, opcode);
                    self.state.pipeline.load(entry);
                }
            }
            self.state.status = CpuStatus::Running;
        }

        if let Some(op) = self.state.pipeline.pop_front() {
            execute(&mut self.state, bus, op, self.variant.is_cmos());
            self.state.total_cycles += 1;
        }

        self.state.is_instruction_complete()
    }

    /// Clock the CPU until the current instruction (or interrupt sequence)
    /// completes, returning the number of cycles consumed. Includes a
    /// safety cap so a caller can never spin forever against a buggy `Bus`
    /// or an engine defect that never drains the pipeline.
    pub fn step(&mut self, bus: &mut impl Bus) -> u32 {
        const SAFETY_CAP: u32 = 100;
        let mut cycles = 0;
        loop {
            let complete = self.clock(bus);
            cycles += 1;
            if complete || cycles >= SAFETY_CAP {
                break;
            }
        }
        cycles
    }

    /// Clock the CPU for exactly `n` cycles, returning `n`.
    pub fn run(&mut self, bus: &mut impl Bus, n: u32) -> u32 {
        for _ in 0..n {
            let _ = self.clock(bus);
        }
        n
    }
}

impl Observable for Cpu {
    fn query(&self, path: &str) -> Option<Value> {
        let s = &self.state;
        Some(match path {
            "a" => Value::U8(s.regs.a),
            "x" => Value::U8(s.regs.x),
            "y" => Value::U8(s.regs.y),
            "s" => Value::U8(s.regs.s),
            "pc" => Value::U16(s.regs.pc),
            "p" => Value::U8(s.regs.p.0),
            "p.c" => Value::Bool(s.regs.p.is_set(crate::flags::C)),
            "p.z" => Value::Bool(s.regs.p.is_set(crate::flags::Z)),
            "p.i" => Value::Bool(s.regs.p.is_set(crate::flags::I)),
            "p.d" => Value::Bool(s.regs.p.is_set(crate::flags::D)),
            "p.v" => Value::Bool(s.regs.p.is_set(crate::flags::V)),
            "p.n" => Value::Bool(s.regs.p.is_set(crate::flags::N)),
            "opcode" => Value::U8(s.opcode),
            "total_cycles" => Value::U16(s.total_cycles as u16),
            "nmi_pending" => Value::Bool(s.nmi_pending),
            "irq_pending" => Value::Bool(s.irq_pending),
            "reset_pending" => Value::Bool(s.reset_pending),
            "software_interrupt" => Value::Bool(s.software_interrupt),
            "status.running" => Value::Bool(matches!(s.status, CpuStatus::Running)),
            "status.stopped" => Value::Bool(matches!(s.status, CpuStatus::Stopped)),
            "status.jammed" => Value::Bool(matches!(s.status, CpuStatus::Jammed)),
            "status.waiting" => Value::Bool(matches!(s.status, CpuStatus::Waiting)),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a",
            "x",
            "y",
            "s",
            "pc",
            "p",
            "p.c",
            "p.z",
            "p.i",
            "p.d",
            "p.v",
            "p.n",
            "opcode",
            "total_cycles",
            "nmi_pending",
            "irq_pending",
            "reset_pending",
            "software_interrupt",
            "status.running",
            "status.stopped",
            "status.jammed",
            "status.waiting",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        mem: [u8; 65536],
    }

    impl TestBus {
        fn new() -> Self {
            Self { mem: [0; 65536] }
        }

        fn load(&mut self, addr: u16, data: &[u8]) {
            for (i, &b) in data.iter().enumerate() {
                self.mem[(addr as usize + i) & 0xFFFF] = b;
            }
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, address: u16) -> u8 {
            self.mem[address as usize]
        }

        fn peek(&self, address: u16) -> u8 {
            self.mem[address as usize]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.mem[address as usize] = value;
        }
    }

    #[test]
    fn lda_immediate() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0xA9, 0x42]);
        cpu.state.regs.pc = 0x0000;

        assert!(!cpu.clock(&mut bus));
        assert!(cpu.clock(&mut bus));

        assert_eq!(cpu.registers().a, 0x42);
        assert_eq!(cpu.pc(), 0x0002);
    }

    #[test]
    fn sta_zero_page() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        let mut bus = TestBus::new();
        cpu.state.regs.a = 0x55;
        bus.load(0x0000, &[0x85, 0x10]);
        cpu.state.regs.pc = 0x0000;

        for _ in 0..3 {
            cpu.clock(&mut bus);
        }

        assert_eq!(bus.mem[0x0010], 0x55);
    }

    #[test]
    fn jmp_absolute() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0x4C, 0x34, 0x12]);
        cpu.state.regs.pc = 0x0000;

        for _ in 0..3 {
            cpu.clock(&mut bus);
        }

        assert_eq!(cpu.pc(), 0x1234);
    }

    #[test]
    fn nop_is_two_cycles() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0xEA]);
        cpu.state.regs.pc = 0x0000;

        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 2);
        assert_eq!(cpu.pc(), 0x0001);
    }

    #[test]
    fn nmos_jam_halts_until_reset() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0x02]); // JAM
        cpu.state.regs.pc = 0x0000;

        cpu.step(&mut bus);
        assert_eq!(cpu.status(), CpuStatus::Jammed);

        let before = cpu.total_cycles();
        assert!(cpu.clock(&mut bus), "halted clock must report complete");
        assert_eq!(cpu.total_cycles(), before, "halted CPU must not advance");

        bus.mem[0xFFFC] = 0x00;
        bus.mem[0xFFFD] = 0x80;
        cpu.signal_reset();
        cpu.step(&mut bus);
        assert_eq!(cpu.status(), CpuStatus::Running);
        assert_eq!(cpu.pc(), 0x8000);
    }

    #[test]
    fn ignore_halt_stop_wait_bypasses_jam() {
        let mut cpu = Cpu::new(Variant::Nmos6502);
        cpu.set_ignore_halt_stop_wait(true);
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0x02, 0xEA]); // JAM, NOP
        cpu.state.regs.pc = 0x0000;

        cpu.step(&mut bus);
        assert_eq!(cpu.status(), CpuStatus::Bypassed);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x0003);
    }
}

//! Deterministic end-to-end scenarios, one per concrete example worked out
//! by hand against real 6502/65C02 documentation.

use mos_6502::{Bus, Cpu, Flags, Variant, flag_bits};

struct RamBus {
    mem: [u8; 65536],
}

impl RamBus {
    #[allow(clippy::large_stack_arrays)]
    fn new() -> Self {
        Self { mem: [0; 65536] }
    }

    fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.mem[(addr as usize + i) & 0xFFFF] = byte;
        }
    }

    fn set_reset_vector(&mut self, addr: u16) {
        self.mem[0xFFFC] = addr as u8;
        self.mem[0xFFFD] = (addr >> 8) as u8;
    }

    fn set_irq_vector(&mut self, addr: u16) {
        self.mem[0xFFFE] = addr as u8;
        self.mem[0xFFFF] = (addr >> 8) as u8;
    }
}

impl Bus for RamBus {
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
fn lda_immediate_binary() {
    let mut bus = RamBus::new();
    bus.load(0x0400, &[0xA9, 0x42]);
    bus.set_reset_vector(0x0400);

    let mut cpu = Cpu::new(Variant::Nmos6502);
    cpu.reset(&mut bus);
    cpu.set_registers(0x0400, 0xFD, 0x00, 0, 0, Flags::from_byte(0x24));

    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 2);
    assert_eq!(cpu.registers().a, 0x42);
    assert_eq!(cpu.registers().p.to_byte(), 0x24);
}

#[test]
fn bcd_adc_wrap_nmos_vs_cmos() {
    // A = $15, D=1, C=0, executing ADC #$27.
    let mut nmos_bus = RamBus::new();
    nmos_bus.load(0x0400, &[0x69, 0x27]);
    let mut nmos = Cpu::new(Variant::Nmos6502);
    nmos.set_registers(0x0400, 0xFD, 0x15, 0, 0, Flags::from_byte(flag_bits::D));
    let nmos_cycles = nmos.step(&mut nmos_bus);
    assert_eq!(nmos.registers().a, 0x42);
    assert!(!nmos.registers().p.is_set(flag_bits::C));
    assert!(!nmos.registers().p.is_set(flag_bits::V));
    assert_eq!(nmos_cycles, 2);

    let mut cmos_bus = RamBus::new();
    cmos_bus.load(0x0400, &[0x69, 0x27]);
    let mut cmos = Cpu::new(Variant::Wdc65C02);
    cmos.set_registers(0x0400, 0xFD, 0x15, 0, 0, Flags::from_byte(flag_bits::D));
    let cmos_cycles = cmos.step(&mut cmos_bus);
    assert_eq!(cmos.registers().a, 0x42);
    assert!(!cmos.registers().p.is_set(flag_bits::C));
    assert!(!cmos.registers().p.is_set(flag_bits::V));
    assert_eq!(cmos_cycles, 3);
}

#[test]
fn jmp_indirect_page_boundary_bug() {
    let mut nmos_bus = RamBus::new();
    nmos_bus.load(0x0400, &[0x6C, 0xFF, 0x02]);
    nmos_bus.mem[0x02FF] = 0x34;
    nmos_bus.mem[0x0300] = 0x80;
    nmos_bus.mem[0x0200] = 0x12;
    let mut nmos = Cpu::new(Variant::Nmos6502);
    nmos.set_registers(0x0400, 0xFD, 0, 0, 0, Flags::new());
    let nmos_cycles = nmos.step(&mut nmos_bus);
    assert_eq!(nmos.pc(), 0x1234);
    assert_eq!(nmos_cycles, 5);

    let mut cmos_bus = RamBus::new();
    cmos_bus.load(0x0400, &[0x6C, 0xFF, 0x02]);
    cmos_bus.mem[0x02FF] = 0x34;
    cmos_bus.mem[0x0300] = 0x80;
    cmos_bus.mem[0x0200] = 0x12;
    let mut cmos = Cpu::new(Variant::Wdc65C02);
    cmos.set_registers(0x0400, 0xFD, 0, 0, 0, Flags::new());
    let cmos_cycles = cmos.step(&mut cmos_bus);
    assert_eq!(cmos.pc(), 0x8034);
    assert_eq!(cmos_cycles, 6);
}

#[test]
fn branch_across_page() {
    let mut bus = RamBus::new();
    bus.load(0x04F0, &[0xF0, 0x10]); // BEQ +16
    let mut cpu = Cpu::new(Variant::Nmos6502);
    cpu.set_registers(0x04F0, 0xFD, 0, 0, 0, Flags::from_byte(flag_bits::Z));
    let cycles = cpu.step(&mut bus);
    assert_eq!(cpu.pc(), 0x0502);
    assert_eq!(cycles, 4);

    let mut bus2 = RamBus::new();
    bus2.load(0x04F0, &[0xF0, 0x10]);
    let mut cpu2 = Cpu::new(Variant::Nmos6502);
    cpu2.set_registers(0x04F0, 0xFD, 0, 0, 0, Flags::new());
    let cycles2 = cpu2.step(&mut bus2);
    assert_eq!(cpu2.pc(), 0x04F2);
    assert_eq!(cycles2, 2);
}

#[test]
fn jsr_rts_round_trip() {
    let mut bus = RamBus::new();
    bus.load(0x0400, &[0x20, 0x00, 0x80]);
    bus.load(0x8000, &[0x60]);
    let mut cpu = Cpu::new(Variant::Nmos6502);
    cpu.set_registers(0x0400, 0xFF, 0, 0, 0, Flags::new());

    let jsr_cycles = cpu.step(&mut bus);
    assert_eq!(jsr_cycles, 6);
    assert_eq!(cpu.pc(), 0x8000);
    assert_eq!(bus.mem[0x01FF], 0x04);
    assert_eq!(bus.mem[0x01FE], 0x02);

    let rts_cycles = cpu.step(&mut bus);
    assert_eq!(rts_cycles, 6);
    assert_eq!(cpu.pc(), 0x0403);
    assert_eq!(cpu.registers().s, 0xFF);
}

#[test]
fn irq_servicing_with_i_clear() {
    let mut bus = RamBus::new();
    bus.load(0x0400, &[0xEA]); // NOP
    bus.set_irq_vector(0x9000);
    let mut cpu = Cpu::new(Variant::Nmos6502);
    cpu.set_registers(0x0400, 0xFD, 0, 0, 0, Flags::new());

    cpu.signal_irq();
    let nop_cycles = cpu.step(&mut bus);
    let irq_cycles = cpu.step(&mut bus);
    assert_eq!(nop_cycles, 2);
    assert_eq!(irq_cycles, 7);
    assert_eq!(cpu.pc(), 0x9000);
    assert!(cpu.registers().p.is_set(flag_bits::I));
    assert_eq!(cpu.registers().s, 0xFA);
}

#[test]
fn wai_wakes_without_handler_when_masked() {
    let mut bus = RamBus::new();
    bus.load(0x0400, &[0xCB, 0xEA]); // WAI, NOP
    let mut cpu = Cpu::new(Variant::Wdc65C02);
    cpu.set_registers(0x0400, 0xFD, 0, 0, 0, Flags::from_byte(flag_bits::I));

    cpu.step(&mut bus); // executes WAI, enters Waiting
    assert_eq!(cpu.status(), mos_6502::CpuStatus::Waiting);
    assert_eq!(cpu.pc(), 0x0401);

    cpu.signal_irq();
    cpu.step(&mut bus); // wakes and runs the NOP at $0401; masked IRQ is not serviced
    assert_eq!(cpu.status(), mos_6502::CpuStatus::Running);
    assert_eq!(cpu.pc(), 0x0402);
}

#[test]
fn reset_loads_vector_and_stack_pointer() {
    let mut bus = RamBus::new();
    bus.set_reset_vector(0x1234);
    let mut cpu = Cpu::new(Variant::Nmos6502);
    cpu.reset(&mut bus);
    assert_eq!(cpu.pc(), 0x1234);
    assert_eq!(cpu.registers().s, 0xFD);
    assert!(cpu.registers().p.is_set(flag_bits::I));
}

//! Klaus Dormann's 6502 functional and decimal-mode test harnesses.
//!
//! The functional test exercises every documented opcode against its own
//! self-checking assertions; the decimal test sweeps all `ADC`/`SBC` BCD
//! input combinations against a precomputed truth table. Both binaries are
//! assembled to branch to themselves (a "trap") on completion: success and
//! failure are distinguished only by which address the trap lands on.

use mos_6502::{Bus, Cpu, Variant};

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

fn run_dormann(binary: &[u8], entry: u16, success_trap: u16, instruction_cap: u64) -> bool {
    let mut bus = RamBus::new();
    bus.load(0x0000, binary);

    let mut cpu = Cpu::new(Variant::Nmos6502NoIllegal);
    cpu.set_registers(entry, 0xFD, 0, 0, 0, mos_6502::Flags::new());

    let mut instructions: u64 = 0;
    let mut prev_pc: u16 = 0xFFFF;
    let mut same_pc_count = 0;

    loop {
        let start_pc = cpu.pc();

        if start_pc == prev_pc {
            same_pc_count += 1;
            if same_pc_count > 2 {
                eprintln!("trapped at ${start_pc:04X} after {instructions} instructions");
                return start_pc == success_trap;
            }
        } else {
            same_pc_count = 0;
            prev_pc = start_pc;
        }

        cpu.step(&mut bus);
        instructions += 1;

        if instructions % 100_000 == 0 {
            eprint!("\r[{instructions} instructions, PC=${:04X}]", cpu.pc());
        }

        if instructions > instruction_cap {
            eprintln!("\nexceeded {instruction_cap} instruction safety cap");
            return false;
        }
    }
}

fn run_decimal_test(binary: &[u8]) -> bool {
    let mut bus = RamBus::new();
    bus.load(0x0000, binary);

    let mut cpu = Cpu::new(Variant::Nmos6502NoIllegal);
    cpu.set_registers(0x0200, 0xFD, 0, 0, 0, mos_6502::Flags::new());

    let mut instructions: u64 = 0;
    let mut prev_pc: u16 = 0xFFFF;
    let mut same_pc_count = 0;

    loop {
        let start_pc = cpu.pc();

        if start_pc == prev_pc {
            same_pc_count += 1;
            if same_pc_count > 2 {
                eprintln!("trapped at ${start_pc:04X} after {instructions} instructions");
                let error = bus.peek(0x000B);
                eprintln!("error flag at $000B: ${error:02X}");
                if error != 0 {
                    let n1 = bus.peek(0x00);
                    let n2 = bus.peek(0x01);
                    let da = bus.peek(0x04);
                    let dnvzc = bus.peek(0x05);
                    let ar = bus.peek(0x06);
                    let cf = bus.peek(0x0A);
                    eprintln!("N1=${n1:02X}, N2=${n2:02X}");
                    eprintln!("actual: A=${da:02X}, flags=${dnvzc:02X}");
                    eprintln!("predicted: A=${ar:02X}, C=${cf:02X}");
                }
                return error == 0;
            }
        } else {
            same_pc_count = 0;
            prev_pc = start_pc;
        }

        cpu.step(&mut bus);
        instructions += 1;

        if instructions % 100_000 == 0 {
            eprint!("\r[{instructions} instructions, PC=${:04X}]", cpu.pc());
        }

        if instructions > 50_000_000 {
            eprintln!("\ndecimal test exceeded 50M instruction safety cap");
            return false;
        }
    }
}

#[test]
#[ignore = "requires tests/data/6502_functional_test.bin — run with --ignored"]
fn dormann_functional() {
    let binary = std::fs::read("tests/data/6502_functional_test.bin")
        .expect("tests/data/6502_functional_test.bin not found");
    assert!(
        run_dormann(&binary, 0x0400, 0x3469, 100_000_000),
        "Klaus Dormann 6502 functional test failed"
    );
}

#[test]
#[ignore = "requires tests/data/6502_decimal_test.bin — run with --ignored"]
fn dormann_decimal() {
    let binary = std::fs::read("tests/data/6502_decimal_test.bin")
        .expect("tests/data/6502_decimal_test.bin not found");
    assert!(run_decimal_test(&binary), "Klaus Dormann decimal test failed");
}

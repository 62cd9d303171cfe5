//! Integration tests using Tom Harte's `SingleStepTests` for the 6502 family.
//!
//! One JSON file per opcode, each holding thousands of individual cases that
//! specify an initial register/RAM snapshot, an expected final snapshot, and
//! the exact sequence of bus cycles (address, value, read/write) the
//! instruction should produce.
//!
//! Test data lives in `test-data/<variant>/v1/XX.json` relative to the
//! workspace root and is not vendored into this repository.

use mos_6502::{Bus, Cpu, Flags, Variant};
use serde::Deserialize;
use std::fs;
use std::path::Path;

struct TestBus {
    ram: [u8; 65536],
}

impl TestBus {
    #[allow(clippy::large_stack_arrays)]
    fn new() -> Self {
        Self { ram: [0; 65536] }
    }

    fn load_ram(&mut self, entries: &[(u16, u8)]) {
        for &(addr, value) in entries {
            self.ram[addr as usize] = value;
        }
    }
}

impl Bus for TestBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: RegSnapshot,
    #[serde(rename = "final")]
    final_state: RegSnapshot,
    cycles: Vec<(u16, u8, String)>,
}

#[derive(Deserialize)]
struct RegSnapshot {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

fn setup(cpu: &mut Cpu, bus: &mut TestBus, state: &RegSnapshot, variant: Variant) {
    bus.load_ram(&state.ram);
    *cpu = Cpu::new(variant);
    cpu.set_registers(state.pc, state.s, state.a, state.x, state.y, Flags::from_byte(state.p));
}

fn compare(cpu: &Cpu, bus: &TestBus, expected: &RegSnapshot) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = cpu.registers();

    if regs.pc != expected.pc {
        errors.push(format!("PC: got ${:04X}, want ${:04X}", regs.pc, expected.pc));
    }
    if regs.s != expected.s {
        errors.push(format!("S: got ${:02X}, want ${:02X}", regs.s, expected.s));
    }
    if regs.a != expected.a {
        errors.push(format!("A: got ${:02X}, want ${:02X}", regs.a, expected.a));
    }
    if regs.x != expected.x {
        errors.push(format!("X: got ${:02X}, want ${:02X}", regs.x, expected.x));
    }
    if regs.y != expected.y {
        errors.push(format!("Y: got ${:02X}, want ${:02X}", regs.y, expected.y));
    }

    let actual_p = regs.p.0;
    let expected_p = expected.p | 0x20;
    if actual_p != expected_p {
        errors.push(format!(
            "P: got ${actual_p:02X} ({actual_p:08b}), want ${expected_p:02X} ({expected_p:08b})"
        ));
    }

    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.ram[addr as usize];
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    errors
}

fn run_suite(variant: Variant, subdir: &str) {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data").join(subdir).join("v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests for {subdir}.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for opcode in 0..=0xFF_u8 {
        let filename = format!("{opcode:02x}.json");
        let path = test_dir.join(&filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        let tests: Vec<TestCase> = serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()));

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let mut cpu = Cpu::new(variant);
            let mut bus = TestBus::new();
            setup(&mut cpu, &mut bus, &test.initial, variant);

            for _ in 0..test.cycles.len() {
                cpu.clock(&mut bus);
            }

            let errors = compare(&cpu, &bus, &test.final_state);
            if errors.is_empty() {
                file_pass += 1;
            } else {
                file_fail += 1;
                if first_failures.len() < 5 {
                    first_failures.push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!(
            "Opcode ${opcode:02X} ({filename}): {status} — {file_pass}/{} passed",
            file_pass + file_fail
        );
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== SingleStepTests Summary ({subdir}) ===");
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );
    assert_eq!(total_fail, 0, "{total_fail} tests failed for {subdir}");
}

#[test]
#[ignore = "requires test-data/nmos6502 — run with --ignored"]
fn nmos6502() {
    run_suite(Variant::Nmos6502, "nmos6502");
}

#[test]
#[ignore = "requires test-data/wdc65c02 — run with --ignored"]
fn wdc65c02() {
    run_suite(Variant::Wdc65C02, "wdc65c02");
}

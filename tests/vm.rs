use pretty_assertions::assert_eq;

use i8085_rs::exec::IntExecutor;
use i8085_rs::isa::i8085::I8085Decoder;
use i8085_rs::vm::{LoadError, Status, MAX_RAM_SIZE};
use i8085_rs::{assemble, Cpu, CpuConfig, Exit, LinearMemory, Machine, MachineState, Trap};

fn run_src(src: &str) -> (Machine, Result<Exit, Trap>) {
    let code = assemble(src).unwrap();
    let mut vm = Machine::load(CpuConfig::default(), &code).unwrap();
    let exit = vm.run();
    (vm, exit)
}

#[test]
fn nop_hlt_halts_after_two_steps() {
    let (vm, exit) = run_src("NOP\nHLT");
    assert_eq!(exit.unwrap(), Exit::Halted);
    assert_eq!(
        vm.state(),
        MachineState {
            a: 0,
            b: 0,
            c: 0,
            pc: 2,
            halted: true,
            steps: 2,
        }
    );
}

#[test]
fn adi_wraps_modulo_256() {
    let (vm, exit) = run_src("MVI A,FF\nADI 02\nHLT");
    assert_eq!(exit.unwrap(), Exit::Halted);
    assert_eq!(vm.cpu.a, 0x01);
}

#[test]
fn sta_lda_round_trip() {
    let (mut vm, exit) = run_src("MVI A,42\nSTA 0100\nMVI A,00\nLDA 0100\nHLT");
    assert_eq!(exit.unwrap(), Exit::Halted);
    assert_eq!(vm.cpu.a, 0x42);
    assert_eq!(vm.read(0x0100).unwrap(), 0x42);
}

#[test]
fn mvi_targets_each_register() {
    let (vm, _) = run_src("MVI A,01 MVI B,02 MVI C,03");
    assert_eq!((vm.cpu.a, vm.cpu.b, vm.cpu.c), (1, 2, 3));
}

#[test]
fn end_of_program_is_normal_termination() {
    let (vm, exit) = run_src("MVI B, 09\nNOP");
    assert_eq!(exit.unwrap(), Exit::EndOfProgram);
    assert!(!vm.cpu.halted);
    assert_eq!(vm.cpu.pc, 3);
    assert_eq!(vm.steps(), 2);
}

#[test]
fn empty_program_finishes_immediately() {
    let mut vm = Machine::load(CpuConfig::default(), &[]).unwrap();
    assert_eq!(vm.run().unwrap(), Exit::EndOfProgram);
    assert_eq!(vm.steps(), 0);
}

#[test]
fn hlt_stops_before_trailing_bytes() {
    let mut vm = Machine::load(CpuConfig::default(), &[0x76, 0xFF]).unwrap();
    assert_eq!(vm.run().unwrap(), Exit::Halted);
    assert!(matches!(vm.step(), Err(Trap::Halted)));
}

#[test]
fn unknown_opcode_is_fatal_and_mutates_nothing() {
    let mut vm = Machine::load(CpuConfig::default(), &[0x3E, 0x11, 0xFF]).unwrap();
    let err = vm.run().unwrap_err();
    assert!(matches!(err, Trap::InvalidInstruction { pc: 2, opcode: 0xFF }));
    assert_eq!(vm.cpu.pc, 2);
    assert_eq!(vm.cpu.a, 0x11);
    assert_eq!(vm.steps(), 1);
}

#[test]
fn store_outside_ram_is_an_error() {
    let (mut vm, exit) = run_src("MVI A,77\nSTA FFFF\nHLT");
    assert!(matches!(exit, Err(Trap::Bus { addr: 0xFFFF, .. })));
    assert_eq!(vm.cpu.pc, 2);
    assert_eq!(vm.read(0xF9FF).unwrap(), 0);
}

#[test]
fn load_outside_ram_leaves_a_untouched() {
    let (vm, exit) = run_src("MVI A,55\nLDA FA00\nHLT");
    assert!(matches!(exit, Err(Trap::Bus { addr: 0xFA00, .. })));
    assert_eq!(vm.cpu.a, 0x55);
}

#[test]
fn last_valid_address_is_usable() {
    let (mut vm, exit) = run_src("MVI A,9C\nSTA F9FF\nMVI A,00\nLDA F9FF\nHLT");
    assert_eq!(exit.unwrap(), Exit::Halted);
    assert_eq!(vm.cpu.a, 0x9C);
    assert_eq!(vm.read(0xF9FF).unwrap(), 0x9C);
}

#[test]
fn truncated_final_instruction_is_an_error() {
    let mut vm = Machine::load(CpuConfig::default(), &[0x00, 0x32, 0x01]).unwrap();
    assert!(matches!(vm.run(), Err(Trap::Truncated { pc: 1 })));
    assert_eq!(vm.cpu.pc, 1);
}

#[test]
fn step_reports_status() {
    let code = assemble("NOP\nHLT").unwrap();
    let mut vm = Machine::load(CpuConfig::default(), &code).unwrap();
    assert_eq!(vm.status(), Status::Running);
    assert_eq!(vm.step().unwrap(), Status::Running);
    assert_eq!(vm.step().unwrap(), Status::Finished(Exit::Halted));
}

#[test]
fn step_budget_stops_run() {
    let code = assemble("NOP NOP NOP NOP").unwrap();
    let cfg = CpuConfig {
        max_steps: Some(3),
        ..CpuConfig::default()
    };
    let mut vm = Machine::load(cfg, &code).unwrap();
    assert!(matches!(vm.run(), Err(Trap::StepBudget(3))));
    assert_eq!(vm.steps(), 3);
}

#[test]
fn load_checks_ram_size() {
    let small = CpuConfig {
        ram_size: 4,
        ..CpuConfig::default()
    };
    assert!(matches!(
        Machine::load(small, &[0; 5]),
        Err(LoadError::ProgramTooLarge { len: 5, capacity: 4 })
    ));
    for ram_size in [0, MAX_RAM_SIZE + 1] {
        let cfg = CpuConfig {
            ram_size,
            ..CpuConfig::default()
        };
        assert!(matches!(Machine::load(cfg, &[]), Err(LoadError::RamSize(_))));
    }
}

#[test]
fn full_address_space_reaches_ffff() {
    let cfg = CpuConfig {
        ram_size: MAX_RAM_SIZE,
        ..CpuConfig::default()
    };
    let code = assemble("MVI A,AB\nSTA FFFF\nHLT").unwrap();
    let mut vm = Machine::load(cfg, &code).unwrap();
    assert_eq!(vm.run().unwrap(), Exit::Halted);
    assert_eq!(vm.read(0xFFFF).unwrap(), 0xAB);
}

#[test]
fn config_round_trips_through_json() {
    let cfg: CpuConfig = serde_json::from_str(r#"{ "ram_size": 1024 }"#).unwrap();
    assert_eq!(cfg.ram_size, 1024);
    assert_eq!(cfg.max_steps, CpuConfig::default().max_steps);
    let back: CpuConfig = serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn cpu_steps_directly_on_memory() {
    let mut mem = LinearMemory::new(16);
    mem.load(0, &[0x0E, 0x44, 0x76]).unwrap();
    let mut cpu = Cpu::new();
    cpu.reset(0);

    let dec = I8085Decoder::new();
    let exec = IntExecutor;
    cpu.step(&mut mem, &dec, &exec).unwrap();
    assert_eq!(cpu.c, 0x44);
    assert_eq!(cpu.pc, 2);
    cpu.step(&mut mem, &dec, &exec).unwrap();
    assert!(cpu.halted);
    assert!(matches!(cpu.step(&mut mem, &dec, &exec), Err(Trap::Halted)));
}

#[test]
fn cpu_fetch_outside_ram_is_bus_error() {
    let mut mem = LinearMemory::new(4);
    let mut cpu = Cpu::new();
    cpu.reset(4);
    let err = cpu.step(&mut mem, &I8085Decoder::new(), &IntExecutor).unwrap_err();
    assert!(matches!(err, Trap::Bus { addr: 4, .. }));
}

#[test]
fn program_filling_address_space_ends_at_last_byte() {
    let cfg = CpuConfig {
        ram_size: MAX_RAM_SIZE,
        max_steps: Some(200_000),
    };
    let mut vm = Machine::load(cfg, &vec![0x00; MAX_RAM_SIZE]).unwrap();
    assert_eq!(vm.run().unwrap(), Exit::EndOfProgram);
    assert_eq!(vm.steps(), MAX_RAM_SIZE as u64);
    assert!(!vm.cpu.halted);
}

#[test]
fn hlt_in_last_byte_of_address_space() {
    let cfg = CpuConfig {
        ram_size: MAX_RAM_SIZE,
        ..CpuConfig::default()
    };
    let mut program = vec![0x00; MAX_RAM_SIZE];
    program[MAX_RAM_SIZE - 3] = 0x3E;
    program[MAX_RAM_SIZE - 2] = 0x5A;
    program[MAX_RAM_SIZE - 1] = 0x76;
    let mut vm = Machine::load(cfg, &program).unwrap();
    assert_eq!(vm.run().unwrap(), Exit::Halted);
    assert_eq!(vm.cpu.a, 0x5A);
    assert!(matches!(vm.step(), Err(Trap::Halted)));
}

//! Whole-program scenarios: assemble source with `masm`, load it into a
//! `mano::Memory`, and run a `mano::Cpu` against it to completion. These
//! exercise the assembler and the CPU together rather than in isolation.

use mano::{Cpu, StepResult, StepState};
use masm::assemble;

fn assemble_ok(source: &str) -> masm::AssembleResult {
    let result = assemble(source);
    assert!(result.success, "assembling failed: {:?}", result.errors);
    result
}

fn run_to_halt(cpu: &mut Cpu, memory: &mut mano::Memory, max_steps: u32) {
    for _ in 0..max_steps {
        if !cpu.is_running() {
            return;
        }
        let result = cpu.step(memory);
        if result.state == StepState::Halted {
            return;
        }
    }
    panic!("program did not halt within {} micro-ops", max_steps);
}

/// Drives `cpu` through exactly one instruction (or interrupt cycle),
/// stopping early if it blocks on `INP`. A caller resuming from
/// `WaitingForInput` calls this again after [`Cpu::set_input`].
fn step_one_instruction(cpu: &mut Cpu, memory: &mut mano::Memory) -> StepResult {
    loop {
        let result = cpu.step(memory);
        if result.state == StepState::WaitingForInput || cpu.sc() == 0 {
            return result;
        }
    }
}

#[test]
fn add_two_numbers() {
    let source = "\
        ORG 100\n\
        LDA A\n\
        ADD B\n\
        STA C\n\
        HLT\n\
        A, DEC 5\n\
        B, DEC 3\n\
        C, DEC 0\n\
        END\n";
    let assembled = assemble_ok(source);

    let mut memory = mano::Memory::new();
    memory.load_program(&assembled.machine_code);
    let mut cpu = Cpu::new();
    cpu.set_pc(assembled.start_address);

    run_to_halt(&mut cpu, &mut memory, 100);

    assert_eq!(cpu.ac(), 0x0008);
    assert_eq!(memory.read(0x106), 0x0008);
    assert!(!cpu.e_flag());
}

#[test]
fn bsa_subroutine_negates_and_increments_x() {
    let source = "\
        ORG 100\n\
        BSA SUB\n\
        HLT\n\
        SUB, HEX 0\n\
        LDA X\n\
        CMA\n\
        INC\n\
        STA X\n\
        BUN SUB I\n\
        X, DEC 5\n\
        END\n";
    let assembled = assemble_ok(source);

    let mut memory = mano::Memory::new();
    memory.load_program(&assembled.machine_code);
    let mut cpu = Cpu::new();
    cpu.set_pc(assembled.start_address);

    run_to_halt(&mut cpu, &mut memory, 100);

    // X holds -5 in two's complement (CMA then INC on the loaded 5).
    assert_eq!(memory.read(0x108), 0xFFFB);
}

#[test]
fn isz_skip_pattern_over_three_executions() {
    let source = "\
        ORG 100\n\
        ISZ CELL\n\
        HLT\n\
        CELL, HEX FFFE\n\
        END\n";
    let assembled = assemble_ok(source);

    let mut memory = mano::Memory::new();
    memory.load_program(&assembled.machine_code);
    let mut cpu = Cpu::new();

    // 0xFFFE -> 0xFFFF: no skip, HLT retires normally.
    cpu.set_pc(assembled.start_address);
    run_to_halt(&mut cpu, &mut memory, 100);
    assert_eq!(memory.read(0x102), 0xFFFF);
    assert_eq!(cpu.pc(), 0x101);

    // 0xFFFF -> 0x0000: skip over the HLT at 0x101.
    cpu.set_pc(assembled.start_address);
    let result = step_one_instruction(&mut cpu, &mut memory);
    assert_eq!(result.state, StepState::Running);
    assert_eq!(memory.read(0x102), 0x0000);
    assert_eq!(cpu.pc(), 0x102, "ISZ must skip the following HLT");

    // 0x0000 -> 0x0001: no skip, runs into HLT and halts.
    cpu.set_pc(assembled.start_address);
    run_to_halt(&mut cpu, &mut memory, 100);
    assert_eq!(memory.read(0x102), 0x0001);
}

#[test]
fn pending_input_lets_ski_skip_without_clearing_fgi() {
    let source = "ORG 100\nSKI\nHLT\nHLT\nEND\n";
    let assembled = assemble_ok(source);

    let mut memory = mano::Memory::new();
    memory.load_program(&assembled.machine_code);
    let mut cpu = Cpu::new();
    cpu.set_pc(assembled.start_address);
    cpu.set_input(0x20);

    run_to_halt(&mut cpu, &mut memory, 100);

    // SKI skips the first HLT at 0x101, landing on the second at 0x102,
    // and leaves FGI set — only INP clears it.
    assert_eq!(cpu.pc(), 0x103);
    assert!(cpu.fgi());
}

#[test]
fn interrupt_round_trip_through_an_isr() {
    // ISR at 001: INP / OUT / LDA 000 / BUN 000 I
    // Main at 100: CLA / ION / LOOP, BUN LOOP
    let source = "\
        ORG 1\n\
        INP\n\
        OUT\n\
        LDA 000\n\
        BUN 000 I\n\
        ORG 100\n\
        CLA\n\
        ION\n\
        LOOP, BUN LOOP\n\
        END\n";
    let assembled = assemble_ok(source);

    let mut memory = mano::Memory::new();
    memory.load_program(&assembled.machine_code);
    let mut cpu = Cpu::new();
    cpu.set_pc(0x100);

    let output = std::rc::Rc::new(std::cell::RefCell::new(None));
    let output_clone = output.clone();
    cpu.set_on_output(move |byte| *output_clone.borrow_mut() = Some(byte));

    step_one_instruction(&mut cpu, &mut memory); // CLA
    assert_eq!(cpu.ac(), 0);

    step_one_instruction(&mut cpu, &mut memory); // ION
    assert!(cpu.ien());
    // FGO is ready from reset, so the interrupt is already pending the
    // instant IEN goes high — PC sits at the not-yet-executed `BUN LOOP`.
    assert_eq!(cpu.pc(), 0x102);
    let interrupted_pc = cpu.pc();

    // Next step is the one-step interrupt cycle, not a BUN fetch.
    let result = step_one_instruction(&mut cpu, &mut memory);
    assert_eq!(result.state, StepState::Running);
    assert_eq!(memory.read(0), interrupted_pc, "M[0] <- the interrupted PC");
    assert_eq!(cpu.pc(), 1, "vectored to the fixed ISR address");
    assert!(!cpu.ien(), "the interrupt cycle clears IEN");

    // INP blocks until the host supplies a byte.
    let result = step_one_instruction(&mut cpu, &mut memory);
    assert_eq!(result.state, StepState::WaitingForInput);
    cpu.set_input(0x41);
    step_one_instruction(&mut cpu, &mut memory);
    assert_eq!(cpu.ac() & 0xFF, 0x41);

    step_one_instruction(&mut cpu, &mut memory); // OUT
    assert_eq!(*output.borrow(), Some(0x41));

    step_one_instruction(&mut cpu, &mut memory); // LDA 000
    assert_eq!(cpu.ac(), interrupted_pc);

    step_one_instruction(&mut cpu, &mut memory); // BUN 000 I
    assert_eq!(
        cpu.pc(),
        interrupted_pc,
        "BUN 000 I resumes the interrupted instruction"
    );
}

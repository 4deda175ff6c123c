use super::decode::{self, ioi, rri, Decoded, MriOp};
use super::{StepResult, StepState};
use crate::arith::{add16, inc12, inc16};
use crate::memory::Memory;

/// The Mano basic computer's register/flag set and micro-op sequencer.
///
/// A `Cpu` owns no memory of its own — [`step`](Cpu::step) takes the
/// [`Memory`] it runs against as a borrowed argument, the way the teacher's
/// processor core takes its storage backend by reference rather than owning
/// it. This lets one `Cpu` be pointed at different memories (a fresh one
/// per test, for instance) without reconstructing the whole machine.
pub struct Cpu {
    ac: u16,
    dr: u16,
    ar: u16,
    pc: u16,
    ir: u16,
    tr: u16,
    inpr: u8,
    outr: u8,

    /// Sequence counter, 0 through 6.
    sc: u8,

    i_flag: bool,
    e_flag: bool,
    /// Run/halt flag. `false` after `HLT` retires.
    s_flag: bool,
    ien: bool,
    fgi: bool,
    fgo: bool,

    decoded: Option<Decoded>,

    on_output: Option<Box<dyn FnMut(u8)>>,
    on_input_required: Option<Box<dyn FnMut() -> Option<u8>>>,
}

impl Default for Cpu {
    fn default() -> Cpu {
        Cpu {
            ac: 0,
            dr: 0,
            ar: 0,
            pc: 0,
            ir: 0,
            tr: 0,
            inpr: 0,
            outr: 0,
            sc: 0,
            i_flag: false,
            e_flag: false,
            s_flag: true,
            ien: false,
            fgi: false,
            fgo: true,
            decoded: None,
            on_output: None,
            on_input_required: None,
        }
    }
}

impl Cpu {
    /// Constructs a new `Cpu` with every register and flag zeroed, `PC` at
    /// address 0, and the run flag set.
    pub fn new() -> Cpu {
        Cpu::default()
    }

    /// Resets every register and flag to its power-on value. Callback hooks
    /// registered via [`Cpu::set_on_output`] and
    /// [`Cpu::set_on_input_required`] are left in place.
    pub fn reset(&mut self) {
        let on_output = self.on_output.take();
        let on_input_required = self.on_input_required.take();
        *self = Cpu::default();
        self.on_output = on_output;
        self.on_input_required = on_input_required;
    }

    /// Overrides `PC`, masked to 12 bits, and sets the run flag so a halted
    /// machine can be restarted at a new entry point.
    pub fn set_pc(&mut self, address: u16) {
        self.pc = address & 0x0FFF;
        self.s_flag = true;
    }

    /// Supplies one byte of input, setting `FGI` so a pending or future
    /// `INP` can complete.
    pub fn set_input(&mut self, byte: u8) {
        self.inpr = byte;
        self.fgi = true;
    }

    /// Clears `FGI` without supplying a byte — used to model an input
    /// device going idle again. Does not touch `INPR`.
    pub fn clear_input(&mut self) {
        self.fgi = false;
    }

    /// Re-raises `FGO` after an `OUT`-delivered byte has been accepted.
    /// `OUT` only ever clears `FGO`; the core never re-raises it on its
    /// own (no wall-clock timer is modeled), so a collaborator that wants
    /// the output device to report ready again calls this — typically
    /// from inside its `on_output` callback, or any time afterwards.
    pub fn set_output_ready(&mut self) {
        self.fgo = true;
    }

    /// Registers a callback invoked with the byte placed in `OUTR` each
    /// time `OUT` retires, in addition to the value reported via
    /// [`StepResult::output`].
    pub fn set_on_output<F>(&mut self, callback: F)
    where
        F: FnMut(u8) + 'static,
    {
        self.on_output = Some(Box::new(callback));
    }

    /// Registers a callback consulted when `INP` finds `FGI` clear. If it
    /// returns `Some(byte)`, that byte is accepted immediately instead of
    /// leaving the step loop in [`StepState::WaitingForInput`]. May be
    /// called repeatedly while the CPU sits in that state.
    pub fn set_on_input_required<F>(&mut self, callback: F)
    where
        F: FnMut() -> Option<u8> + 'static,
    {
        self.on_input_required = Some(Box::new(callback));
    }

    pub fn ac(&self) -> u16 {
        self.ac
    }
    pub fn dr(&self) -> u16 {
        self.dr
    }
    pub fn ar(&self) -> u16 {
        self.ar
    }
    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn ir(&self) -> u16 {
        self.ir
    }
    pub fn tr(&self) -> u16 {
        self.tr
    }
    pub fn inpr(&self) -> u8 {
        self.inpr
    }
    pub fn outr(&self) -> u8 {
        self.outr
    }
    pub fn sc(&self) -> u8 {
        self.sc
    }
    pub fn e_flag(&self) -> bool {
        self.e_flag
    }
    pub fn i_flag(&self) -> bool {
        self.i_flag
    }
    pub fn is_running(&self) -> bool {
        self.s_flag
    }
    pub fn ien(&self) -> bool {
        self.ien
    }
    pub fn fgi(&self) -> bool {
        self.fgi
    }
    pub fn fgo(&self) -> bool {
        self.fgo
    }

    /// `R = IEN ∧ (FGI ∨ FGO)` — whether an interrupt is currently pending.
    pub fn interrupt_pending(&self) -> bool {
        self.ien && (self.fgi || self.fgo)
    }

    fn snapshot(&self, state: StepState, message: impl Into<String>, output: Option<u8>) -> StepResult {
        StepResult {
            state,
            message: message.into(),
            sc: self.sc,
            pc: self.pc,
            ar: self.ar,
            ac: self.ac,
            dr: self.dr,
            ir: self.ir,
            output,
        }
    }

    fn running(&self, message: impl Into<String>) -> StepResult {
        self.snapshot(StepState::Running, message, None)
    }

    fn halted(&self, message: impl Into<String>) -> StepResult {
        self.snapshot(StepState::Halted, message, None)
    }

    fn waiting_for_input(&self, message: impl Into<String>) -> StepResult {
        self.snapshot(StepState::WaitingForInput, message, None)
    }

    fn with_output(&self, message: impl Into<String>, byte: u8) -> StepResult {
        self.snapshot(StepState::Running, message, Some(byte))
    }

    /// Advances the machine by exactly one micro-operation.
    ///
    /// Returns immediately with [`StepState::Halted`] without touching any
    /// register if the machine is already halted — callers are expected to
    /// check [`Cpu::is_running`] themselves if they want to avoid the
    /// no-op call, but this makes a step loop that doesn't bother checking
    /// safe either way.
    pub fn step(&mut self, memory: &mut Memory) -> StepResult {
        if !self.s_flag {
            return self.halted("halted");
        }

        match self.sc {
            0 => self.step_t0(memory),
            1 => self.step_t1(memory),
            2 => self.step_t2(),
            3 => self.step_t3(memory),
            4 => self.step_t4(memory),
            5 => self.step_t5(memory),
            6 => self.step_t6(memory),
            _ => {
                self.sc = 0;
                self.running("invalid sequence counter, reset to 0")
            }
        }
    }

    fn step_t0(&mut self, memory: &mut Memory) -> StepResult {
        if self.interrupt_pending() {
            self.tr = self.pc;
            self.ar = 0;
            memory.write(self.ar, self.tr);
            self.pc = 1;
            self.ien = false;
            // SC stays at 0: the next step begins a fresh instruction fetch
            // for the interrupt handler at M[1].
            return self.running("interrupt: AR <- 0, M[0] <- PC, PC <- 1, IEN <- 0");
        }

        self.ar = self.pc;
        self.sc = 1;
        self.running("T0: AR <- PC")
    }

    fn step_t1(&mut self, memory: &mut Memory) -> StepResult {
        self.ir = memory.read(self.ar);
        self.pc = inc12(self.pc);
        self.sc = 2;
        self.running("T1: IR <- M[AR], PC <- PC+1")
    }

    fn step_t2(&mut self) -> StepResult {
        let decoded = decode::decode(self.ir);
        self.i_flag = matches!(decoded, Decoded::Mri { indirect: true, .. });
        if let Decoded::Mri { address, .. } = decoded {
            self.ar = address;
        }
        self.decoded = Some(decoded);
        self.sc = 3;
        self.running("T2: decode IR")
    }

    fn step_t3(&mut self, memory: &mut Memory) -> StepResult {
        match self.decoded {
            Some(Decoded::Rri { mask }) => {
                self.sc = 0;
                let (message, halted) = self.execute_rri(mask);
                self.end_of_instruction();
                if halted {
                    self.halted(message)
                } else {
                    self.running(message)
                }
            }
            Some(Decoded::Ioi { mask }) => self.execute_ioi(mask),
            Some(Decoded::Mri { indirect, .. }) => {
                if indirect {
                    self.ar = memory.read(self.ar);
                    self.sc = 4;
                    self.running("T3: AR <- M[AR] (indirect)")
                } else {
                    self.sc = 4;
                    self.running("T3: direct addressing, no-op")
                }
            }
            None => unreachable!("T3 reached without a decoded instruction"),
        }
    }

    fn step_t4(&mut self, memory: &mut Memory) -> StepResult {
        let op = self.mri_op();
        match op {
            MriOp::And | MriOp::Add | MriOp::Lda | MriOp::Isz => {
                self.dr = memory.read(self.ar);
                self.sc = 5;
                self.running(format!("T4 ({:?}): DR <- M[AR]", op))
            }
            MriOp::Sta => {
                memory.write(self.ar, self.ac);
                self.sc = 0;
                self.end_of_instruction();
                self.running("T4 (STA): M[AR] <- AC")
            }
            MriOp::Bun => {
                self.pc = self.ar;
                self.sc = 0;
                self.end_of_instruction();
                self.running("T4 (BUN): PC <- AR")
            }
            MriOp::Bsa => {
                memory.write(self.ar, self.pc);
                self.ar = inc12(self.ar);
                self.sc = 5;
                self.running("T4 (BSA): M[AR] <- PC, AR <- AR+1")
            }
        }
    }

    fn step_t5(&mut self, memory: &mut Memory) -> StepResult {
        let _ = memory;
        let op = self.mri_op();
        match op {
            MriOp::And => {
                self.ac &= self.dr;
                self.sc = 0;
                self.end_of_instruction();
                self.running("T5 (AND): AC <- AC & DR")
            }
            MriOp::Add => {
                let (sum, carry) = add16(self.ac, self.dr);
                self.ac = sum;
                self.e_flag = carry;
                self.sc = 0;
                self.end_of_instruction();
                self.running("T5 (ADD): AC <- AC + DR, E <- carry")
            }
            MriOp::Lda => {
                self.ac = self.dr;
                self.sc = 0;
                self.end_of_instruction();
                self.running("T5 (LDA): AC <- DR")
            }
            MriOp::Bsa => {
                self.pc = self.ar;
                self.sc = 0;
                self.end_of_instruction();
                self.running("T5 (BSA): PC <- AR")
            }
            MriOp::Isz => {
                self.dr = inc16(self.dr);
                self.sc = 6;
                self.running("T5 (ISZ): DR <- DR+1")
            }
            MriOp::Sta | MriOp::Bun => {
                unreachable!("{:?} retires at T4", op)
            }
        }
    }

    fn step_t6(&mut self, memory: &mut Memory) -> StepResult {
        debug_assert_eq!(self.mri_op(), MriOp::Isz);
        memory.write(self.ar, self.dr);
        let skipped = self.dr == 0;
        if skipped {
            self.pc = inc12(self.pc);
        }
        self.sc = 0;
        self.end_of_instruction();
        self.running(if skipped {
            "T6 (ISZ): M[AR] <- DR, skip"
        } else {
            "T6 (ISZ): M[AR] <- DR"
        })
    }

    fn mri_op(&self) -> MriOp {
        match self.decoded {
            Some(Decoded::Mri { op, .. }) => op,
            other => unreachable!("expected a decoded MRI instruction, found {:?}", other),
        }
    }

    /// Applies a register-reference instruction's micro-ops in their fixed
    /// bit order. Multiple bits may be set at once; where two would
    /// conflict (more than one skip condition, say) the highest-priority
    /// bit in this order is the one whose effect survives in the reported
    /// message, but every bit's register effect is still applied.
    fn execute_rri(&mut self, mask: u16) -> (&'static str, bool) {
        let mut message = "RRI: no-op";
        if mask & rri::CLA != 0 {
            self.ac = 0;
            message = "RRI (CLA): AC <- 0";
        }
        if mask & rri::CLE != 0 {
            self.e_flag = false;
            message = "RRI (CLE): E <- 0";
        }
        if mask & rri::CMA != 0 {
            self.ac = !self.ac;
            message = "RRI (CMA): AC <- ~AC";
        }
        if mask & rri::CME != 0 {
            self.e_flag = !self.e_flag;
            message = "RRI (CME): E <- ~E";
        }
        if mask & rri::CIR != 0 {
            let carry_out = self.ac & 1 != 0;
            self.ac = (self.ac >> 1) | ((self.e_flag as u16) << 15);
            self.e_flag = carry_out;
            message = "RRI (CIR): rotate AC right through E";
        }
        if mask & rri::CIL != 0 {
            let carry_out = self.ac & 0x8000 != 0;
            self.ac = (self.ac << 1) | (self.e_flag as u16);
            self.e_flag = carry_out;
            message = "RRI (CIL): rotate AC left through E";
        }
        if mask & rri::INC != 0 {
            self.ac = inc16(self.ac);
            message = "RRI (INC): AC <- AC+1";
        }
        // SPA uses the source's stricter "strictly positive" reading
        // (sign bit clear *and* AC nonzero) rather than the textbook
        // "sign bit clear" definition.
        if mask & rri::SPA != 0 && self.ac & 0x8000 == 0 && self.ac != 0 {
            self.pc = inc12(self.pc);
            message = "RRI (SPA): skip, AC strictly positive";
        }
        if mask & rri::SNA != 0 && self.ac & 0x8000 != 0 {
            self.pc = inc12(self.pc);
            message = "RRI (SNA): skip, AC negative";
        }
        if mask & rri::SZA != 0 && self.ac == 0 {
            self.pc = inc12(self.pc);
            message = "RRI (SZA): skip, AC zero";
        }
        if mask & rri::SZE != 0 && !self.e_flag {
            self.pc = inc12(self.pc);
            message = "RRI (SZE): skip, E zero";
        }
        if mask & rri::HLT != 0 {
            self.s_flag = false;
            return ("RRI (HLT): S <- false", true);
        }
        (message, false)
    }

    fn execute_ioi(&mut self, mask: u16) -> StepResult {
        if mask & ioi::INP != 0 {
            if !self.fgi {
                if let Some(callback) = self.on_input_required.as_mut() {
                    if let Some(byte) = callback() {
                        self.inpr = byte;
                        self.fgi = true;
                    }
                }
            }
            if !self.fgi {
                // INP blocks: stay at T3 so the next step retries it once
                // the caller supplies input via `set_input`.
                return self.waiting_for_input("IOI (INP): waiting for FGI");
            }
            self.ac = (self.ac & 0xFF00) | u16::from(self.inpr);
            self.fgi = false;
            self.sc = 0;
            self.end_of_instruction();
            return self.running("IOI (INP): AC[0..7] <- INPR");
        }
        if mask & ioi::OUT != 0 {
            self.outr = (self.ac & 0xFF) as u8;
            let byte = self.outr;
            self.fgo = false;
            if let Some(callback) = self.on_output.as_mut() {
                callback(byte);
            }
            self.sc = 0;
            self.end_of_instruction();
            return self.with_output("IOI (OUT): OUTR <- AC[0..7]", byte);
        }
        let mut message = "IOI: no-op";
        if mask & ioi::SKI != 0 && self.fgi {
            self.pc = inc12(self.pc);
            message = "IOI (SKI): skip, FGI set";
        }
        if mask & ioi::SKO != 0 && self.fgo {
            self.pc = inc12(self.pc);
            message = "IOI (SKO): skip, FGO set";
        }
        if mask & ioi::ION != 0 {
            self.ien = true;
            message = "IOI (ION): IEN <- 1";
        }
        if mask & ioi::IOF != 0 {
            self.ien = false;
            message = "IOI (IOF): IEN <- 0";
        }
        self.sc = 0;
        self.end_of_instruction();
        self.running(message)
    }

    /// `R` is derived on demand from `IEN`/`FGI`/`FGO` via
    /// [`Cpu::interrupt_pending`] rather than latched into its own field;
    /// this is where a hardware model would latch it, kept as the single
    /// place instruction completion is recognized.
    fn end_of_instruction(&mut self) {}
}

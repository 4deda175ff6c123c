//! The micro-operation-stepping control unit.
//!
//! [`Cpu::step`] advances the machine by exactly one micro-operation and
//! reports what happened via [`StepResult`]. Driving the machine to
//! completion is the caller's job — run a loop calling `step` until it
//! returns [`StepState::Halted`], or until some other budget is exhausted.
//! This mirrors the teacher's `Processor::run` taking the storage backend
//! as a borrowed argument rather than owning it, except here the caller
//! also owns the loop instead of the processor owning it.

mod core;
mod decode;

pub use self::core::Cpu;
pub use decode::{ioi, rri, Decoded, MriOp};

/// What a single [`Cpu::step`] call just did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepState {
    /// The machine is running normally; no special condition was hit.
    Running,
    /// `HLT` retired. The CPU will not advance further until reset or
    /// [`Cpu::set_pc`] is called.
    Halted,
    /// `INP` is waiting on `FGI`; the caller must supply input via
    /// [`Cpu::set_input`] and step again.
    WaitingForInput,
}

/// The outcome of one [`Cpu::step`] call: what phase just ran, a short
/// description of the micro-op, and a snapshot of the registers a display
/// collaborator would want without re-reading the whole `Cpu`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StepResult {
    pub state: StepState,
    /// A short, human-readable description of the micro-op just performed,
    /// e.g. `"T1: IR <- M[AR], PC <- PC+1"`.
    pub message: String,
    pub sc: u8,
    pub pc: u16,
    pub ar: u16,
    pub ac: u16,
    pub dr: u16,
    pub ir: u16,
    /// Set on the micro-op that retires `OUT`; carries the byte placed in
    /// `OUTR`. The crate does not decide how output is displayed — callers
    /// either poll this field or register an `on_output` callback.
    pub output: Option<u8>,
}

//! In-memory register block.
//!
//! Stands in for the mapped hardware in tests and in dry runs of the CLI.
//! Every write is recorded so the order of a register protocol can be
//! checked, not just its end state.

use crate::registers::{Channel, Register, RegisterIo};

/// Simulated PWM register block with a write log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedRegisters {
    words: [u32; 3],
    writes: Vec<(Register, u32)>,
}

impl SimulatedRegisters {
    /// Block with every register zeroed (hardware reset value).
    pub fn new() -> Self {
        Self::default()
    }

    /// Block with a preset control word.
    pub fn with_ctrl(ctrl: u32) -> Self {
        Self {
            words: [ctrl, 0, 0],
            writes: Vec::new(),
        }
    }

    /// Current control word.
    pub fn ctrl(&self) -> u32 {
        self.words[Register::Ctrl.word()]
    }

    /// Current period register of `channel`.
    pub fn period(&self, channel: Channel) -> u32 {
        self.words[channel.period_register().word()]
    }

    /// Writes since creation or the last [`clear_log`](Self::clear_log).
    pub fn writes(&self) -> &[(Register, u32)] {
        &self.writes
    }

    /// Forget recorded writes, keeping register contents.
    pub fn clear_log(&mut self) {
        self.writes.clear();
    }
}

impl RegisterIo for SimulatedRegisters {
    fn read(&self, reg: Register) -> u32 {
        self.words[reg.word()]
    }

    fn write(&mut self, reg: Register, value: u32) {
        self.words[reg.word()] = value;
        self.writes.push((reg, value));
    }
}

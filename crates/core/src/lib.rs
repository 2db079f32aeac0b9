// FirstLight - Hardware Bring-up Sequencer
// Copyright (C) 2026 FirstLight Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod sequencer;
pub mod sim;
pub mod step;

mod tests;

pub use sequencer::{BringupConfig, BringupReport, BringupSequencer, BringupState};
pub use step::{InitStep, StepKind, BANNER_MSG, COMPLETION_MSG, SEQUENCE};

#[derive(Debug, thiserror::Error)]
pub enum BringupError {
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),
    #[error("no UART port {0} on this board")]
    UnknownPort(u8),
    #[error("diagnostic print before UART bring-up")]
    ConsoleNotBound,
    #[error("debug stub: {0}")]
    DebugStub(String),
}

pub type BringupResult<T> = Result<T, BringupError>;

/// UART driver collaborator. Configures the serial hardware and selects
/// which physical port carries diagnostic output.
pub trait UartDriver {
    fn init(&mut self, rx_baud: u32, tx_baud: u32) -> BringupResult<()>;
    fn set_print_port(&mut self, port: u8) -> BringupResult<()>;
}

/// Diagnostic output collaborator. Writes go to whichever port the UART
/// driver bound last.
pub trait DiagnosticSink {
    fn print(&mut self, message: &str) -> BringupResult<()>;
}

/// Debug-stub collaborator. The `ENABLED` const is the build-time debug
/// capability: a release build selects [`NullDebugStub`] and the sequencer
/// skips the debug-only steps entirely.
pub trait DebugStub {
    const ENABLED: bool;

    /// Install exception/trap handlers so an external debugger can attach.
    fn install(&mut self) -> BringupResult<()>;

    /// Trigger a software breakpoint. Blocks until an attached debugger
    /// resumes execution; with no debugger attached this never returns.
    fn break_now(&mut self) -> BringupResult<()>;
}

/// Statically-selected release variant of the debug capability. Both
/// operations are unreachable because the sequencer skips debug-only steps
/// when `ENABLED` is false.
#[derive(Debug, Default)]
pub struct NullDebugStub;

impl DebugStub for NullDebugStub {
    const ENABLED: bool = false;

    fn install(&mut self) -> BringupResult<()> {
        Ok(())
    }

    fn break_now(&mut self) -> BringupResult<()> {
        Ok(())
    }
}

/// Trait for observing the bring-up sequence in a modular way.
pub trait BringupObserver: std::fmt::Debug + Send + Sync {
    fn on_step_start(&self, _step: &InitStep) {}
    fn on_step_complete(&self, _step: &InitStep) {}
    fn on_state_change(&self, _state: BringupState) {}
}

// FirstLight - Hardware Bring-up Sequencer
// Copyright (C) 2026 FirstLight Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::step::{StepKind, BANNER_MSG, COMPLETION_MSG, SEQUENCE};
use crate::{BringupObserver, BringupResult, DebugStub, DiagnosticSink, UartDriver};
use serde::Serialize;
use std::sync::Arc;

/// Build-time bring-up configuration. Matches the ESP8266-class defaults:
/// 115200/115200 with diagnostics on UART0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupConfig {
    pub rx_baud: u32,
    pub tx_baud: u32,
    pub print_port: u8,
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            rx_baud: 115_200,
            tx_baud: 115_200,
            print_port: 0,
        }
    }
}

/// Linear bring-up state machine. `DebugInstalled` and `Halted` are
/// reachable only when the debug capability is compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BringupState {
    NotStarted,
    UartReady,
    DebugInstalled,
    Halted,
    Complete,
}

/// Runs the fixed power-on sequence exactly once, then hands the UART
/// peripheral back to the caller.
pub struct BringupSequencer<U, D, S> {
    config: BringupConfig,
    uart: U,
    stub: D,
    sink: S,
    state: BringupState,
    observers: Vec<Arc<dyn BringupObserver>>,
}

/// What `run()` leaves behind: the UART handle, now owned by the
/// application, and the terminal state the sequence reached.
#[derive(Debug)]
pub struct BringupReport<U> {
    pub uart: U,
    pub state: BringupState,
}

impl<U, D, S> BringupSequencer<U, D, S>
where
    U: UartDriver,
    D: DebugStub,
    S: DiagnosticSink,
{
    pub fn new(config: BringupConfig, uart: U, stub: D, sink: S) -> Self {
        Self {
            config,
            uart,
            stub,
            sink,
            state: BringupState::NotStarted,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BringupObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> BringupState {
        self.state
    }

    fn enter(&mut self, state: BringupState) {
        self.state = state;
        tracing::debug!(?state, "bring-up state change");
        for observer in &self.observers {
            observer.on_state_change(state);
        }
    }

    /// Run the sequence to completion. Consumes the sequencer so the UART
    /// ownership handoff to the application is an explicit move.
    ///
    /// In a debug build this suspends at the breakpoint trap until the
    /// attached debugger resumes execution.
    pub fn run(mut self) -> BringupResult<BringupReport<U>> {
        for step in SEQUENCE.iter() {
            if step.debug_only && !D::ENABLED {
                tracing::trace!(step = step.name, "skipped (release capability)");
                continue;
            }

            tracing::debug!(step = step.name, "running init step");
            for observer in &self.observers {
                observer.on_step_start(step);
            }

            match step.kind {
                StepKind::UartInit => {
                    self.uart.init(self.config.rx_baud, self.config.tx_baud)?;
                    self.enter(BringupState::UartReady);
                }
                StepKind::BindPrintPort => {
                    self.uart.set_print_port(self.config.print_port)?;
                }
                StepKind::InstallDebugStub => {
                    self.stub.install()?;
                    self.enter(BringupState::DebugInstalled);
                }
                StepKind::PrintBanner => {
                    self.sink.print(BANNER_MSG)?;
                }
                StepKind::BreakTrap => {
                    // Halted is entered before the trap fires: break_now
                    // does not return until the debugger resumes us.
                    self.enter(BringupState::Halted);
                    self.stub.break_now()?;
                }
                StepKind::PrintCompletion => {
                    self.sink.print(COMPLETION_MSG)?;
                }
            }

            for observer in &self.observers {
                observer.on_step_complete(step);
            }
        }

        self.enter(BringupState::Complete);
        Ok(BringupReport {
            uart: self.uart,
            state: self.state,
        })
    }
}

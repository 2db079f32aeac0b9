// FirstLight - Hardware Bring-up Sequencer
// Copyright (C) 2026 FirstLight Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{BringupError, BringupResult, DiagnosticSink, UartDriver};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Baud rates the simulated UART accepts. 74880 is the ESP8266 boot-ROM
/// rate; the rest are the usual serial-console set.
pub const SUPPORTED_BAUDS: [u32; 7] = [9_600, 19_200, 38_400, 57_600, 74_880, 115_200, 230_400];

/// One recorded collaborator call, in the order it happened. Tests use the
/// event log for happens-before assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    UartInit { rx_baud: u32, tx_baud: u32 },
    PrintPortBound(u8),
    Print(String),
}

#[derive(Debug)]
struct BoardState {
    ports: u8,
    echo_stdout: bool,
    uart_timing: Option<(u32, u32)>,
    bound_port: Option<u8>,
    events: Vec<SimEvent>,
}

/// Host-side stand-in for the device. Hands out the UART driver and the
/// diagnostic console as separate collaborator handles over shared board
/// state, and keeps the call-order log.
#[derive(Debug, Clone)]
pub struct SimBoard {
    state: Rc<RefCell<BoardState>>,
}

impl SimBoard {
    pub fn new(ports: u8) -> Self {
        Self::with_echo(ports, true)
    }

    /// A board that does not mirror diagnostics to stdout, for tests.
    pub fn silent(ports: u8) -> Self {
        Self::with_echo(ports, false)
    }

    fn with_echo(ports: u8, echo_stdout: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(BoardState {
                ports,
                echo_stdout,
                uart_timing: None,
                bound_port: None,
                events: Vec::new(),
            })),
        }
    }

    pub fn uart(&self) -> SimUart {
        SimUart {
            state: self.state.clone(),
        }
    }

    pub fn console(&self) -> SimConsole {
        SimConsole {
            state: self.state.clone(),
        }
    }

    /// Diagnostic lines printed so far, across all resets.
    pub fn transcript(&self) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|ev| match ev {
                SimEvent::Print(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Full collaborator call log, across all resets.
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }
}

/// Simulated UART driver. Rejects rates real silicon cannot clock and port
/// indices the board does not have.
#[derive(Debug)]
pub struct SimUart {
    state: Rc<RefCell<BoardState>>,
}

impl UartDriver for SimUart {
    fn init(&mut self, rx_baud: u32, tx_baud: u32) -> BringupResult<()> {
        for baud in [rx_baud, tx_baud] {
            if !SUPPORTED_BAUDS.contains(&baud) {
                return Err(BringupError::UnsupportedBaud(baud));
            }
        }
        let mut st = self.state.borrow_mut();
        // A watchdog reset re-runs init; the port binding does not survive it.
        st.uart_timing = Some((rx_baud, tx_baud));
        st.bound_port = None;
        st.events.push(SimEvent::UartInit { rx_baud, tx_baud });
        tracing::info!(rx_baud, tx_baud, "uart initialized");
        Ok(())
    }

    fn set_print_port(&mut self, port: u8) -> BringupResult<()> {
        let mut st = self.state.borrow_mut();
        if port >= st.ports {
            return Err(BringupError::UnknownPort(port));
        }
        st.bound_port = Some(port);
        st.events.push(SimEvent::PrintPortBound(port));
        tracing::debug!(port, "print port bound");
        Ok(())
    }
}

/// Simulated diagnostic console. Printing before the UART is initialized
/// and a port is bound is an error here; on hardware it would just be
/// silence on the wire.
#[derive(Debug)]
pub struct SimConsole {
    state: Rc<RefCell<BoardState>>,
}

impl DiagnosticSink for SimConsole {
    fn print(&mut self, message: &str) -> BringupResult<()> {
        let mut st = self.state.borrow_mut();
        if st.uart_timing.is_none() || st.bound_port.is_none() {
            return Err(BringupError::ConsoleNotBound);
        }
        st.events.push(SimEvent::Print(message.to_string()));
        if st.echo_stdout {
            println!("{message}");
            let _ = io::stdout().flush();
        }
        Ok(())
    }
}

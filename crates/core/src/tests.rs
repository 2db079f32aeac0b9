#[cfg(test)]
mod tests {
    use crate::sim::{SimBoard, SimEvent};
    use crate::{
        BringupConfig, BringupError, BringupObserver, BringupResult, BringupSequencer,
        BringupState, DebugStub, NullDebugStub, BANNER_MSG, COMPLETION_MSG,
    };
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct StateLog(Mutex<Vec<BringupState>>);

    impl BringupObserver for StateLog {
        fn on_state_change(&self, state: BringupState) {
            self.0.lock().unwrap().push(state);
        }
    }

    /// Debug stub that records how many lines had been printed when the
    /// trap fired, then "resumes" immediately.
    struct TrapRecorder {
        board: SimBoard,
        prints_at_break: Rc<Cell<Option<usize>>>,
    }

    impl DebugStub for TrapRecorder {
        const ENABLED: bool = true;

        fn install(&mut self) -> BringupResult<()> {
            Ok(())
        }

        fn break_now(&mut self) -> BringupResult<()> {
            self.prints_at_break
                .set(Some(self.board.transcript().len()));
            Ok(())
        }
    }

    fn release_sequencer(
        board: &SimBoard,
    ) -> BringupSequencer<crate::sim::SimUart, NullDebugStub, crate::sim::SimConsole> {
        BringupSequencer::new(
            BringupConfig::default(),
            board.uart(),
            NullDebugStub,
            board.console(),
        )
    }

    #[test]
    fn test_release_run_reaches_complete() {
        let board = SimBoard::silent(2);
        let log = Arc::new(StateLog::default());
        let mut seq = release_sequencer(&board);
        seq.add_observer(log.clone());

        let report = seq.run().unwrap();
        assert_eq!(report.state, BringupState::Complete);

        // The debug-only states must never be entered in a release run.
        let states = log.0.lock().unwrap().clone();
        assert_eq!(states, vec![BringupState::UartReady, BringupState::Complete]);
    }

    #[test]
    fn test_release_transcript_is_exactly_two_messages() {
        let board = SimBoard::silent(2);
        release_sequencer(&board).run().unwrap();
        assert_eq!(board.transcript(), vec![BANNER_MSG, COMPLETION_MSG]);
    }

    #[test]
    fn test_uart_init_precedes_first_print() {
        let board = SimBoard::silent(2);
        release_sequencer(&board).run().unwrap();

        let events = board.events();
        let init_at = events
            .iter()
            .position(|ev| matches!(ev, SimEvent::UartInit { .. }))
            .unwrap();
        let first_print_at = events
            .iter()
            .position(|ev| matches!(ev, SimEvent::Print(_)))
            .unwrap();
        assert!(init_at < first_print_at);
        // The port binding sits between the two as well.
        let bound_at = events
            .iter()
            .position(|ev| matches!(ev, SimEvent::PrintPortBound(_)))
            .unwrap();
        assert!(init_at < bound_at && bound_at < first_print_at);
    }

    #[test]
    fn test_configured_bauds_reach_driver_unmodified() {
        let board = SimBoard::silent(2);
        release_sequencer(&board).run().unwrap();
        assert_eq!(
            board.events()[0],
            SimEvent::UartInit {
                rx_baud: 115_200,
                tx_baud: 115_200
            }
        );
    }

    #[test]
    fn test_watchdog_restart_is_idempotent() {
        let board = SimBoard::silent(2);

        let report = release_sequencer(&board).run().unwrap();
        assert_eq!(report.state, BringupState::Complete);

        // Simulated watchdog reset: a fresh sequencer around the UART
        // handle the first run gave back.
        let seq = BringupSequencer::new(
            BringupConfig::default(),
            report.uart,
            NullDebugStub,
            board.console(),
        );
        seq.run().unwrap();

        let events = board.events();
        assert_eq!(events.len() % 2, 0);
        let (first, second) = events.split_at(events.len() / 2);
        assert_eq!(first, second);
        assert_eq!(
            board.transcript(),
            vec![BANNER_MSG, COMPLETION_MSG, BANNER_MSG, COMPLETION_MSG]
        );
    }

    #[test]
    fn test_debug_run_halts_after_single_message() {
        let board = SimBoard::silent(2);
        let prints_at_break = Rc::new(Cell::new(None));
        let stub = TrapRecorder {
            board: board.clone(),
            prints_at_break: prints_at_break.clone(),
        };

        let log = Arc::new(StateLog::default());
        let mut seq =
            BringupSequencer::new(BringupConfig::default(), board.uart(), stub, board.console());
        seq.add_observer(log.clone());

        let report = seq.run().unwrap();
        assert_eq!(report.state, BringupState::Complete);

        // Exactly one message out when the trap fired; the second came
        // only after the resume.
        assert_eq!(prints_at_break.get(), Some(1));
        assert_eq!(board.transcript(), vec![BANNER_MSG, COMPLETION_MSG]);

        let states = log.0.lock().unwrap().clone();
        assert_eq!(
            states,
            vec![
                BringupState::UartReady,
                BringupState::DebugInstalled,
                BringupState::Halted,
                BringupState::Complete
            ]
        );
    }

    #[test]
    fn test_unsupported_baud_is_rejected() {
        let board = SimBoard::silent(2);
        let config = BringupConfig {
            rx_baud: 123_456,
            ..BringupConfig::default()
        };
        let seq = BringupSequencer::new(config, board.uart(), NullDebugStub, board.console());
        match seq.run() {
            Err(BringupError::UnsupportedBaud(baud)) => assert_eq!(baud, 123_456),
            other => panic!("expected UnsupportedBaud, got {:?}", other.map(|r| r.state)),
        }
        // Nothing may reach the wire after a failed init.
        assert!(board.transcript().is_empty());
    }

    #[test]
    fn test_unknown_print_port_is_rejected() {
        let board = SimBoard::silent(2);
        let config = BringupConfig {
            print_port: 7,
            ..BringupConfig::default()
        };
        let seq = BringupSequencer::new(config, board.uart(), NullDebugStub, board.console());
        match seq.run() {
            Err(BringupError::UnknownPort(port)) => assert_eq!(port, 7),
            other => panic!("expected UnknownPort, got {:?}", other.map(|r| r.state)),
        }
    }

    #[test]
    fn test_print_before_bringup_is_rejected() {
        use crate::DiagnosticSink;

        let board = SimBoard::silent(2);
        let err = board.console().print("too early").unwrap_err();
        assert!(matches!(err, BringupError::ConsoleNotBound));
    }

    #[test]
    fn test_sequence_shape_is_fixed() {
        use crate::{StepKind, SEQUENCE};

        // Two debug-gated steps, four unconditional ones, all required.
        assert_eq!(SEQUENCE.len(), 6);
        assert!(SEQUENCE.iter().all(|s| s.required));
        assert_eq!(SEQUENCE.iter().filter(|s| s.debug_only).count(), 2);
        assert_eq!(SEQUENCE[0].kind, StepKind::UartInit);
        assert_eq!(SEQUENCE[5].kind, StepKind::PrintCompletion);
    }
}

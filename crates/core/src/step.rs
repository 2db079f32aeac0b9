// FirstLight - Hardware Bring-up Sequencer
// Copyright (C) 2026 FirstLight Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// One named, ordered bring-up action. Steps are const-constructed; the
/// whole sequence is fixed at build time and never reordered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStep {
    pub name: &'static str,
    pub required: bool,
    /// Skipped entirely unless the build carries the debug capability.
    pub debug_only: bool,
    pub kind: StepKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    UartInit,
    BindPrintPort,
    InstallDebugStub,
    PrintBanner,
    BreakTrap,
    PrintCompletion,
}

/// First diagnostic line, emitted once the console is up.
pub const BANNER_MSG: &str = "Hi this is working";

/// Second diagnostic line, emitted when the sequence is done.
pub const COMPLETION_MSG: &str = "Just hit the end";

/// The full power-on sequence, in execution order.
pub const SEQUENCE: [InitStep; 6] = [
    InitStep {
        name: "uart-init",
        required: true,
        debug_only: false,
        kind: StepKind::UartInit,
    },
    InitStep {
        name: "bind-print-port",
        required: true,
        debug_only: false,
        kind: StepKind::BindPrintPort,
    },
    InitStep {
        name: "install-debug-stub",
        required: true,
        debug_only: true,
        kind: StepKind::InstallDebugStub,
    },
    InitStep {
        name: "print-banner",
        required: true,
        debug_only: false,
        kind: StepKind::PrintBanner,
    },
    InitStep {
        name: "break-trap",
        required: true,
        debug_only: true,
        kind: StepKind::BreakTrap,
    },
    InitStep {
        name: "print-completion",
        required: true,
        debug_only: false,
        kind: StepKind::PrintCompletion,
    },
];

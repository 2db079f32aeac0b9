// FirstLight - Hardware Bring-up Sequencer
// Copyright (C) 2026 FirstLight Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::convert::Infallible;
use firstlight_core::{BringupError, BringupResult, DebugStub};
use gdbstub::common::Signal;
use gdbstub::stub::{BaseStopReason, GdbStub};
use gdbstub::target::ext::base::singlethread::{
    SingleThreadBase, SingleThreadResume, SingleThreadSingleStep,
};
use gdbstub::target::ext::base::BaseOps;
use gdbstub::target::{Target, TargetError, TargetResult};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// The debugger's view of the device while it sits at the bring-up trap.
///
/// There is no upstream Xtensa arch in gdbstub_arch, so the generic ARM
/// register file is exposed instead; attach, register inspection, and
/// resume are all a bring-up trap needs.
pub struct BringupTarget {
    regs: gdbstub_arch::arm::reg::ArmCoreRegs,
    resumed: bool,
}

impl BringupTarget {
    pub fn new() -> Self {
        Self {
            regs: Default::default(),
            resumed: false,
        }
    }
}

impl Default for BringupTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for BringupTarget {
    type Arch = gdbstub_arch::arm::Armv4t;
    type Error = Infallible;

    fn base_ops(&mut self) -> BaseOps<'_, Self::Arch, Self::Error> {
        BaseOps::SingleThread(self)
    }

    fn support_breakpoints(
        &mut self,
    ) -> Option<gdbstub::target::ext::breakpoints::BreakpointsOps<'_, Self>> {
        Some(self)
    }
}

impl SingleThreadBase for BringupTarget {
    fn read_registers(
        &mut self,
        regs: &mut gdbstub_arch::arm::reg::ArmCoreRegs,
    ) -> TargetResult<(), Self> {
        for i in 0..13 {
            regs.r[i] = self.regs.r[i];
        }
        regs.sp = self.regs.sp;
        regs.lr = self.regs.lr;
        regs.pc = self.regs.pc;
        regs.cpsr = self.regs.cpsr;
        Ok(())
    }

    fn write_registers(
        &mut self,
        regs: &gdbstub_arch::arm::reg::ArmCoreRegs,
    ) -> TargetResult<(), Self> {
        for i in 0..13 {
            self.regs.r[i] = regs.r[i];
        }
        self.regs.sp = regs.sp;
        self.regs.lr = regs.lr;
        self.regs.pc = regs.pc;
        self.regs.cpsr = regs.cpsr;
        Ok(())
    }

    fn read_addrs(&mut self, _start_addr: u32, _data: &mut [u8]) -> TargetResult<usize, Self> {
        // No memory map exists at the trap; the sequencer owns no RAM image.
        Err(TargetError::NonFatal)
    }

    fn write_addrs(&mut self, _start_addr: u32, _data: &[u8]) -> TargetResult<(), Self> {
        Err(TargetError::NonFatal)
    }

    fn support_resume(
        &mut self,
    ) -> Option<gdbstub::target::ext::base::singlethread::SingleThreadResumeOps<'_, Self>> {
        Some(self)
    }
}

impl SingleThreadResume for BringupTarget {
    fn resume(&mut self, _signal: Option<Signal>) -> Result<(), Self::Error> {
        self.resumed = true;
        Ok(())
    }

    fn support_single_step(
        &mut self,
    ) -> Option<gdbstub::target::ext::base::singlethread::SingleThreadSingleStepOps<'_, Self>> {
        Some(self)
    }
}

impl SingleThreadSingleStep for BringupTarget {
    fn step(&mut self, _signal: Option<Signal>) -> Result<(), Self::Error> {
        // A single step off the trap instruction is a resume here.
        self.resumed = true;
        Ok(())
    }
}

impl gdbstub::target::ext::breakpoints::Breakpoints for BringupTarget {
    fn support_sw_breakpoint(
        &mut self,
    ) -> Option<gdbstub::target::ext::breakpoints::SwBreakpointOps<'_, Self>> {
        Some(self)
    }
}

impl gdbstub::target::ext::breakpoints::SwBreakpoint for BringupTarget {
    fn add_sw_breakpoint(
        &mut self,
        addr: u32,
        _kind: gdbstub_arch::arm::ArmBreakpointKind,
    ) -> TargetResult<bool, Self> {
        // Accepted but meaningless: the only trap is the one already hit.
        tracing::debug!(addr, "debugger set sw breakpoint");
        Ok(true)
    }

    fn remove_sw_breakpoint(
        &mut self,
        addr: u32,
        _kind: gdbstub_arch::arm::ArmBreakpointKind,
    ) -> TargetResult<bool, Self> {
        tracing::debug!(addr, "debugger removed sw breakpoint");
        Ok(true)
    }
}

/// Debug-stub collaborator backed by a GDB remote-serial-protocol server.
///
/// `install()` binds the listener; `break_now()` parks the bring-up
/// sequence until a debugger attaches and resumes it. Do not ship a build
/// carrying this stub: with no debugger on the other end the trap blocks
/// forever.
pub struct GdbDebugStub {
    port: u16,
    listener: Option<TcpListener>,
}

impl GdbDebugStub {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
        }
    }

    /// Where the stub is actually listening, once installed. Useful with
    /// port 0 (ephemeral bind).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}

impl DebugStub for GdbDebugStub {
    const ENABLED: bool = true;

    fn install(&mut self) -> BringupResult<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .map_err(|e| BringupError::DebugStub(e.to_string()))?;
        match listener.local_addr() {
            Ok(addr) => tracing::info!("GDB stub listening on {}", addr),
            Err(_) => tracing::info!("GDB stub listening"),
        }
        self.listener = Some(listener);
        Ok(())
    }

    fn break_now(&mut self) -> BringupResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| BringupError::DebugStub("stub not installed".to_string()))?;

        tracing::info!("breakpoint trap hit; waiting for debugger");
        let (stream, addr) = listener
            .accept()
            .map_err(|e| BringupError::DebugStub(e.to_string()))?;
        tracing::info!("debugger attached from {}", addr);

        let mut target = BringupTarget::new();
        let gdb = GdbStub::new(stream);

        match gdb.run_blocking::<TrapEventLoop>(&mut target) {
            Ok(reason) => tracing::info!("debug session ended: {:?}", reason),
            Err(e) => return Err(BringupError::DebugStub(format!("{:?}", e))),
        }

        Ok(())
    }
}

struct TrapEventLoop;

impl gdbstub::stub::run_blocking::BlockingEventLoop for TrapEventLoop {
    type Target = BringupTarget;
    type Connection = TcpStream;
    type StopReason = BaseStopReason<(), u32>;

    fn wait_for_stop_reason(
        target: &mut Self::Target,
        _conn: &mut Self::Connection,
    ) -> Result<
        gdbstub::stub::run_blocking::Event<Self::StopReason>,
        gdbstub::stub::run_blocking::WaitForStopReasonError<
            <Self::Target as Target>::Error,
            <Self::Connection as gdbstub::conn::Connection>::Error,
        >,
    > {
        use gdbstub::stub::run_blocking::Event;

        // There is nothing to execute behind the trap. A resume (or a
        // single step) hands control back to the bring-up sequence, which
        // the debugger sees as a clean exit.
        if target.resumed {
            Ok(Event::TargetStopped(BaseStopReason::Exited(0)))
        } else {
            Ok(Event::TargetStopped(BaseStopReason::Signal(Signal::SIGTRAP)))
        }
    }

    fn on_interrupt(
        _target: &mut Self::Target,
    ) -> Result<Option<Self::StopReason>, <Self::Target as Target>::Error> {
        Ok(Some(BaseStopReason::Signal(Signal::SIGINT)))
    }
}

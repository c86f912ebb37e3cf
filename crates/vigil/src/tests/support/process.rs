use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use nix::sys::signal::Signal;
use vigil_config::DaemonSettings;

use crate::daemon::{Delivery, Fork, ProcessControl, ProcessError};

/// Operation recorded by [`FakeProcess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Fork,
    Detach,
    Redirect,
    Signal(u32, Signal),
    InstallShutdownFlag,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<ProcessCall>,
    alive: BTreeSet<u32>,
    ignore_signals: bool,
}

/// In-process stand-in for the operating system.
///
/// Every fork lands on the child side so the daemon body runs in the test
/// process. Signals kill the targeted pid unless signals are ignored.
#[derive(Debug, Clone, Default)]
pub struct FakeProcess {
    state: Rc<RefCell<FakeState>>,
}

impl FakeProcess {
    pub fn mark_alive(&self, pid: u32) {
        self.state.borrow_mut().alive.insert(pid);
    }

    pub fn ignore_signals(&self) {
        self.state.borrow_mut().ignore_signals = true;
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: ProcessCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl ProcessControl for FakeProcess {
    fn fork(&self) -> Result<Fork, ProcessError> {
        self.record(ProcessCall::Fork);
        Ok(Fork::Child)
    }

    fn detach(&self) -> Result<(), ProcessError> {
        self.record(ProcessCall::Detach);
        Ok(())
    }

    fn redirect(&self, _settings: &DaemonSettings) -> Result<(), ProcessError> {
        self.record(ProcessCall::Redirect);
        Ok(())
    }

    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<Delivery, ProcessError> {
        self.record(ProcessCall::Signal(pid, signal));
        let mut state = self.state.borrow_mut();
        if !state.alive.contains(&pid) {
            return Ok(Delivery::NoSuchProcess);
        }
        if signal == Signal::SIGKILL || !state.ignore_signals {
            state.alive.remove(&pid);
        }
        Ok(Delivery::Delivered)
    }

    fn is_alive(&self, pid: u32) -> Result<bool, ProcessError> {
        Ok(self.state.borrow().alive.contains(&pid))
    }

    fn pause(&self, _duration: Duration) {}

    fn install_shutdown_flag(&self) -> Result<Arc<AtomicBool>, ProcessError> {
        self.record(ProcessCall::InstallShutdownFlag);
        Ok(Arc::new(AtomicBool::new(false)))
    }
}

//! Behavioural tests for the daemon lifecycle, driven through the engine
//! against an in-process fake of the operating system.

use std::cell::RefCell;
use std::fs;
use std::process::ExitCode;
use std::rc::Rc;
use std::str::FromStr;

use camino::Utf8PathBuf;
use nix::sys::signal::Signal;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use vigil_config::{DaemonSettings, StopPolicy};

use crate::daemon::{DaemonContext, DaemonHandler, DaemonProgram};
use crate::tests::support::{Captured, FakeProcess, ProcessCall, assert_exit, run_subcommand};
use crate::{CommandError, NoOptions, OptionsRecord};

const RUNNING_PID: u32 = 4_000_001;

/// Step parameter wrapped in double quotes.
#[derive(Debug, Clone)]
struct QuotedString(String);

impl FromStr for QuotedString {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Self(text.trim_matches('"').to_owned()))
    }
}

/// What the daemon body observed while it ran.
#[derive(Debug, Default)]
struct BodyLog {
    recorded: Vec<(u32, Option<String>)>,
}

struct RecordingBody {
    log: Rc<RefCell<BodyLog>>,
}

impl DaemonHandler for RecordingBody {
    type Options = NoOptions;

    fn handle_daemon(
        &mut self,
        _options: &OptionsRecord<NoOptions>,
        context: &DaemonContext,
    ) -> Result<(), CommandError> {
        let contents = fs::read_to_string(context.pidfile()).ok();
        self.log
            .borrow_mut()
            .recorded
            .push((context.pid(), contents));
        Ok(())
    }
}

struct TestWorld {
    _dir: TempDir,
    pidfile: Utf8PathBuf,
    process: FakeProcess,
    body: Rc<RefCell<BodyLog>>,
    program: DaemonProgram<RecordingBody, FakeProcess>,
    captured: Option<Captured>,
}

impl TestWorld {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let pidfile = Utf8PathBuf::from_path_buf(dir.path().join("run/idle.pid"))
            .expect("temp path is UTF-8");
        let process = FakeProcess::default();
        let body = Rc::new(RefCell::new(BodyLog::default()));
        let settings = DaemonSettings::defaults("idle")
            .with_pidfile(pidfile.clone())
            .with_stop_policy(StopPolicy {
                poll_interval_ms: 0,
                kill_after: Some(3),
                abandon_after: Some(10),
            });
        let program = DaemonProgram::with_process(
            RecordingBody {
                log: Rc::clone(&body),
            },
            settings,
            process.clone(),
        )
        .expect("program builds");
        Self {
            _dir: dir,
            pidfile,
            process,
            body,
            program,
            captured: None,
        }
    }

    fn seed_pidfile(&self, pid: u32) {
        let parent = self.pidfile.parent().expect("pidfile has a parent");
        fs::create_dir_all(parent).expect("create pidfile directory");
        fs::write(&self.pidfile, format!("{pid}\n")).expect("seed pidfile");
    }

    fn captured(&self) -> &Captured {
        self.captured.as_ref().expect("the command has run")
    }

    fn signals(&self) -> Vec<Signal> {
        self.process
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ProcessCall::Signal(_, signal) => Some(signal),
                _ => None,
            })
            .collect()
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

#[given("a stopped daemon")]
fn given_stopped(world: &RefCell<TestWorld>) {
    assert!(!world.borrow().pidfile.exists());
}

#[given("a daemon recorded as running")]
fn given_running(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    world.seed_pidfile(RUNNING_PID);
    world.process.mark_alive(RUNNING_PID);
}

#[given("a daemon recorded as running that ignores SIGTERM")]
fn given_stubborn(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    world.seed_pidfile(RUNNING_PID);
    world.process.mark_alive(RUNNING_PID);
    world.process.ignore_signals();
}

#[given("a daemon with a stale pidfile")]
fn given_stale(world: &RefCell<TestWorld>) {
    world.borrow().seed_pidfile(RUNNING_PID);
}

#[given("a pidfile another start has created but not yet filled")]
fn given_claim_in_progress(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let parent = world.pidfile.parent().expect("pidfile has a parent");
    fs::create_dir_all(parent).expect("create pidfile directory");
    fs::write(&world.pidfile, "").expect("create empty pidfile");
}

#[when("the daemon command runs {action}")]
fn when_runs(world: &RefCell<TestWorld>, action: QuotedString) {
    let mut world = world.borrow_mut();
    let captured = run_subcommand(&mut world.program, "idle", &[action.0.as_str()], "");
    world.captured = Some(captured);
}

#[then("the command succeeds")]
fn then_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let captured = world.captured();
    assert!(captured.stderr.is_empty(), "stderr: {}", captured.stderr);
    assert_exit(captured.code, ExitCode::SUCCESS);
}

#[then("the command fails with {message}")]
fn then_fails_with(world: &RefCell<TestWorld>, message: QuotedString) {
    let world = world.borrow();
    let captured = world.captured();
    assert_exit(captured.code, ExitCode::FAILURE);
    assert!(
        captured.stderr.starts_with("Error: ") && captured.stderr.contains(&message.0),
        "unexpected stderr: {}",
        captured.stderr
    );
    assert_eq!(captured.stderr.lines().count(), 1);
}

#[then("the daemon body ran with its pid recorded")]
fn then_body_ran(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let body = world.body.borrow();
    let [(pid, contents)] = body.recorded.as_slice() else {
        panic!("expected exactly one run, got {:?}", body.recorded);
    };
    assert_eq!(*pid, std::process::id());
    assert_eq!(contents.as_deref(), Some(format!("{pid}\n").as_str()));
}

#[then("the daemon body did not run")]
fn then_body_idle(world: &RefCell<TestWorld>) {
    assert!(world.borrow().body.borrow().recorded.is_empty());
}

#[then("the process detached before redirecting its streams")]
fn then_detached(world: &RefCell<TestWorld>) {
    let calls = world.borrow().process.calls();
    assert_eq!(
        calls,
        [
            ProcessCall::Fork,
            ProcessCall::Detach,
            ProcessCall::Fork,
            ProcessCall::Redirect,
            ProcessCall::InstallShutdownFlag,
        ]
    );
}

#[then("no fork happened")]
fn then_no_fork(world: &RefCell<TestWorld>) {
    assert!(!world.borrow().process.calls().contains(&ProcessCall::Fork));
}

#[then("the pidfile is gone")]
fn then_pidfile_gone(world: &RefCell<TestWorld>) {
    assert!(!world.borrow().pidfile.exists());
}

#[then("the blank pidfile is left for its owner")]
fn then_blank_pidfile_kept(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let contents = fs::read_to_string(&world.pidfile).expect("pidfile remains");
    assert!(contents.is_empty());
}

#[then("the pidfile is kept")]
fn then_pidfile_kept(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let contents = fs::read_to_string(&world.pidfile).expect("pidfile remains");
    assert_eq!(contents, format!("{RUNNING_PID}\n"));
}

#[then("the daemon was sent SIGTERM")]
fn then_sigterm(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().signals().first(), Some(&Signal::SIGTERM));
}

#[then("the daemon was sent SIGKILL")]
fn then_sigkill(world: &RefCell<TestWorld>) {
    let signals = world.borrow().signals();
    assert_eq!(
        signals,
        [
            Signal::SIGTERM,
            Signal::SIGTERM,
            Signal::SIGTERM,
            Signal::SIGKILL
        ]
    );
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Starting a stopped daemon runs its body and cleans up"
)]
fn start_runs_body(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Starting a running daemon is refused"
)]
fn start_refused_when_running(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Starting while another start is claiming the pidfile is refused"
)]
fn start_refused_while_claim_in_progress(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Starting over a stale pidfile replaces it"
)]
fn start_replaces_stale_pidfile(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Stopping a daemon that is not running fails"
)]
fn stop_without_daemon(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Stopping a running daemon removes its pidfile"
)]
fn stop_removes_pidfile(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Stopping a stubborn daemon escalates to SIGKILL"
)]
fn stop_escalates(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Restart stops short when nothing is running"
)]
fn restart_short_circuits(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Restart stops then starts a running daemon"
)]
fn restart_cycles(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_lifecycle.feature",
    name = "Unknown actions are rejected"
)]
fn unknown_action(world: RefCell<TestWorld>) {
    drop(world);
}

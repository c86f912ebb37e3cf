//! Test suites exercising the engine, the dispatcher, and the daemon
//! lifecycle together.

#[cfg(unix)]
mod daemon_behaviour;
mod support;

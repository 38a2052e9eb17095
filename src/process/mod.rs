//! Subprocess orchestration

pub mod lines;
pub mod runner;

pub use lines::TerminalLineCodec;
pub use runner::{ProcessRunner, RunningProcess, StderrMode};

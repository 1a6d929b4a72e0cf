//! Backend worker: owns the tokio runtime, the validated bridge and the
//! in-process host, and talks to the UI only through channels.

pub mod commands;
pub mod runtime;

//! Backend side of the GUI: command definitions and the worker that runs them.

pub mod commands;
pub mod runtime;

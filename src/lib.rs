//! shimcov - syscall coverage analysis for OS-compatibility shims
//!
//! This library scores how much of a real-world workload population a shim
//! (Gramine, gVisor, a unikernel) can run, weighting each package by its
//! popularity, and ranks the syscalls it is still missing by how many users
//! they would unlock.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod csv_output;
pub mod error;
pub mod fetch;
pub mod json_output;
pub mod loupe;
pub mod popularity;
pub mod query;
pub mod support;
pub mod syscalls;

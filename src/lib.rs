//! Key management and authenticated git synchronization for an encrypted
//! password store.
//!
//! `core` holds the domain: models, ports (`core::traits`) and the services
//! that orchestrate them. `adapters` implements the ports with age, libgit2,
//! `ssh-keygen` and the terminal.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;

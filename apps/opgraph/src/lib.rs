//! # opgraph - THE BINARY
//!
//! Library surface of the opgraph CLI, exposed so integration tests can
//! drive the command implementations directly.

pub mod cli;

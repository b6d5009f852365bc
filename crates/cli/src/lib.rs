//! The `parley` command-line front end.

pub mod cli;
pub mod scenarios;

//! Application layer: command line surface and process startup

pub mod cli;
pub mod startup;

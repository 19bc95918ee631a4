//! Command-line interface

pub mod app;
pub mod args;

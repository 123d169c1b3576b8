//! Terminal front end for the persona chat.
//!
//! The binary is a thin REPL; the pieces that can be tested without a
//! terminal live here.

#[macro_use]
extern crate tracing;

pub mod command;
pub mod config;
pub mod render;

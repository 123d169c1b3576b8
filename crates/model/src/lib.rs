//! An abstraction layer for chat completion backends.
//!
//! This crate establishes the protocol the conversation core uses to talk
//! to a remote model, so that the core can switch between an HTTP backend
//! and a scripted fake without modifying the orchestration code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;

pub use error::*;
pub use provider::*;
pub use request::*;

//! Core logic of the persona chat: the conversation, its state machine,
//! persistence, and the session driver that ties them to a model.

#[macro_use]
extern crate tracing;

pub mod conversation;
mod error;
pub mod mode;
mod model_client;
pub mod notice;
pub mod orchestrator;
pub mod persistence;
pub mod persona;
pub mod request;
mod session;
pub mod storage;

pub use error::ValidationError;
pub use session::{Session, SessionBuilder, SessionSnapshot};

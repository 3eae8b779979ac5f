//! Session identity for one run of the client

pub mod identity;

pub use identity::{Session, SessionContext};

//! Integration tests for supportdesk
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod conversation_flow;
pub mod escalation_flow;
pub mod ticket_persistence;

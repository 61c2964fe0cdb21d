//! Unit tests for routectl
//!
//! These tests use in-memory port implementations and temp directories and
//! never touch the network.

mod mocks;
mod retry_controller;
mod transfer_executor;

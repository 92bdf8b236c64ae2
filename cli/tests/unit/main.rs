//! Unit tests for the abx CLI
//!
//! These tests use mocked collaborators and run fast without network I/O.

mod mocks;
mod provisioning_flow;

//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: SSH sessions, the local
//! terminal, the provisioning service client, appliance state on disk, TCP
//! probes, local filesystem access for transfers, and the local docker CLI.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod docker;
pub mod fs;
pub mod network;
pub mod service;
pub mod ssh;
pub mod store;
pub mod terminal;

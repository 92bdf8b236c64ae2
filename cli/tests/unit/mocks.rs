//! Shared mock infrastructure for unit tests.
//!
//! `LocalShell` stands in for the appliance by running every issued command
//! under `sh -c` on this machine, so transfers exercise the real command
//! strings without a network. The scripted mocks drive the provisioning flow.

#![allow(clippy::expect_used, dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::process::Stdio;
use std::rc::Rc;

use abx_cli::application::ports::{
    CommandOutput, NetworkProbe, ProgressReporter, ProvisioningService, PtyRequest, Session,
    SessionFactory, Stdin,
};
use abx_cli::domain::machine::{DestroyRequest, Machine, MachineRequest};
use abx_cli::domain::{ApplianceError, AuthFailure, HostIdentity, KeyPair, RemoteEndpoint};

// ── Endpoint helpers ─────────────────────────────────────────────────────────

/// An endpoint that is never dialed.
pub fn endpoint() -> RemoteEndpoint {
    let host_key = KeyPair::from_seed(&[3; 32], 1);
    RemoteEndpoint {
        address: "203.0.113.10".to_string(),
        port: 22,
        user: "acrobox".to_string(),
        identity: HostIdentity::new("203.0.113.10", 22, host_key.authorized_key())
            .expect("host identity"),
        private_key: KeyPair::from_seed(&[7; 32], 2).private_key_pem().to_vec(),
    }
}

// ── Mock: local shell ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ShellLog {
    pub opened: usize,
    pub closed: usize,
    pub commands: Vec<String>,
}

/// Runs commands on the local machine instead of the appliance.
#[derive(Default)]
pub struct LocalShell {
    pub log: Rc<RefCell<ShellLog>>,
}

pub struct LocalShellSession {
    log: Rc<RefCell<ShellLog>>,
}

impl LocalShell {
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().commands.clone()
    }
}

impl SessionFactory for LocalShell {
    type Session = LocalShellSession;

    async fn open_session(&self, _: &RemoteEndpoint) -> Result<LocalShellSession, ApplianceError> {
        self.log.borrow_mut().opened += 1;
        Ok(LocalShellSession {
            log: Rc::clone(&self.log),
        })
    }
}

fn spawn_error(e: std::io::Error) -> ApplianceError {
    ApplianceError::Transport(e.to_string())
}

impl Session for LocalShellSession {
    async fn run(
        &mut self,
        command: &str,
        stdin: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError> {
        self.log.borrow_mut().commands.push(command.to_string());
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        if let Some(input) = stdin {
            let mut pipe = child.stdin.take().expect("piped stdin");
            tokio::io::copy(input, &mut pipe).await.map_err(spawn_error)?;
        }
        let output = child.wait_with_output().await.map_err(spawn_error)?;
        let exit_code = output
            .status
            .code()
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(255);
        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }

    async fn request_pty(&mut self, _: &PtyRequest) -> Result<(), ApplianceError> {
        Ok(())
    }

    async fn run_interactive(&mut self, command: &str) -> Result<u32, ApplianceError> {
        Ok(self.run(command, None).await?.exit_code)
    }

    async fn shell(&mut self) -> Result<u32, ApplianceError> {
        Ok(0)
    }

    async fn close(self) -> Result<(), ApplianceError> {
        self.log.borrow_mut().closed += 1;
        Ok(())
    }
}

// ── Mock: scripted shell ─────────────────────────────────────────────────────

/// Answers commands from a fixed table of stdout replies; any other command
/// exits 1. Nothing runs on this machine.
#[derive(Default)]
pub struct ScriptedShell {
    replies: Rc<HashMap<String, Vec<u8>>>,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl ScriptedShell {
    pub fn new(replies: Vec<(String, &[u8])>) -> Self {
        Self {
            replies: Rc::new(
                replies
                    .into_iter()
                    .map(|(command, stdout)| (command, stdout.to_vec()))
                    .collect(),
            ),
            log: Rc::default(),
        }
    }
}

pub struct ScriptedShellSession {
    replies: Rc<HashMap<String, Vec<u8>>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl SessionFactory for ScriptedShell {
    type Session = ScriptedShellSession;

    async fn open_session(&self, _: &RemoteEndpoint) -> Result<ScriptedShellSession, ApplianceError> {
        Ok(ScriptedShellSession {
            replies: Rc::clone(&self.replies),
            log: Rc::clone(&self.log),
        })
    }
}

impl Session for ScriptedShellSession {
    async fn run(
        &mut self,
        command: &str,
        _: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError> {
        self.log.borrow_mut().push(command.to_string());
        Ok(match self.replies.get(command) {
            Some(stdout) => CommandOutput {
                stdout: stdout.clone(),
                stderr: Vec::new(),
                exit_code: 0,
            },
            None => CommandOutput {
                stdout: Vec::new(),
                stderr: b"No such file or directory".to_vec(),
                exit_code: 1,
            },
        })
    }

    async fn request_pty(&mut self, _: &PtyRequest) -> Result<(), ApplianceError> {
        Ok(())
    }

    async fn run_interactive(&mut self, command: &str) -> Result<u32, ApplianceError> {
        Ok(self.run(command, None).await?.exit_code)
    }

    async fn shell(&mut self) -> Result<u32, ApplianceError> {
        Ok(0)
    }

    async fn close(self) -> Result<(), ApplianceError> {
        Ok(())
    }
}

// ── Mock: appliance readiness ────────────────────────────────────────────────

#[derive(Default)]
pub struct ReadinessLog {
    pub failures: HashMap<String, u32>,
    pub calls: Vec<String>,
}

/// Answers each command with a non-zero exit for a scripted number of calls,
/// then succeeds. Commands without a script succeed at once.
#[derive(Default)]
pub struct ReadinessShell {
    pub log: Rc<RefCell<ReadinessLog>>,
    pub host_key_mismatch: bool,
}

impl ReadinessShell {
    pub fn failing(command: &str, times: u32) -> Self {
        let shell = Self::default();
        shell
            .log
            .borrow_mut()
            .failures
            .insert(command.to_string(), times);
        shell
    }

    pub fn calls_to(&self, command: &str) -> usize {
        self.log
            .borrow()
            .calls
            .iter()
            .filter(|c| *c == command)
            .count()
    }
}

pub struct ReadinessSession {
    log: Rc<RefCell<ReadinessLog>>,
}

impl SessionFactory for ReadinessShell {
    type Session = ReadinessSession;

    async fn open_session(&self, endpoint: &RemoteEndpoint) -> Result<ReadinessSession, ApplianceError> {
        if self.host_key_mismatch {
            return Err(ApplianceError::Auth(AuthFailure::HostKeyMismatch {
                host: endpoint.socket_addr(),
            }));
        }
        Ok(ReadinessSession {
            log: Rc::clone(&self.log),
        })
    }
}

impl Session for ReadinessSession {
    async fn run(
        &mut self,
        command: &str,
        _: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(command.to_string());
        let exit_code = match log.failures.get_mut(command) {
            Some(left) if *left > 0 => {
                *left -= 1;
                1
            }
            _ => 0,
        };
        Ok(CommandOutput {
            stdout: Vec::new(),
            stderr: if exit_code == 0 { Vec::new() } else { b"not yet".to_vec() },
            exit_code,
        })
    }

    async fn request_pty(&mut self, _: &PtyRequest) -> Result<(), ApplianceError> {
        Ok(())
    }

    async fn run_interactive(&mut self, command: &str) -> Result<u32, ApplianceError> {
        Ok(self.run(command, None).await?.exit_code)
    }

    async fn shell(&mut self) -> Result<u32, ApplianceError> {
        Ok(0)
    }

    async fn close(self) -> Result<(), ApplianceError> {
        Ok(())
    }
}

// ── Mock: provisioning service ───────────────────────────────────────────────

/// Provisioning service that assigns an address after a number of polls.
pub struct ScriptedService {
    pub polls_before_address: u32,
    /// Address reported once assigned.
    pub address: String,
    pub polls: Cell<u32>,
    pub host_key: KeyPair,
    pub requests: RefCell<Vec<MachineRequest>>,
    pub cancelled: RefCell<Vec<String>>,
    pub renewed: RefCell<Vec<String>>,
    pub destroyed: RefCell<Vec<(String, Option<String>)>>,
    /// When set, every mutating call fails with this status.
    pub refuse_with: Option<u16>,
}

impl ScriptedService {
    pub fn new(polls_before_address: u32) -> Self {
        Self {
            polls_before_address,
            address: "127.0.0.1".to_string(),
            polls: Cell::new(0),
            host_key: KeyPair::from_seed(&[9; 32], 3),
            requests: RefCell::new(Vec::new()),
            cancelled: RefCell::new(Vec::new()),
            renewed: RefCell::new(Vec::new()),
            destroyed: RefCell::new(Vec::new()),
            refuse_with: None,
        }
    }

    pub fn refusing(status: u16) -> Self {
        Self {
            refuse_with: Some(status),
            ..Self::new(0)
        }
    }

    fn check(&self) -> Result<(), ApplianceError> {
        match self.refuse_with {
            Some(status) => Err(ApplianceError::Service {
                status,
                message: "Payment required.".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl ProvisioningService for ScriptedService {
    async fn request_machine(&self, request: &MachineRequest) -> Result<String, ApplianceError> {
        self.check()?;
        self.requests.borrow_mut().push(request.clone());
        Ok("m-1".to_string())
    }

    async fn get_machine(&self, id: &str) -> Result<Machine, ApplianceError> {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        let assigned = polls > self.polls_before_address;
        Ok(Machine {
            id: id.to_string(),
            name: "acrobox".to_string(),
            ipv4: if assigned { self.address.clone() } else { String::new() },
            public_key: if assigned {
                self.host_key.authorized_key().to_string()
            } else {
                String::new()
            },
        })
    }

    async fn cancel_machine(&self, id: &str) -> Result<(), ApplianceError> {
        self.check()?;
        self.cancelled.borrow_mut().push(id.to_string());
        Ok(())
    }

    async fn renew_machine(&self, id: &str) -> Result<(), ApplianceError> {
        self.check()?;
        self.renewed.borrow_mut().push(id.to_string());
        Ok(())
    }

    async fn destroy_machine(&self, id: &str, request: &DestroyRequest) -> Result<(), ApplianceError> {
        self.check()?;
        self.destroyed
            .borrow_mut()
            .push((id.to_string(), request.access_token.clone()));
        Ok(())
    }
}

// ── Mock: network probe ──────────────────────────────────────────────────────

/// Reports the port closed for a number of probes, then open.
pub struct ScriptedProbe {
    pub closed_for: u32,
    pub probes: Cell<u32>,
}

impl ScriptedProbe {
    pub fn open_after(closed_for: u32) -> Self {
        Self {
            closed_for,
            probes: Cell::new(0),
        }
    }
}

impl NetworkProbe for ScriptedProbe {
    async fn check_tcp_connectivity(&self, _: &str, _: u16) -> Result<bool, ApplianceError> {
        let probes = self.probes.get() + 1;
        self.probes.set(probes);
        Ok(probes > self.closed_for)
    }
}

// ── Mock: progress reporter ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn steps(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(format!("warn: {message}"));
    }
}

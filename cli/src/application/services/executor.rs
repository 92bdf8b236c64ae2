//! Command execution over single-use sessions.
//!
//! Every call opens its own session and closes it before returning. Buffered
//! calls collect stdout and stderr separately; interactive calls attach the
//! local terminal and forward a pseudo-terminal when stdin is a TTY.

use tracing::debug;

use crate::application::ports::{
    CommandOutput, LocalTerminal, PtyRequest, Session, SessionFactory, Stdin,
};
use crate::domain::quote::command_line;
use crate::domain::{ApplianceError, RemoteEndpoint};

/// Terminal type requested for remote pseudo-terminals.
pub const TERM: &str = "xterm-256color";

/// Runs commands on one endpoint through a `SessionFactory`.
pub struct CommandExecutor<'a, F> {
    sessions: &'a F,
    endpoint: &'a RemoteEndpoint,
}

impl<'a, F: SessionFactory> CommandExecutor<'a, F> {
    #[must_use]
    pub fn new(sessions: &'a F, endpoint: &'a RemoteEndpoint) -> Self {
        Self { sessions, endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &RemoteEndpoint {
        self.endpoint
    }

    /// Run `command` and return its buffered output.
    ///
    /// # Errors
    ///
    /// `Command` when the remote process exits non-zero; `Transport` or `Auth`
    /// when the session fails.
    pub async fn run(&self, command: &str) -> Result<CommandOutput, ApplianceError> {
        self.buffered(command, None).await
    }

    /// Run `command` with `stdin` streamed as its standard input.
    ///
    /// # Errors
    ///
    /// Same as [`CommandExecutor::run`].
    pub async fn run_with_stdin(
        &self,
        command: &str,
        stdin: Stdin<'_>,
    ) -> Result<CommandOutput, ApplianceError> {
        self.buffered(command, Some(stdin)).await
    }

    async fn buffered(
        &self,
        command: &str,
        stdin: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError> {
        let mut session = self.sessions.open_session(self.endpoint).await?;
        let result = session.run(command, stdin).await;
        close_quietly(session).await;
        let output = result?;
        debug!(command, exit_code = output.exit_code, "remote command finished");
        if output.success() {
            Ok(output)
        } else {
            Err(ApplianceError::Command {
                code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }

    /// Run `command` followed by the re-quoted `args` with the local terminal
    /// attached.
    ///
    /// # Errors
    ///
    /// `Command` carrying the remote exit status when it is non-zero.
    pub async fn exec<T: LocalTerminal>(
        &self,
        command: &str,
        args: &[String],
        terminal: &T,
    ) -> Result<(), ApplianceError> {
        let line = format!("{}\n", command_line(command, args));
        let mut session = self.sessions.open_session(self.endpoint).await?;
        let result = async {
            let _guard = attach(&mut session, terminal, false).await?;
            session.run_interactive(&line).await
        }
        .await;
        close_quietly(session).await;
        exit_result(result?)
    }

    /// Start an interactive login shell.
    ///
    /// # Errors
    ///
    /// `Command` carrying the shell's exit status when it is non-zero.
    pub async fn shell<T: LocalTerminal>(&self, terminal: &T) -> Result<(), ApplianceError> {
        let mut session = self.sessions.open_session(self.endpoint).await?;
        let result = async {
            let _guard = attach(&mut session, terminal, true).await?;
            session.shell().await
        }
        .await;
        close_quietly(session).await;
        exit_result(result?)
    }
}

/// Acquire the terminal (if any) and request a pty sized to match it.
///
/// The caller holds the returned guard until the remote side exits so echo
/// is restored on every exit path.
async fn attach<S, T>(
    session: &mut S,
    terminal: &T,
    echo: bool,
) -> Result<Option<T::Guard>, ApplianceError>
where
    S: Session,
    T: LocalTerminal,
{
    let guard = match terminal.acquire()? {
        Some((guard, (cols, rows))) => {
            session
                .request_pty(&PtyRequest {
                    term: TERM.to_string(),
                    cols: u32::from(cols),
                    rows: u32::from(rows),
                    echo,
                })
                .await?;
            Some(guard)
        }
        None => None,
    };
    Ok(guard)
}

fn exit_result(code: u32) -> Result<(), ApplianceError> {
    if code == 0 {
        Ok(())
    } else {
        Err(ApplianceError::Command {
            code,
            stderr: Vec::new(),
        })
    }
}

async fn close_quietly<S: Session>(session: S) {
    if let Err(e) = session.close().await {
        debug!(error = %e, "closing session failed");
    }
}

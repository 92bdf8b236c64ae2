//! SSH infrastructure: implements `SessionFactory` and `Session` with russh.
//!
//! One TCP connection per session. The server's host key must equal the key
//! pinned at provisioning time; anything else is refused during the
//! handshake, before authentication or any command.

use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, decode_secret_key, parse_public_key_base64};
use russh::{Channel, ChannelMsg, Disconnect, Pty};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::application::ports::{CommandOutput, PtyRequest, Session, SessionFactory, Stdin};
use crate::domain::{ApplianceError, AuthFailure, RemoteEndpoint};
use crate::infra::terminal::spawn_input_reader;

/// Bound on dial, handshake and authentication together.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(90);

/// Terminal line speed advertised with every pty request.
const TTY_SPEED: u32 = 14_400;

/// Accepts exactly one server key.
pub struct PinnedHostKey {
    pinned: PublicKey,
}

impl PinnedHostKey {
    #[must_use]
    pub fn new(pinned: PublicKey) -> Self {
        Self { pinned }
    }
}

impl client::Handler for PinnedHostKey {
    type Error = russh::Error;

    /// Returning `false` makes russh abort with `Error::UnknownKey`.
    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(server_public_key.key_data() == self.pinned.key_data())
    }
}

/// Opens russh sessions authenticated with the appliance key.
#[derive(Default)]
pub struct RusshSessionFactory {
    timeout: Option<Duration>,
}

impl RusshSessionFactory {
    /// Factory with a custom setup timeout (used in tests).
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl SessionFactory for RusshSessionFactory {
    type Session = RusshSession;

    async fn open_session(&self, endpoint: &RemoteEndpoint) -> Result<RusshSession, ApplianceError> {
        let pem = std::str::from_utf8(&endpoint.private_key)
            .map_err(|e| invalid_key(format!("private key is not UTF-8: {e}")))?;
        let key = decode_secret_key(pem, None)
            .map_err(|e| invalid_key(format!("private key: {e}")))?;
        let pinned = parse_public_key_base64(&endpoint.identity.key_base64)
            .map_err(|e| invalid_key(format!("pinned host key: {e}")))?;

        let addr = endpoint.socket_addr();
        let user = endpoint.user.clone();
        let config = Arc::new(client::Config::default());
        debug!(%addr, "opening ssh session");

        let setup = async {
            let mut handle = client::connect(config, addr.as_str(), PinnedHostKey::new(pinned)).await?;
            let auth = handle
                .authenticate_publickey(&user, PrivateKeyWithHashAlg::new(Arc::new(key), None))
                .await?;
            Ok::<_, russh::Error>((handle, auth.success()))
        };
        let timeout = self.timeout.unwrap_or(SESSION_TIMEOUT);
        match tokio::time::timeout(timeout, setup).await {
            Err(_) => Err(ApplianceError::Transport(format!(
                "session setup with {addr} timed out after {}s",
                timeout.as_secs()
            ))),
            Ok(Err(e)) => Err(map_handshake_error(e, &endpoint.identity.host)),
            Ok(Ok((_, false))) => Err(ApplianceError::Auth(AuthFailure::KeyRejected { user })),
            Ok(Ok((handle, true))) => {
                info!(%addr, "ssh session established");
                Ok(RusshSession {
                    handle,
                    pty_channel: None,
                })
            }
        }
    }
}

/// A single authenticated connection.
pub struct RusshSession {
    handle: Handle<PinnedHostKey>,
    /// Channel that already carries a pty request, waiting for its command.
    pty_channel: Option<Channel<Msg>>,
}

impl RusshSession {
    async fn take_channel(&mut self) -> Result<Channel<Msg>, ApplianceError> {
        match self.pty_channel.take() {
            Some(channel) => Ok(channel),
            None => self.handle.channel_open_session().await.map_err(transport),
        }
    }
}

impl Session for RusshSession {
    async fn run(
        &mut self,
        command: &str,
        stdin: Option<Stdin<'_>>,
    ) -> Result<CommandOutput, ApplianceError> {
        let mut channel = self.handle.channel_open_session().await.map_err(transport)?;
        channel.exec(true, command).await.map_err(transport)?;
        if let Some(stdin) = stdin {
            channel.data(stdin).await.map_err(transport)?;
        }
        channel.eof().await.map_err(transport)?;

        let mut output = CommandOutput::default();
        let mut exit_code = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => output.stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => output.stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                _ => {}
            }
        }
        output.exit_code = exit_code.ok_or_else(|| {
            ApplianceError::Transport(format!("'{command}' ended without an exit status"))
        })?;
        Ok(output)
    }

    async fn request_pty(&mut self, pty: &PtyRequest) -> Result<(), ApplianceError> {
        let channel = self.take_channel().await?;
        let modes = [
            (Pty::ECHO, u32::from(pty.echo)),
            (Pty::TTY_OP_ISPEED, TTY_SPEED),
            (Pty::TTY_OP_OSPEED, TTY_SPEED),
        ];
        channel
            .request_pty(true, &pty.term, pty.cols, pty.rows, 0, 0, &modes)
            .await
            .map_err(transport)?;
        self.pty_channel = Some(channel);
        Ok(())
    }

    async fn run_interactive(&mut self, command: &str) -> Result<u32, ApplianceError> {
        let mut channel = self.take_channel().await?;
        channel.exec(true, command).await.map_err(transport)?;
        attach_stdio(&mut channel).await
    }

    async fn shell(&mut self) -> Result<u32, ApplianceError> {
        let mut channel = self.take_channel().await?;
        channel.request_shell(true).await.map_err(transport)?;
        attach_stdio(&mut channel).await
    }

    async fn close(self) -> Result<(), ApplianceError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(transport)
    }
}

/// Pump local stdin into the channel and channel output to local stdout and
/// stderr until the remote side closes. Returns the exit status as soon as
/// the channel closes, whether or not local input is still open.
async fn attach_stdio(channel: &mut Channel<Msg>) -> Result<u32, ApplianceError> {
    let mut input = spawn_input_reader(std::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let mut stdin_closed = false;
    let mut exit_code = None;

    loop {
        tokio::select! {
            chunk = input.recv(), if !stdin_closed => match chunk {
                Some(bytes) => channel.data(&bytes[..]).await.map_err(transport)?,
                None => {
                    stdin_closed = true;
                    channel.eof().await.map_err(transport)?;
                }
            },
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) => {
                    write_local(&mut stdout, &data).await?;
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    write_local(&mut stderr, &data).await?;
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => exit_code = Some(exit_status),
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },
        }
    }
    debug!(?exit_code, "interactive channel closed");
    exit_code.ok_or_else(|| ApplianceError::Transport("session ended without an exit status".into()))
}

async fn write_local(out: &mut (impl AsyncWrite + Unpin), data: &[u8]) -> Result<(), ApplianceError> {
    out.write_all(data)
        .await
        .map_err(|e| ApplianceError::Transport(format!("writing local output: {e}")))?;
    out.flush()
        .await
        .map_err(|e| ApplianceError::Transport(format!("writing local output: {e}")))
}

fn map_handshake_error(err: russh::Error, host: &str) -> ApplianceError {
    match err {
        russh::Error::UnknownKey => ApplianceError::Auth(AuthFailure::HostKeyMismatch {
            host: host.to_string(),
        }),
        other => transport(other),
    }
}

fn transport(err: russh::Error) -> ApplianceError {
    ApplianceError::Transport(err.to_string())
}

fn invalid_key(reason: String) -> ApplianceError {
    ApplianceError::Auth(AuthFailure::InvalidKey(reason))
}

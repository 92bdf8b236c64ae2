//! Terminal infrastructure: implements `LocalTerminal` with crossterm raw mode.

use std::io::{ErrorKind, IsTerminal as _, Read};

use tokio::sync::mpsc;
use tracing::debug;

use crate::application::ports::LocalTerminal;
use crate::domain::ApplianceError;

const INPUT_CHUNK: usize = 8192;

/// The process's controlling terminal on stdin.
pub struct StdinTerminal;

/// Leaves raw mode when dropped.
pub struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            debug!(error = %e, "restoring terminal mode failed");
        }
    }
}

impl LocalTerminal for StdinTerminal {
    type Guard = RawModeGuard;

    fn acquire(&self) -> Result<Option<(RawModeGuard, (u16, u16))>, ApplianceError> {
        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }
        // Size first: a failure here must not leave the terminal in raw mode.
        let size = crossterm::terminal::size().map_err(|e| ApplianceError::local_io("stdin", e))?;
        crossterm::terminal::enable_raw_mode().map_err(|e| ApplianceError::local_io("stdin", e))?;
        debug!(cols = size.0, rows = size.1, "terminal in raw mode");
        Ok(Some((RawModeGuard, size)))
    }
}

/// Forward chunks read from `reader` until end of input or a read error.
///
/// Reads happen on a detached OS thread, not the runtime's blocking pool: a
/// read parked on an idle terminal must not keep the runtime (and with it
/// the process) alive once the remote side has exited. The receiver yields
/// `None` at end of input.
pub fn spawn_input_reader<R>(mut reader: R) -> mpsc::Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("abx-input".into())
        .spawn(move || {
            let mut buf = vec![0u8; INPUT_CHUNK];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!(error = %e, "reading local input failed");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        // The sender went down with the closure, so the receiver sees EOF.
        debug!(error = %e, "starting input reader failed");
    }
    rx
}

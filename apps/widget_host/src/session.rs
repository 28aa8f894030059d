use anyhow::{Context, Result};
use counter_core::{CounterWidget, UndoExpired, WidgetCommand};
use serde::Deserialize;
use shared::protocol::{HostMessage, HostRenderArgs};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tracing::{info, warn};

/// One line of host input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HostFrame {
    Render(HostRenderArgs),
    Command(WidgetCommand),
    Shutdown,
}

pub async fn handle_frame(widget: &mut CounterWidget, frame: HostFrame) {
    match frame {
        HostFrame::Render(args) => {
            widget.apply_host_render(&args).await;
            // The first completed render is what makes the widget ready.
            if !widget.is_ready() {
                widget.mark_ready().await;
            }
        }
        HostFrame::Command(command) => widget.dispatch(command).await,
        HostFrame::Shutdown => {}
    }
}

/// Drives the widget until the host closes its input or sends `shutdown`.
pub async fn run<R>(
    widget: &mut CounterWidget,
    expired_rx: &mut mpsc::UnboundedReceiver<UndoExpired>,
    reader: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read host input")? else {
                    info!("host closed input");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostFrame>(line) {
                    Ok(HostFrame::Shutdown) => {
                        info!("host requested shutdown");
                        break;
                    }
                    Ok(frame) => handle_frame(widget, frame).await,
                    Err(err) => warn!(error = %err, "ignoring malformed host frame"),
                }
            }
            Some(expired) = expired_rx.recv() => {
                widget.expire_undo(expired);
            }
        }
    }

    widget.shutdown();
    Ok(())
}

/// Writes every outbound message as a JSON line until the bridge is dropped.
pub async fn write_frames<W>(mut rx: mpsc::UnboundedReceiver<HostMessage>, mut out: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_vec(&message).context("failed to encode host message")?;
        line.push(b'\n');
        out.write_all(&line)
            .await
            .context("failed to write host message")?;
        out.flush().await.context("failed to flush host output")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

use anyhow::{Context, Result};
use arboard::Clipboard;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard does not hold text")]
    NoText,

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard did not respond in time")]
    TimedOut,

    #[error("clipboard worker is busy")]
    Busy,

    #[error("clipboard worker has stopped")]
    WorkerStopped,
}

/// Synchronous access to a clipboard.
pub trait ClipboardBackend {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard via `arboard`. The handle is opened lazily and reopened
/// after a failure.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        if self.clipboard.is_none() {
            let clipboard =
                Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("no clipboard handle".to_string()))
    }
}

impl ClipboardBackend for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let result = self.handle()?.get_text();
        match result {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Err(ClipboardError::NoText),
            Err(e) => {
                self.clipboard = None;
                Err(ClipboardError::Unavailable(e.to_string()))
            }
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let result = self.handle()?.set_text(text);
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.clipboard = None;
                Err(ClipboardError::Unavailable(e.to_string()))
            }
        }
    }
}

/// Copy text to the system clipboard from a short-lived process.
///
/// On Linux, clipboard contents persist while the application is running,
/// or after exit when a clipboard manager takes them over.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to access system clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to copy text to clipboard")?;
    Ok(())
}

enum Request {
    Read(oneshot::Sender<Result<String, ClipboardError>>),
    Write(String, oneshot::Sender<Result<(), ClipboardError>>),
}

/// Async handle to a clipboard owned by a dedicated thread.
///
/// Each request waits at most `timeout`. Only one request is queued at a
/// time, so a stuck OS call turns later reads into [`ClipboardError::Busy`]
/// instead of piling up.
#[derive(Clone)]
pub struct ClipboardHandle {
    tx: mpsc::Sender<Request>,
    timeout: Duration,
}

/// Start the clipboard thread. The backend is built on that thread, since
/// OS clipboard handles are not always `Send`.
pub fn spawn_worker<B, F>(make_backend: F, request_timeout: Duration) -> Result<ClipboardHandle>
where
    B: ClipboardBackend + 'static,
    F: FnOnce() -> B + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Request>(1);

    thread::Builder::new()
        .name("clipboard".to_string())
        .spawn(move || {
            let mut backend = make_backend();
            while let Some(request) = rx.blocking_recv() {
                match request {
                    Request::Read(reply) => {
                        let _ = reply.send(backend.read_text());
                    }
                    Request::Write(text, reply) => {
                        let _ = reply.send(backend.write_text(&text));
                    }
                }
            }
            debug!("Clipboard worker stopped");
        })
        .context("Failed to spawn clipboard thread")?;

    Ok(ClipboardHandle {
        tx,
        timeout: request_timeout,
    })
}

impl ClipboardHandle {
    /// Read the clipboard, giving up immediately if the worker is busy.
    pub async fn read_text(&self) -> Result<String, ClipboardError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .try_send(Request::Read(reply))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ClipboardError::Busy,
                mpsc::error::TrySendError::Closed(_) => ClipboardError::WorkerStopped,
            })?;
        self.await_reply(response).await
    }

    /// Write the clipboard, waiting up to the timeout for the worker.
    pub async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let (reply, response) = oneshot::channel();
        match timeout(self.timeout, self.tx.send(Request::Write(text.to_string(), reply))).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return Err(ClipboardError::WorkerStopped),
            Err(_) => return Err(ClipboardError::TimedOut),
        }
        self.await_reply(response).await
    }

    async fn await_reply<T>(
        &self,
        response: oneshot::Receiver<Result<T, ClipboardError>>,
    ) -> Result<T, ClipboardError> {
        match timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClipboardError::WorkerStopped),
            Err(_) => Err(ClipboardError::TimedOut),
        }
    }
}

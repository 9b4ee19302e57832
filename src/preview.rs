//! Loopback preview: bind an ephemeral listener, open the default browser
//! against it, and serve the rendered page exactly once.

use std::{
    env, io,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, header},
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::{
    net::TcpListener,
    process::Command,
    sync::{Mutex, oneshot},
};
use tracing::debug;

use crate::error::{AppError, PreviewError};

/// How long the launcher waits for the browser to fetch the page.
pub const PREVIEW_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome published on the completion signal: the page was handed to the
/// browser, or the serving task failed.
pub type ServeOutcome = Result<(), PreviewError>;

/// Browser launch commands for the supported host platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand {
    /// macOS `open`.
    Open,
    /// Linux `xdg-open`.
    XdgOpen,
    /// Windows `cmd.exe /C start`.
    CmdStart,
}

impl BrowserCommand {
    /// Resolve the launch command for the running operating system.
    pub fn for_host() -> Result<Self, PreviewError> {
        Self::for_os(env::consts::OS)
    }

    fn for_os(os: &str) -> Result<Self, PreviewError> {
        match os {
            "macos" => Ok(Self::Open),
            "linux" => Ok(Self::XdgOpen),
            "windows" => Ok(Self::CmdStart),
            other => Err(PreviewError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }

    fn executable(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::XdgOpen => "xdg-open",
            Self::CmdStart => "cmd.exe",
        }
    }

    fn base_args(self) -> &'static [&'static str] {
        match self {
            Self::Open | Self::XdgOpen => &[],
            Self::CmdStart => &["/C", "start"],
        }
    }
}

/// Start a one-shot preview of `doc`.
///
/// Returns as soon as the browser launcher process has exited; serving
/// continues on a background task and reports through the returned receiver.
/// Every setup failure is synchronous and terminal, and nothing is retried.
pub async fn serve(doc: Bytes) -> Result<oneshot::Receiver<ServeOutcome>, PreviewError> {
    let command = BrowserCommand::for_host()?;
    let executable = locate_executable(command.executable())?;

    // Bind before launching so the browser's first request is queued by the
    // accept backlog instead of being refused.
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .map_err(PreviewError::Listen)?;
    let addr = listener.local_addr().map_err(PreviewError::Listen)?;
    let url = format!("http://{addr}");

    launch_browser(&executable, command.base_args(), &url).await?;
    debug!(%url, "browser launched, serving preview");

    Ok(serve_once(listener, doc))
}

/// Wait for the serving task's outcome, giving up after [`PREVIEW_TIMEOUT`].
///
/// An abandoned server is not torn down here; process exit is the teardown
/// mechanism for the whole preview.
pub async fn await_completion(done: oneshot::Receiver<ServeOutcome>) -> Result<(), AppError> {
    match tokio::time::timeout(PREVIEW_TIMEOUT, done).await {
        Ok(Ok(outcome)) => outcome.map_err(AppError::from),
        Ok(Err(_)) => Err(PreviewError::Interrupted.into()),
        Err(_) => Err(AppError::Timeout(PREVIEW_TIMEOUT)),
    }
}

struct PreviewState {
    doc: Bytes,
    done: Mutex<Option<oneshot::Sender<ServeOutcome>>>,
}

/// Serve `doc` on `listener` from a background task, resolving the returned
/// signal at most once.
pub fn serve_once(listener: TcpListener, doc: Bytes) -> oneshot::Receiver<ServeOutcome> {
    let (tx, rx) = oneshot::channel();
    let state = Arc::new(PreviewState {
        doc,
        done: Mutex::new(Some(tx)),
    });

    let router = Router::new()
        .fallback(deliver)
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router.into_make_service()).await {
            if let Some(done) = state.done.lock().await.take() {
                let _ = done.send(Err(PreviewError::Serve(err)));
            }
        }
    });

    rx
}

/// Single handler for every path: hand over the page and publish completion.
///
/// Only the first request can take the sender; later requests (extra tabs,
/// prefetchers) still receive the page but publish nothing.
async fn deliver(State(state): State<Arc<PreviewState>>) -> impl IntoResponse {
    if let Some(done) = state.done.lock().await.take() {
        let _ = done.send(Ok(()));
    }
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )],
        state.doc.clone(),
    )
}

fn locate_executable(name: &'static str) -> Result<PathBuf, PreviewError> {
    let search = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&search)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or(PreviewError::ExecutableNotFound { name })
}

/// Run the launcher as a foreground child and wait for it to exit. The
/// launcher is expected to return quickly once the browser window has been
/// requested.
async fn launch_browser(
    executable: &Path,
    base_args: &[&str],
    url: &str,
) -> Result<(), PreviewError> {
    let status = Command::new(executable)
        .args(base_args)
        .arg(url)
        .status()
        .await
        .map_err(|source| PreviewError::Launch {
            command: executable.display().to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(PreviewError::Launch {
            command: executable.display().to_string(),
            source: io::Error::other(format!("launcher exited with {status}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_map_to_launch_commands() {
        assert_eq!(BrowserCommand::for_os("macos").unwrap(), BrowserCommand::Open);
        assert_eq!(
            BrowserCommand::for_os("linux").unwrap(),
            BrowserCommand::XdgOpen
        );
        assert_eq!(
            BrowserCommand::for_os("windows").unwrap(),
            BrowserCommand::CmdStart
        );
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = BrowserCommand::for_os("plan9").unwrap_err();
        assert!(matches!(err, PreviewError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn lookup_fails_when_path_has_no_match() {
        let err = locate_executable("definitely-not-a-real-launcher").unwrap_err();
        assert!(matches!(err, PreviewError::ExecutableNotFound { .. }));
    }
}

//! Error taxonomy: one enum per pipeline layer, wrapped into [`AppError`].

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures while converting a Markdown file into the final HTML page.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("read input file {path}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse template {name}")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },
    #[error("{stage} produced no output; refusing to continue with malformed input")]
    MalformedContent { stage: &'static str },
    #[error("execute template")]
    TemplateExecution(#[source] tera::Error),
}

/// Failures while persisting the rendered page to a file.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("create output file")]
    Create(#[source] io::Error),
    #[error("write output file")]
    Write(#[source] io::Error),
    #[error("persist output file {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while setting up or running the loopback preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("no browser launch command is known for {os}")]
    UnsupportedPlatform { os: String },
    #[error("browser launcher {name:?} not found on PATH")]
    ExecutableNotFound { name: &'static str },
    #[error("bind loopback listener")]
    Listen(#[source] io::Error),
    #[error("launch browser with {command:?}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("serve preview")]
    Serve(#[source] io::Error),
    #[error("preview server stopped before completing a response")]
    Interrupted,
}

/// Top-level application error surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error("timed out after {0:?} waiting for the browser to fetch the preview")]
    Timeout(Duration),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

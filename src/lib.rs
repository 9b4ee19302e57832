//! Render a local Markdown file to sanitized HTML and make it viewable,
//! either through a short-lived loopback preview server that opens the
//! default browser, or as a uniquely-named file on disk.

pub mod cli;
pub mod convert;
pub mod emit;
pub mod error;
pub mod preview;
pub mod telemetry;

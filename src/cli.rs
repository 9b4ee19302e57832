//! Command-line arguments for the mdp binary.

use std::path::PathBuf;

use clap::{Parser, ValueHint};

#[derive(Debug, Parser)]
#[command(
    name = "mdp",
    version,
    about = "Preview a Markdown file as sanitized HTML in the default browser"
)]
pub struct CliArgs {
    /// Markdown file to preview.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Skip the browser preview and write the rendered page to a file instead.
    #[arg(short = 's', long = "skip-preview")]
    pub skip_preview: bool,

    /// Alternate page template; the built-in template is used when omitted.
    #[arg(
        short = 't',
        long = "template",
        env = "MDP_TEMPLATE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub template: Option<PathBuf>,
}

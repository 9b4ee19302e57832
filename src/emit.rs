//! Write the rendered page to a uniquely-named file in the system temp area.

use std::{io::Write, path::PathBuf};

use tracing::debug;

use crate::error::EmitError;

/// Write `doc` to a freshly created `mdp*.html` file and print its path to
/// stdout.
///
/// The write is all-or-nothing from the caller's perspective: on any failure
/// the partially written temporary file is removed on drop and no path is
/// printed. Every call produces a new, previously nonexistent path.
pub fn emit(doc: &[u8]) -> Result<PathBuf, EmitError> {
    let mut file = tempfile::Builder::new()
        .prefix("mdp")
        .suffix(".html")
        .tempfile()
        .map_err(EmitError::Create)?;

    file.write_all(doc).map_err(EmitError::Write)?;
    file.flush().map_err(EmitError::Write)?;

    let (_, path) = file.keep().map_err(|err| EmitError::Persist {
        path: err.file.path().to_path_buf(),
        source: err.error,
    })?;

    debug!(path = %path.display(), "wrote preview file");
    println!("{}", path.display());
    Ok(path)
}

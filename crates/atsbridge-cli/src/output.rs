use std::io::{self, Write};

use serde::Serialize;

use crate::error::CliError;

/// Writes a payload as one JSON document on stdout.
pub fn render<T: Serialize>(payload: &T, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{rendered}")?;
    Ok(())
}

/// Writes the unified error shape on stdout.
///
/// Falls back to the display form on stderr when stdout is unusable.
pub fn render_error(error: &CliError, pretty: bool) {
    if render(&error.to_ats_error(), pretty).is_err() {
        eprintln!("error: {error}");
    }
}

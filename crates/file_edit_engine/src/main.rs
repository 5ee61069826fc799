use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::Context;
use file_edit_engine::{apply_file_changes, parse_file_changes};

/// Applies the file-edit region of a saved model response to the current
/// directory. Reads the response from the path given as the only argument, or
/// from stdin when no argument is given.
fn main() -> anyhow::Result<ExitCode> {
    let text = match std::env::args_os().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.to_string_lossy()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading response from stdin")?;
            buffer
        }
    };

    let parsed = parse_file_changes(&text).context("parsing file changes")?;
    if parsed.changes.is_empty() {
        eprintln!("No file changes found.");
        return Ok(ExitCode::SUCCESS);
    }

    let root = std::env::current_dir().context("resolving current directory")?;
    let report = apply_file_changes(&root, &parsed.changes);
    report
        .write_summary(&mut io::stdout().lock(), &mut io::stderr().lock())
        .context("writing summary")?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

//! Interactive prompt for existing output files.

use anyhow::Result;
use ib_history_data::{ConflictChoice, ConflictInfo};
use std::io::{BufRead, Write};

/// Asks whether to overwrite, rename or cancel until a valid answer is given.
///
/// End of input counts as cancel, so a non-interactive run never loops.
///
/// # Errors
/// Returns an error if reading or writing the terminal fails.
pub fn prompt_conflict<R: BufRead, W: Write>(
    info: &ConflictInfo,
    mut input: R,
    mut output: W,
) -> Result<ConflictChoice> {
    writeln!(output)?;
    writeln!(output, "File conflict detected!")?;
    writeln!(
        output,
        "Output file '{}' already exists (modified: {})",
        info.path.display(),
        info.modified_display()
    )?;
    writeln!(output, "Full path: {}", info.absolute.display())?;
    writeln!(output)?;
    writeln!(output, "Choose action:")?;
    writeln!(output, "  [O]verwrite - Replace the existing file")?;
    writeln!(output, "  [R]ename    - Create new file with timestamp suffix")?;
    writeln!(output, "  [C]ancel    - Abort the operation")?;
    writeln!(output)?;

    loop {
        write!(output, "Enter choice [O/R/C]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(ConflictChoice::Cancel);
        }

        match parse_choice(&line) {
            Some(choice) => return Ok(choice),
            None => writeln!(output, "Invalid choice. Please enter O, R, or C.")?,
        }
    }
}

fn parse_choice(line: &str) -> Option<ConflictChoice> {
    match line.trim().to_ascii_uppercase().as_str() {
        "O" | "OVERWRITE" => Some(ConflictChoice::Overwrite),
        "R" | "RENAME" => Some(ConflictChoice::Rename),
        "C" | "CANCEL" => Some(ConflictChoice::Cancel),
        _ => None,
    }
}

/// Prompt bound to the process's stdin/stdout.
///
/// # Errors
/// Returns an error if the terminal cannot be read or written.
pub fn prompt_conflict_stdio(info: &ConflictInfo) -> Result<ConflictChoice> {
    let stdin = std::io::stdin();
    prompt_conflict(info, stdin.lock(), std::io::stdout())
}

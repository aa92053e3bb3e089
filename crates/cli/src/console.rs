//! Terminal prompts shared by the setup flow.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use openrover_calibration::{CalibrationError, CalibrationResult, Operator, PedalAxis};

/// Reads one trimmed line from stdin; `None` on EOF.
fn read_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let n = io::stdin().lock().read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn flush_prompt(message: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{message}")?;
    stdout.flush()
}

/// Prompts until the operator enters a parseable value; Enter keeps the
/// default, EOF also falls back to the default.
pub fn prompt_with_default<T: FromStr + Display>(message: &str, default: T) -> io::Result<T> {
    loop {
        flush_prompt(&format!("{message} [{default}]: "))?;
        match read_line()? {
            None => return Ok(default),
            Some(input) if input.is_empty() => return Ok(default),
            Some(input) => match input.parse() {
                Ok(value) => return Ok(value),
                Err(_) => println!("Could not parse '{input}', try again."),
            },
        }
    }
}

/// Prompts for an index in `0..count`, reprompting on anything else.
///
/// Returns `None` on EOF.
pub fn prompt_index(message: &str, count: usize) -> io::Result<Option<usize>> {
    loop {
        flush_prompt(&format!("{message} [0-{}]: ", count.saturating_sub(1)))?;
        match read_line()? {
            None => return Ok(None),
            Some(input) => match input.parse::<usize>() {
                Ok(index) if index < count => return Ok(Some(index)),
                _ => println!("Enter a number between 0 and {}.", count.saturating_sub(1)),
            },
        }
    }
}

/// Prompts for yes/no; Enter means `default`.
pub fn prompt_yes_no(message: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    loop {
        flush_prompt(&format!("{message} [{hint}]: "))?;
        match read_line()? {
            None => return Ok(default),
            Some(input) => match input.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => println!("Could not parse '{other}', answer y or n."),
            },
        }
    }
}

/// Calibration prompts over the terminal.
///
/// EOF on stdin is treated as the operator walking away and cancels the
/// procedure.
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn instruct(&mut self, message: &str) -> CalibrationResult<()> {
        println!("{message}");
        match read_line() {
            Ok(Some(_)) => Ok(()),
            Ok(None) | Err(_) => Err(CalibrationError::Cancelled),
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }

    fn pick_offset(&mut self, axis: PedalAxis, candidates: &[usize]) -> CalibrationResult<usize> {
        let default = candidates.first().copied().unwrap_or(0);
        println!("Candidate byte indices for {axis}: {candidates:?}");
        loop {
            if flush_prompt(&format!("Low-byte index for {axis} [{default}]: ")).is_err() {
                return Err(CalibrationError::Cancelled);
            }
            match read_line() {
                Ok(Some(input)) if input.is_empty() => return Ok(default),
                Ok(Some(input)) => match input.parse::<usize>() {
                    Ok(offset) => return Ok(offset),
                    Err(_) => println!("Could not parse '{input}', enter a byte index."),
                },
                Ok(None) | Err(_) => return Err(CalibrationError::Cancelled),
            }
        }
    }
}

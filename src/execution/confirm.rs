//! Operator confirmation

use console::style;
use std::fs::File;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("failed to read operator input: {0}")]
    Io(#[from] io::Error),
}

/// Asks the operator a yes/no question
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool, ConfirmError>;
}

/// Interpret a typed answer; only an explicit yes counts
pub fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reads answers from stdin, prompting on stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfirmer;

impl ConsoleConfirmer {
    pub fn new() -> Self {
        Self
    }
}

impl Confirmer for ConsoleConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool, ConfirmError> {
        let mut stdout = io::stdout();
        write!(stdout, "{} {} ", style("?").yellow().bold(), prompt)?;
        write!(stdout, "{} ", style("(y/n)").dim())?;
        stdout.flush()?;

        // Children inherit stdin, so only the answer line may be consumed
        let mut input = unbuffered_stdin()?;
        match read_answer_line(&mut input)? {
            Some(answer) => Ok(parse_answer(&answer)),
            None => {
                // EOF: nobody is there to say yes
                println!();
                warn!("Standard input closed while waiting for confirmation; treating as no");
                Ok(false)
            }
        }
    }
}

/// Read one line a byte at a time, dropping the newline.
///
/// Returns `None` at end of input before any byte was read.
pub fn read_answer_line<R: Read>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) if line.is_empty() => return Ok(None),
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

/// Stdin without the process-wide buffer in front of it
#[cfg(unix)]
fn unbuffered_stdin() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
fn unbuffered_stdin() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    Ok(File::from(io::stdin().as_handle().try_clone_to_owned()?))
}

/// Accepts every prompt, for unattended runs
#[derive(Debug, Clone, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, prompt: &str) -> Result<bool, ConfirmError> {
        println!("{} {} {}", style("?").yellow().bold(), prompt, style("yes (--yes)").dim());
        Ok(true)
    }
}

//! Line input from stdin

use std::io::{IsTerminal, Write};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads trimmed lines, from stdin unless told otherwise
pub struct LineInput<R = BufReader<Stdin>> {
    lines: Lines<R>,
    terminal: bool,
}

impl LineInput {
    pub fn stdin() -> Self {
        Self::new(
            BufReader::new(tokio::io::stdin()),
            std::io::stdin().is_terminal(),
        )
    }
}

impl<R: AsyncBufRead + Unpin> LineInput<R> {
    /// Read from `reader`; `terminal` says whether a person is typing
    pub fn new(reader: R, terminal: bool) -> Self {
        Self {
            lines: reader.lines(),
            terminal,
        }
    }

    /// Whether a person is typing
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Show `prompt` and read one line
    ///
    /// Returns `None` at end of input or on Ctrl-C.
    pub async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        tokio::select! {
            line = self.lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
            _ = tokio::signal::ctrl_c() => {
                println!();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_trimmed_lines() {
        let mut input = LineInput::new(&b"  first \nsecond\n"[..], true);
        assert!(input.is_terminal());
        assert_eq!(input.read_line("> ").await.unwrap().as_deref(), Some("first"));
        assert_eq!(input.read_line("> ").await.unwrap().as_deref(), Some("second"));
        assert_eq!(input.read_line("> ").await.unwrap(), None);
    }
}

//! Line-oriented console prompts

use std::io::{self, BufRead, Write};

/// Question/answer console over any reader and writer
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line
    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Print `question` and read one trimmed answer line.
    ///
    /// End of input is an error so prompt loops cannot spin forever.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(answer.trim().to_string())
    }

    /// Ask a yes/no question; anything but `y`/`yes` is no
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(question)?.to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_ask_trims_and_confirm() {
        let mut console = Console::new(Cursor::new("  10.0.0.2 \nY\nnope\n"), Vec::new());
        assert_eq!(console.ask("Address: ").unwrap(), "10.0.0.2");
        assert!(console.confirm("Sure? ").unwrap());
        assert!(!console.confirm("Again? ").unwrap());

        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output, "Address: Sure? Again? ");
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let mut console = Console::new(Cursor::new(""), Vec::new());
        let err = console.ask("Anything? ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}

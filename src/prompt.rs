use std::{
    io::{BufRead, StdinLock, Stdout, Write},
    path::PathBuf,
};

use anyhow::{Result, bail};

use crate::{file, money};

/// Line oriented questions, asked again until the answer is usable
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn target(&mut self) -> Result<u64> {
        loop {
            let line =
                self.readline("Target (in cents, e.g. 6867467, or in reais, e.g. 68674,67): ")?;
            match money::parse_target_to_cents(&line) {
                Ok(cents) => return Ok(cents),
                Err(err) => self.say(err)?,
            }
        }
    }

    pub fn count(&mut self) -> Result<usize> {
        loop {
            let line = self.readline("Number of values to generate (e.g. 30000): ")?;
            match line.parse::<usize>() {
                Ok(n) if n >= 2 => return Ok(n),
                Ok(_) => self.say("Please enter a value >= 2.")?,
                Err(_) => self.say("Please enter a whole non-negative number.")?,
            }
        }
    }

    pub fn output_path(&mut self) -> Result<PathBuf> {
        self.say("Enter the FULL path of the output .csv file.")?;
        self.say("E.g. /home/you/Documents/instances_30k.csv")?;
        loop {
            let line = self.readline("Save to: ")?;
            match file::validate_output_path(&line) {
                Ok(path) => return Ok(path),
                Err(err) => self.say(err)?,
            }
        }
    }

    /// Starts from `initial` when given and asks until the path exists
    pub fn existing_file(&mut self, initial: Option<PathBuf>) -> Result<PathBuf> {
        let mut path = match initial {
            Some(path) => path,
            None => {
                self.say("Enter the FULL path of the generated CSV file.")?;
                PathBuf::from(self.readline("CSV path: ")?)
            }
        };

        while path.as_os_str().is_empty() || !path.exists() {
            self.say("File not found. Check the path and try again.")?;
            path = PathBuf::from(self.readline("CSV path: ")?);
        }

        Ok(path)
    }

    fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(())
    }

    fn readline(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            bail!("input closed before an answer was given");
        }

        Ok(unquote(&buffer).to_string())
    }
}

/// Trims whitespace and the quotes a pasted path often carries
fn unquote(line: &str) -> &str {
    line.trim().trim_matches('"').trim_matches('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("  \"C:/data/x.csv\"\n"), "C:/data/x.csv");
        assert_eq!(unquote("'/tmp/x.csv'"), "/tmp/x.csv");
    }

    #[test]
    fn test_target_retries() {
        let mut p = prompt("abc\n0\nR$ 1.000,50\n");
        assert_eq!(p.target().unwrap(), 100050);

        let out = String::from_utf8(p.output).unwrap();
        assert!(out.contains("invalid target 'abc'"));
        assert!(out.contains("target must be positive"));
    }

    #[test]
    fn test_count_retries() {
        let mut p = prompt("x\n1\n-3\n30000\n");
        assert_eq!(p.count().unwrap(), 30000);

        let out = String::from_utf8(p.output).unwrap();
        assert_eq!(out.matches("Please enter a value >= 2.").count(), 1);
        assert_eq!(out.matches("Please enter a whole non-negative number.").count(), 2);
    }

    #[test]
    fn test_output_path_retries() {
        let mut p = prompt("\nout.txt\n\"out/instances.csv\"\n");
        assert_eq!(p.output_path().unwrap(), PathBuf::from("out/instances.csv"));
    }

    #[test]
    fn test_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        std::fs::write(&path, "name,pool,target\n").unwrap();

        let input = format!("{}\n", path.display());
        let mut p = prompt(&input);
        let missing = dir.path().join("missing.csv");
        assert_eq!(p.existing_file(Some(missing)).unwrap(), path);

        let out = String::from_utf8(p.output).unwrap();
        assert!(out.contains("File not found"));
    }

    #[test]
    fn test_closed_input() {
        let mut p = prompt("abc\n");
        assert!(p.target().is_err());
    }
}

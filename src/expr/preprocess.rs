//! External pre-processing of requirement expressions.
//!
//! Some authoring tools store requirement properties in a surface syntax
//! that an external translator must rewrite before the sub-language parser
//! sees it. The translator is invoked once per requirement as a blocking
//! subprocess; the raw property string is appended as the final argument and
//! the translated expression is read from stdout. Any failure (spawn error,
//! non-zero exit) surfaces as a parse failure for that one requirement.

use std::process::Command;

/// An external translation command, e.g. `fret2ptltl --strict`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PreprocessCommand {
    /// Split a command line into program and arguments. Whitespace-separated;
    /// no shell quoting.
    pub fn parse(command_line: &str) -> Result<Self, String> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "empty preprocess command".to_string())?
            .to_string();
        Ok(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Translate one raw property string.
    pub fn run(&self, property: &str) -> Result<String, String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(property)
            .output()
            .map_err(|e| format!("failed to run '{}': {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let cmd = PreprocessCommand::parse("translate --strict --mode pt").unwrap();
        assert_eq!(cmd.program, "translate");
        assert_eq!(cmd.args, vec!["--strict", "--mode", "pt"]);

        assert!(PreprocessCommand::parse("   ").is_err());
    }

    #[test]
    fn test_run_echo() {
        let cmd = PreprocessCommand::parse("echo").unwrap();
        assert_eq!(cmd.run("alt > 0").unwrap(), "alt > 0");
    }

    #[test]
    fn test_run_missing_program() {
        let cmd = PreprocessCommand::parse("definitely-not-a-real-binary").unwrap();
        let err = cmd.run("x").unwrap_err();
        assert!(err.contains("failed to run"));
    }

    #[test]
    fn test_run_nonzero_exit() {
        let cmd = PreprocessCommand::parse("false").unwrap();
        assert!(cmd.run("x").is_err());
    }
}

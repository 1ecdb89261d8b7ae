use std::{error::Error, fmt::Display, path::Path};

/// A fatal translation diagnostic. There is no recovery: the first error
/// aborts the whole run and is printed as a single line by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub position: Option<(String, usize, usize)>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, file: &Path, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            position: Some((file.to_string_lossy().to_string(), line, col)),
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some((file, line, col)) => {
                f.write_str(&format!("{} ({}:{}:{})", self.message, file, line, col))
            }
            None => f.write_str(&self.message),
        }
    }
}

impl Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        CompileError::new(format!("failed to write output: {err}"))
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

//! RTF to DOCX conversion for PRDs that were exported as rich text, via
//! `pandoc`.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Command '{0}' not found. Please install pandoc and ensure it is in your PATH.")]
    ToolMissing(String),

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not write {path}")]
    NoOutput { tool: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can turn a source document into a `.docx`
pub trait DocumentConverter {
    fn to_docx(&self, source: &Path, target: &Path) -> Result<(), ConvertError>;
}

/// Converts with the `pandoc` command-line tool
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl PandocConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DocumentConverter for PandocConverter {
    fn to_docx(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        debug!("Running {} {} -o {}", self.program, source.display(), target.display());
        let output = Command::new(&self.program)
            .arg(source)
            .arg("-o")
            .arg(target)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::ToolMissing(self.program.clone())
                } else {
                    ConvertError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !target.is_file() {
            return Err(ConvertError::NoOutput {
                tool: self.program.clone(),
                path: target.to_path_buf(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_program_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let converter = PandocConverter::new("prdops-no-such-converter");

        let err = converter
            .to_docx(&temp_dir.path().join("a.rtf"), &temp_dir.path().join("a.docx"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::ToolMissing(ref tool) if tool == "prdops-no-such-converter"));
        assert!(err.to_string().contains("install pandoc"));
    }
}

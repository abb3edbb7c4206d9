//! The env-style secrets store
//!
//! A `KEY=VALUE` text file holding the signing and encryption keys. Key
//! provisioning merges generated values into this file without disturbing
//! unrelated entries, comments, or blank lines, and writes it back with
//! owner-only permissions.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::VaultError;

/// One line of the secrets file, preserved verbatim unless it is an entry
/// the caller rewrites
#[derive(Debug, Clone)]
enum Line {
    Entry { key: String, value: String },
    Raw(String),
}

/// In-memory representation of the secrets file
#[derive(Debug, Clone, Default)]
pub struct SecretsFile {
    lines: Vec<Line>,
}

impl SecretsFile {
    /// Load the secrets file from disk. A missing file is an empty store
    /// (first boot), not an error.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let lines = contents
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return Line::Raw(line.to_string());
                }
                match line.split_once('=') {
                    Some((key, value)) => Line::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    None => Line::Raw(line.to_string()),
                }
            })
            .collect();

        Self { lines }
    }

    /// Get the value of an entry
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set an entry, replacing an existing one in place or appending
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value.to_string();
                    return;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Write the secrets file back to disk with owner-only permissions.
    ///
    /// Writes to a temp file in the same directory, fsyncs, and renames so
    /// the store is never left half-written.
    pub fn save(&self, path: &Path) -> Result<(), VaultError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = path.with_extension("env.tmp");
        let mut file = open_owner_only(&temp_path)
            .map_err(|e| VaultError::Io(format!("Failed to create temp file: {}", e)))?;

        for line in &self.lines {
            match line {
                Line::Entry { key, value } => writeln!(file, "{}={}", key, value),
                Line::Raw(raw) => writeln!(file, "{}", raw),
            }
            .map_err(|e| VaultError::Io(format!("Failed to write secrets: {}", e)))?;
        }

        file.sync_all()
            .map_err(|e| VaultError::Io(format!("Failed to sync secrets: {}", e)))?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            VaultError::Io(format!("Failed to rename temp file: {}", e))
        })?;

        Ok(())
    }

    /// Render the file as it would be written (for tests)
    #[cfg(test)]
    fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                Line::Raw(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

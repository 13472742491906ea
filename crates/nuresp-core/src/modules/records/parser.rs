use crate::domain::NurespError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TableParseError {
    #[error("failed to read data table '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data table '{}' line {line}: expected {expected} columns, found {actual}", path.display())]
    ColumnCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("data table '{}' line {line}: '{token}' is not a number", path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        token: String,
    },
}

impl From<TableParseError> for NurespError {
    fn from(error: TableParseError) -> Self {
        match error {
            TableParseError::Read { .. } => {
                NurespError::io_system("IO.DATA_TABLE_READ", error.to_string())
            }
            TableParseError::ColumnCount { .. } | TableParseError::InvalidNumber { .. } => {
                NurespError::input_validation("INPUT.DATA_TABLE", error.to_string())
            }
        }
    }
}

/// Blank lines are skipped. `origin` only labels errors; line numbers are 1-based.
pub fn parse_table<const N: usize>(
    source: &str,
    origin: &Path,
) -> Result<Vec<[f64; N]>, TableParseError> {
    let mut rows = Vec::new();

    for (index, line) in source.lines().enumerate().skip(1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
        if tokens.len() != N {
            return Err(TableParseError::ColumnCount {
                path: origin.to_path_buf(),
                line: index + 1,
                expected: N,
                actual: tokens.len(),
            });
        }

        let mut row = [0.0; N];
        for (slot, token) in row.iter_mut().zip(tokens) {
            *slot = token
                .parse::<f64>()
                .map_err(|_| TableParseError::InvalidNumber {
                    path: origin.to_path_buf(),
                    line: index + 1,
                    token: token.to_string(),
                })?;
        }
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_table<const N: usize>(path: &Path) -> Result<Vec<[f64; N]>, TableParseError> {
    let source = fs::read_to_string(path).map_err(|source| TableParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&source, path)
}

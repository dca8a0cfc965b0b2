//! Dataset loading.
//!
//! Input files are whitespace-delimited text; the value is the last column
//! of every non-empty line. That covers both plain one-value-per-line files
//! and the multi-column weather logs this tool grew up on (station, date,
//! time columns followed by a temperature reading).

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Read every value from `path`. Fails with the offending line number on
/// unparseable or non-finite values, and on an empty dataset -- the pipeline
/// never sees malformed input.
pub fn load_values(path: &Path) -> Result<Vec<f32>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;

    let mut values = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Last column of the line is the measurement.
        let field = line
            .split_whitespace()
            .next_back()
            .expect("non-empty line has at least one field");
        let value: f32 = field.parse().with_context(|| {
            format!(
                "{}:{}: '{}' is not a number",
                path.display(),
                line_no + 1,
                field
            )
        })?;
        if !value.is_finite() {
            bail!(
                "{}:{}: non-finite value '{}'",
                path.display(),
                line_no + 1,
                field
            );
        }
        values.push(value);
    }

    if values.is_empty() {
        bail!("dataset {} contains no values", path.display());
    }

    tracing::info!(path = %path.display(), count = values.len(), "Dataset loaded");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn takes_the_last_column() {
        let file = write_temp("BARKSTON 2022 3 1 1200 5.5\nBARKSTON 2022 3 1 1300 -2.0\n");
        let values = load_values(file.path()).unwrap();
        assert_eq!(values, vec![5.5, -2.0]);
    }

    #[test]
    fn plain_single_column_works_and_blank_lines_are_skipped() {
        let file = write_temp("1.0\n\n2.5\n   \n-3.25\n");
        let values = load_values(file.path()).unwrap();
        assert_eq!(values, vec![1.0, 2.5, -3.25]);
    }

    #[test]
    fn bad_value_reports_the_line_number() {
        let file = write_temp("1.0\noops\n");
        let err = load_values(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains(":2:"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let file = write_temp("1.0\ninf\n");
        assert!(load_values(file.path()).is_err());
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let file = write_temp("\n  \n");
        let err = load_values(file.path()).unwrap_err();
        assert!(err.to_string().contains("no values"));
    }
}

//! Whitespace-delimited text tables
//!
//! Layout matches numpy `savetxt`/`loadtxt` defaults: one row per line,
//! single-space separators, every value as `%.18e`. Nineteen significant
//! digits round-trip any `f64` exactly, so rewriting a table is
//! byte-identical.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::Table;
use crate::{Error, Result};

/// Format one value as `%.18e` with a signed two-digit exponent
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    // Rust renders `5.0e-2`; numpy renders `5.0e-02`
    let rendered = format!("{value:.18e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = exponent
                .strip_prefix('-')
                .map_or(("+", exponent), |digits| ("-", digits));
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// Parse a text table; `origin` only labels errors
///
/// Blank lines and `#` comments are skipped. An input with no data rows
/// yields a 0x0 table.
///
/// # Errors
/// Returns [`Error::DataAccess`] on unparsable tokens or ragged rows
pub fn parse_table(text: &str, origin: &Path) -> Result<Table> {
    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (line_no, line) in text.lines().enumerate() {
        let data = line.split_once('#').map_or(line, |(data, _)| data);
        let before = values.len();
        for token in data.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| {
                Error::data_access(
                    origin,
                    format!("line {}: {token:?} is not a number", line_no + 1),
                )
            })?;
            values.push(value);
        }

        let width = values.len() - before;
        if width == 0 {
            continue;
        }
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(Error::data_access(
                    origin,
                    format!(
                        "line {}: {width} columns, expected {expected}",
                        line_no + 1
                    ),
                ));
            }
            Some(_) => {}
        }
        rows += 1;
    }

    Table::new(values, rows, cols.unwrap_or(0))
}

/// Load a text table from disk
///
/// # Errors
/// Returns [`Error::DataAccess`] if the file is missing, unreadable, or malformed
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::data_access(path, format!("cannot read: {e}")))?;
    let table = parse_table(&text, path)?;
    debug!(
        path = %path.display(),
        rows = table.num_rows(),
        cols = table.num_columns(),
        "loaded table"
    );
    Ok(table)
}

/// Write a table in text form to any writer
///
/// # Errors
/// Returns [`Error::Io`] if the writer fails
pub fn write_table<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    for row in table.rows() {
        let mut first = true;
        for &value in row {
            if !first {
                writer.write_all(b" ")?;
            }
            writer.write_all(format_value(value).as_bytes())?;
            first = false;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Save a table, fully overwriting `path`
///
/// # Errors
/// Returns [`Error::DataAccess`] if the file cannot be created or written
pub fn save_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| Error::data_access(path, format!("cannot create: {e}")))?;
    write_table(table, BufWriter::new(file))
        .map_err(|e| Error::data_access(path, format!("cannot write: {e}")))?;
    debug!(path = %path.display(), rows = table.num_rows(), "saved table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value_matches_numpy() {
        assert_eq!(format_value(0.05), "5.000000000000000278e-02");
        assert_eq!(format_value(1.0), "1.000000000000000000e+00");
        assert_eq!(format_value(-250.0), "-2.500000000000000000e+02");
        assert_eq!(format_value(0.0), "0.000000000000000000e+00");
        assert!(format_value(1e-300).ends_with("e-300"));
        assert_eq!(format_value(f64::NAN), "nan");
        assert_eq!(format_value(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let text = "# header\n1 2 3 4\n\n  5\t6 7 8  # trailing\n";
        let table = parse_table(text, Path::new("mem")).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 4);
        assert_eq!(table.row(1), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_parse_accepts_numpy_output() {
        let text = "5.000000000000000278e-02 1.000000000000000056e-01\nnan -inf\n";
        let table = parse_table(text, Path::new("mem")).unwrap();
        assert!((table.row(0)[0] - 0.05).abs() < f64::EPSILON);
        assert!(table.row(1)[0].is_nan());
        assert_eq!(table.row(1)[1], f64::NEG_INFINITY);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = parse_table("1 2 3\n4 5\n", Path::new("raw.txt")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("raw.txt"));
        assert!(message.contains("line 2: 2 columns, expected 3"));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = parse_table("1 2 x 4\n", Path::new("raw.txt")).unwrap_err();
        assert!(matches!(err, Error::DataAccess { .. }));
        assert!(err.to_string().contains("\"x\" is not a number"));
    }

    #[test]
    fn test_parse_empty_text() {
        let table = parse_table("", Path::new("mem")).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_write_table_layout() {
        let table = Table::from_rows(&[[1.0, -2.0], [0.5, 3.0]]).unwrap();
        let mut buffer = Vec::new();
        write_table(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "1.000000000000000000e+00 -2.000000000000000000e+00\n\
             5.000000000000000000e-01 3.000000000000000000e+00\n"
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");
        let table = Table::from_rows(&[[0.1, 0.2, 0.3, 1.0 / 3.0], [1e10, -1e-10, 42.0, 0.0]])
            .unwrap();

        save_table(&table, &path).unwrap();
        let loaded = load_table(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(dir.path().join("7.txt")).unwrap_err();
        assert!(matches!(err, Error::DataAccess { .. }));
        assert!(err.to_string().contains("7.txt"));
    }
}

use crate::engine::error::EngineError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes a two column table under `# ` header lines.
pub(crate) fn write_table(
    writer: &mut impl Write,
    header: &[String],
    rows: impl Iterator<Item = (f64, f64)>,
) -> io::Result<()> {
    for line in header {
        writeln!(writer, "# {}", line)?;
    }
    for (x, y) in rows {
        writeln!(writer, "{}  {}", format_general(x), format_general(y))?;
    }
    writer.flush()
}

/// Creates `path` and hands a buffered writer to `write`.
pub(crate) fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), EngineError> {
    let io_error = |source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(io_error)
}

/// Formats a number like C's `%g`: six significant digits, trailing zeros
/// removed, scientific notation for very small or large magnitudes.
pub(crate) fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Fails early when `path` can obviously not be created, instead of after
/// the whole trajectory has been processed.
pub(crate) fn check_writable(path: &Path) -> Result<(), EngineError> {
    let io_error = |kind, message: &str| EngineError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(kind, message.to_string()),
    };

    if path.is_dir() {
        return Err(io_error(io::ErrorKind::Other, "path is a directory"));
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    match std::fs::metadata(parent) {
        Ok(metadata) if !metadata.is_dir() => {
            Err(io_error(io::ErrorKind::NotFound, "parent is not a directory"))
        }
        Ok(metadata) if metadata.permissions().readonly() => Err(io_error(
            io::ErrorKind::PermissionDenied,
            "parent directory is read-only",
        )),
        Ok(_) => Ok(()),
        Err(source) => Err(EngineError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorKind;

    #[test]
    fn format_general_matches_printf_style() {
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(3.0 * 0.05), "0.15");
        assert_eq!(format_general(9.95), "9.95");
        assert_eq!(format_general(1234567.0), "1.23457e+06");
        assert_eq!(format_general(0.000012345), "1.2345e-05");
        assert_eq!(format_general(-2.5), "-2.5");
        assert_eq!(format_general(100.0), "100");
        assert_eq!(format_general(f64::INFINITY), "inf");
    }

    #[test]
    fn table_has_header_then_one_line_per_row() {
        let mut output = Vec::new();
        let header = ["first".to_string(), "Selection: all".to_string()];
        write_table(&mut output, &header, [(0.0, 1.0), (0.5, 0.25)].into_iter()).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "# first\n# Selection: all\n0  1\n0.5  0.25\n"
        );
    }

    #[test]
    fn directory_or_missing_parent_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_writable(&dir.path().join("out.dat")).is_ok());

        let err = check_writable(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let err = check_writable(&dir.path().join("missing").join("out.dat")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

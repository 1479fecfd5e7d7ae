//! Hex memory images.
//!
//! Program images and memory dumps share one text format:
//! - One 32-bit word per line, in hexadecimal (`0x` prefix optional)
//! - Line N holds the word for address N
//! - Blank lines and lines starting with `;` or `#` are skipped on input
//!
//! Dumps are written as exactly eight lowercase hex digits per line.

use crate::cpu::MEMORY_SIZE;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Parse an image from text. Input beyond [`MEMORY_SIZE`] words is ignored.
pub fn parse_image(text: &str) -> Result<Vec<u32>, ImageError> {
    let mut words = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        if words.len() == MEMORY_SIZE {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        // Only the first token counts; anything after it is a comment.
        let token = trimmed.split_whitespace().next().unwrap_or_default();
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);

        let word = u32::from_str_radix(digits, 16).map_err(|e| ImageError::ParseError {
            line: line_num + 1,
            message: format!("invalid hex word {:?}: {}", token, e),
        })?;
        words.push(word);
    }

    Ok(words)
}

/// Load an image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_image(&text)
}

/// Render words as a dump: `%08x` per line.
pub fn format_image(words: &[u32]) -> String {
    let mut out = String::with_capacity(words.len() * 9);
    for word in words {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{:08x}", word);
    }
    out
}

/// Write a dump to disk.
pub fn save_image<P: AsRef<Path>>(path: P, words: &[u32]) -> Result<(), ImageError> {
    let file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
    let mut writer = std::io::BufWriter::new(file);

    writer
        .write_all(format_image(words).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur reading or writing images.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image() {
        let text = "00a80005\n; comment\n\n0x00d10002  ; add\n30000000\n";
        assert_eq!(parse_image(text).unwrap(), vec![0x00a8_0005, 0x00d1_0002, 0x3000_0000]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_image("00000000\nzzzz\n").unwrap_err();
        assert!(matches!(err, ImageError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_stops_at_capacity() {
        let text = "1\n".repeat(MEMORY_SIZE + 10);
        assert_eq!(parse_image(&text).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn test_format_image() {
        assert_eq!(format_image(&[0x1f, 0xdead_beef]), "0000001f\ndeadbeef\n");
    }

    #[test]
    fn test_dump_parses_back() {
        let words = vec![0, 1, 0xffff_ffff];
        assert_eq!(parse_image(&format_image(&words)).unwrap(), words);
    }

    #[test]
    fn test_missing_file() {
        let err = load_image("/nonexistent/prog.hex").unwrap_err();
        assert!(matches!(err, ImageError::IoError(_)));
    }
}

//! `.ls8` program images.
//!
//! An image is a text file with one byte per line, written in base 2:
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```
//!
//! Everything from a `#` to the end of the line is a comment. Lines that are empty after
//! stripping comments and whitespace are skipped.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not UTF-8 text (invalid byte at offset {offset})", path.display())]
    InvalidEncoding { path: PathBuf, offset: usize },
    #[error("line {line}: {text:?} is not an 8-bit binary literal")]
    InvalidLine { line: usize, text: String },
}

/// Parse image text into program bytes, in file order.
pub fn parse_program(text: &str) -> Result<Vec<u8>, ImageError> {
    let mut program = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let token = strip_comment(raw).trim();
        if token.is_empty() {
            continue;
        }
        let byte = parse_byte(token).ok_or_else(|| ImageError::InvalidLine {
            line: index + 1,
            text: token.to_string(),
        })?;
        program.push(byte);
    }
    Ok(program)
}

/// Read and parse the image at `path`.
pub fn load_program_file(path: impl AsRef<Path>) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ImageError::NotFound(path.to_path_buf()),
        _ => ImageError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let text = String::from_utf8(bytes).map_err(|err| ImageError::InvalidEncoding {
        path: path.to_path_buf(),
        offset: err.utf8_error().valid_up_to(),
    })?;
    parse_program(&text)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_byte(token: &str) -> Option<u8> {
    // `from_str_radix` accepts a leading `+`; image tokens are bare digits only.
    if !token.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u8::from_str_radix(token, 2).ok()
}

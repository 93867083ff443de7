pub mod error;

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::computer::MEMORY_SIZE;
use error::LoadError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Line {
    Byte(u8),
    Blank,
    Unparsable,
    TooWide,
}

/// A memory image ready to be copied in at address 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<u8>,
    skipped: Vec<usize>,
}

impl Program {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 1-based numbers of non-blank lines that were not binary literals.
    pub fn skipped_lines(&self) -> &[usize] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct LoaderOptions {
    pub warn_unparsable: bool,
}

fn is_binary_literal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b == b'0' || b == b'1')
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

fn parse_line(line: &str) -> Line {
    let code = strip_comment(line);

    if code.is_empty() {
        return Line::Blank;
    }

    if !is_binary_literal(code) {
        return Line::Unparsable;
    }

    // More than eight significant bits does not fit a cell.
    u8::from_str_radix(code, 2).map_or(Line::TooWide, Line::Byte)
}

pub fn parse_program(source: &str) -> Result<Program, LoadError> {
    let lines = source.lines().collect::<Vec<&str>>();

    let parsed = lines
        .par_iter()
        .enumerate()
        .map(|(i, line)| (i + 1, parse_line(line)))
        .collect::<Vec<(usize, Line)>>();

    let mut program = Program::default();

    for (number, line) in parsed {
        match line {
            Line::Byte(byte) => program.bytes.push(byte),
            Line::Unparsable => {
                debug!("skipping line {number}: {:?}", lines[number - 1]);
                program.skipped.push(number);
            }
            Line::TooWide => {
                return Err(LoadError::LiteralTooWide {
                    line: number,
                    literal: strip_comment(lines[number - 1]).to_string(),
                });
            }
            Line::Blank => {}
        }
    }

    if program.len() > MEMORY_SIZE {
        return Err(LoadError::ProgramTooLarge {
            len: program.len(),
            capacity: MEMORY_SIZE,
        });
    }

    Ok(program)
}

pub fn load_file(path: &Path) -> Result<Program, LoadError> {
    load_file_with(path, &LoaderOptions::default())
}

pub fn load_file_with(path: &Path, options: &LoaderOptions) -> Result<Program, LoadError> {
    let source = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Unreadable {
            path: path.to_path_buf(),
            source: err,
        },
    })?;

    let program = parse_program(&source)?;

    if options.warn_unparsable {
        for number in program.skipped_lines() {
            warn!("{}:{number}: not a binary literal, skipped", path.display());
        }
    }

    info!(
        "loaded {} bytes from {} ({} lines skipped)",
        program.len(),
        path.display(),
        program.skipped_lines().len()
    );

    Ok(program)
}

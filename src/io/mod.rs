//! Mesh readers and writers.
//!
//! Readers turn a byte stream into a [`MeshDescription`]; they never apply
//! the length conversion or build derived structure, [`Mesh::build`] does.
//! Writers serialize a built [`Mesh`].
//!
//! | module         | direction | format                                   |
//! |----------------|-----------|------------------------------------------|
//! | [`native`]     | read/write| native keyword format (`NDIME=` ...)     |
//! | [`tagged`]     | read      | tagged-block ASCII (CDL style)           |
//! | [`structured`] | read      | decoded structured-grid zones/sections   |
//! | [`vtk`]        | write     | legacy VTK unstructured grid             |
//! | [`plot`]       | write     | block plot (Tecplot style) finite-element zone |
//! | [`stl`]        | write     | ASCII stereolithography, boundary only   |

pub mod native;
pub mod plot;
pub mod stl;
pub mod structured;
pub mod tagged;
pub mod vtk;

use crate::mesh::{Mesh, MeshDescription};
use crate::mesh_error::MeshError;
use std::io::{Read, Write};
use std::iter::Peekable;
use std::str::FromStr;

/// Trait for readers producing a mesh description.
pub trait MeshReader {
    /// Parse a whole mesh from `reader`.
    fn read<R: Read>(&self, reader: R) -> Result<MeshDescription, MeshError>;
}

/// Trait for writers serializing a built mesh.
pub trait MeshWriter {
    fn write<W: Write>(&self, writer: W, mesh: &Mesh) -> Result<(), MeshError>;
}

/// Line iterator over a text mesh file that skips blank and comment lines
/// and remembers where it is for error messages.
pub(crate) struct Lines<'a> {
    inner: Peekable<std::iter::Enumerate<std::str::Lines<'a>>>,
    comment: &'static str,
    line_no: usize,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(contents: &'a str, comment: &'static str) -> Self {
        Self {
            inner: contents.lines().enumerate().peekable(),
            comment,
            line_no: 0,
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(&(_, l)) = self.inner.peek() {
            let t = l.trim();
            if t.is_empty() || t.starts_with(self.comment) {
                self.inner.next();
            } else {
                break;
            }
        }
    }

    /// Next meaningful line, trimmed.
    pub(crate) fn next_line(&mut self) -> Option<&'a str> {
        self.skip_ignored();
        let (i, l) = self.inner.next()?;
        self.line_no = i + 1;
        Some(l.trim())
    }

    pub(crate) fn peek_line(&mut self) -> Option<&'a str> {
        self.skip_ignored();
        self.inner.peek().map(|&(_, l)| l.trim())
    }

    /// Record `found` of a section that declared `declared` records.
    ///
    /// Running into the end of the file or into the next keyword line is a
    /// count mismatch rather than a syntax error.
    pub(crate) fn record(
        &mut self,
        section: &'static str,
        declared: usize,
        found: usize,
    ) -> Result<&'a str, MeshError> {
        match self.peek_line() {
            Some(l) if !l.contains('=') => Ok(self.next_line().unwrap_or(l)),
            _ => Err(MeshError::CountMismatch {
                section,
                declared,
                found,
            }),
        }
    }

    /// Next line, which must be `key= value`; returns the value.
    pub(crate) fn expect_keyword(&mut self, key: &str) -> Result<&'a str, MeshError> {
        let line = self
            .next_line()
            .ok_or_else(|| MeshError::Parse(format!("unexpected end of file, expected {key}=")))?;
        keyword(line, key).ok_or_else(|| self.error(format!("expected {key}=, found `{line}`")))
    }

    pub(crate) fn error(&self, msg: impl std::fmt::Display) -> MeshError {
        MeshError::Parse(format!("line {}: {msg}", self.line_no))
    }
}

/// Value of a `key= value` line, if the line carries `key`.
pub(crate) fn keyword<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (k, v) = line.split_once('=')?;
    (k.trim() == key).then(|| v.trim())
}

pub(crate) fn parse<T: FromStr>(raw: &str, what: &str) -> Result<T, MeshError> {
    raw.parse::<T>()
        .map_err(|_| MeshError::Parse(format!("invalid {what}: `{raw}`")))
}

/// Pull the next whitespace token and parse it.
pub(crate) fn next_token<'a, T, I>(tokens: &mut I, what: &str) -> Result<T, MeshError>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    let raw = tokens
        .next()
        .ok_or_else(|| MeshError::Parse(format!("missing {what}")))?;
    parse(raw, what)
}

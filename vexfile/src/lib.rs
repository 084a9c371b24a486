//! The object-file format shared by the translator and the simulator.
//!
//! An object file is a UTF-8 JSON document with two tables: `memory`
//! (allocation sizes for data-memory variables, in address order) and
//! `instructions` (the flat instruction stream, in address order). This
//! mirrors the teacher's binary `.vex` format in spirit — a small, dedicated
//! wire-format crate sitting between the translator and the VM — but the
//! wire encoding itself is JSON text, per the object-file contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub idx: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionEntry {
    pub idx: usize,
    pub opcode: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operand: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectFile {
    pub memory: Vec<MemoryEntry>,
    pub instructions: Vec<InstructionEntry>,
}

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "malformed object file: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn read<R: Read>(reader: R) -> Result<ObjectFile> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn write<W: Write>(writer: W, object: &ObjectFile) -> Result<()> {
    serde_json::to_writer_pretty(writer, object)?;
    Ok(())
}

pub trait ReadVexExt: Read + Sized {
    fn read_vex(&mut self) -> Result<ObjectFile> {
        read(self)
    }
}

impl<R: Read + Sized> ReadVexExt for R {}

pub trait WriteVexExt: Write + Sized {
    fn write_vex(&mut self, object: &ObjectFile) -> Result<()> {
        write(self, object)
    }
}

impl<W: Write + Sized> WriteVexExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<ObjectFile> {
    BufReader::new(File::open(path)?).read_vex()
}

pub fn write_file<P: AsRef<Path>>(path: P, object: &ObjectFile) -> Result<()> {
    BufWriter::new(File::create(path)?).write_vex(object)
}

#[cfg(test)]
mod test;

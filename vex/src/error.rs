//! Errors raised while loading an object file onto a fresh [`vcpu::ControlUnit`].

use std::fmt;

#[derive(Debug)]
pub enum Error {
    Object(vexfile::Error),
    Io(std::io::Error),
    Fault(vcpu::Fault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Object(err) => write!(f, "reading object file failed: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Fault(fault) => write!(f, "execution fault: {}", fault),
        }
    }
}

impl std::error::Error for Error {}

impl From<vexfile::Error> for Error {
    fn from(err: vexfile::Error) -> Error {
        Error::Object(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<vcpu::Fault> for Error {
    fn from(err: vcpu::Fault) -> Error {
        Error::Fault(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

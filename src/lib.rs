//! `libsigid` reads tags (TYPE, LABEL, UUID, VERSION, ..) from block
//! devices and disk images by matching superblock signatures against an
//! ordered registry of filesystems, RAID members and containers.
//!
//! A [`Probe`] is bound to an opened device (optionally at an offset),
//! configured with a [`ProbeRequest`] mask and an optional filter, then
//! advanced with [`Probe::step`]; each match yields tagged values readable
//! through [`Probe::lookup_value`] and friends.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]

mod probe;

#[cfg(test)]
mod tests;

pub(crate) mod ioctl;
mod util;

pub(crate) mod containers;
pub(crate) mod filesystems;
pub(crate) mod raid;

use std::{
    fs::File,
    io::Error as IoError,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub use crate::probe::{
    known_fstype, supported_types, Endianness, FilterMode, Probe, ProbeError, ProbeFn,
    ProbeIdinfo, ProbeMagic, ProbeRequest, ProbeStatus, ProbeValue, UsageFlags, MAX_VALUES,
    PROBES, SB_BUFSIZ, VALUE_BUFSIZ,
};

/// Errors from session construction and configuration. Probing itself
/// never fails through this type: unreadable devices exhaust, rejected
/// superblocks are skipped.
#[derive(Debug, Error)]
pub enum SigidError {
    /// Invalid argument(s) were provided to a function.
    #[error("Invalid arguments given: {0}")]
    Argument(&'static str),
    /// An I/O operation failed.
    #[error("I/O operation failed: {0}")]
    Io(#[from] IoError),
    /// A low-level *nix operation failed.
    #[error("*Nix operation failed: {0}")]
    Errno(#[from] rustix::io::Errno),
}

/// Builder pattern for creating a bound [`Probe`].
///
/// Opens the device by path and binds it together with an offset, an
/// optional explicit size, and a request mask.
#[derive(Debug, Default, Clone)]
pub struct ProbeBuilder {
    path: Option<PathBuf>,
    offset: u64,
    size: u64,
    request: ProbeRequest,
}

impl ProbeBuilder {
    /// Creates a new [`ProbeBuilder`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device or image to probe.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the byte offset from which to start probing.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the size of the probed window; 0 (the default) queries the
    /// device.
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Sets the attributes to collect on a match.
    pub fn request(mut self, request: ProbeRequest) -> Self {
        self.request = request;
        self
    }

    /// Opens the path and builds a bound [`Probe`].
    ///
    /// # Errors
    /// Returns [`SigidError::Argument`] if no path was set, or the open
    /// error for the path.
    pub fn build(self) -> Result<Probe, SigidError> {
        let path = self
            .path
            .ok_or(SigidError::Argument("path not set in ProbeBuilder"))?;
        let file = File::open(&path)?;

        let mut probe = Probe::new();
        probe.set_device(file, self.offset, self.size);
        probe.set_request(self.request);
        return Ok(probe);
    }
}

//! Result output: hex line on stdout plus an optional serialized message

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use powminer_ledger::{build_external_message, serialize_boc, CellError, StdAddress};

use crate::search::AcceptHandler;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to print result: {0}")]
    Print(#[source] io::Error),
    #[error("failed to build message: {0}")]
    Cell(#[from] CellError),
    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the message goes: the receiving account and the output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeTarget {
    pub destination: StdAddress,
    pub path: PathBuf,
}

/// Print `result` as uppercase hex, then persist the message if requested.
///
/// The hex line is written first so the value survives a persistence
/// failure. Returns the number of bytes written to the output file.
pub fn encode_and_persist<W: Write>(
    result: &[u8],
    envelope: Option<&EnvelopeTarget>,
    out: &mut W,
) -> Result<usize, EncodeError> {
    writeln!(out, "{}", hex::encode_upper(result)).map_err(EncodeError::Print)?;
    out.flush().map_err(EncodeError::Print)?;

    let Some(target) = envelope else {
        return Ok(0);
    };

    let message = build_external_message(result, &target.destination)?;
    let boc = serialize_boc(&message);
    info!(
        "Saving {} bytes of serialized external message into file `{}`",
        boc.len(),
        target.path.display()
    );
    write_atomic(&target.path, &boc)?;
    Ok(boc.len())
}

/// Write to a sibling temp file, then rename over the destination.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EncodeError> {
    let write_err = |source| EncodeError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| write_err(io::Error::new(io::ErrorKind::InvalidInput, "not a file path")))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

/// Accept handler used by the binary: stdout plus optional file
#[derive(Debug, Clone, Default)]
pub struct ResultEncoder {
    envelope: Option<EnvelopeTarget>,
}

impl ResultEncoder {
    pub fn new(envelope: Option<EnvelopeTarget>) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> Option<&EnvelopeTarget> {
        self.envelope.as_ref()
    }
}

impl AcceptHandler for ResultEncoder {
    fn accept(&self, value: &[u8]) -> Result<(), EncodeError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        encode_and_persist(value, self.envelope.as_ref(), &mut out)?;
        Ok(())
    }
}

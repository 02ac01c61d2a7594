//! Chunked byte copy from a remote stream into a local file.

use std::io::{self, Read, Write};
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir, fs_utf8::File};
use thiserror::Error;
use tracing::warn;

use crate::error::HdfsError;

/// Size of every chunk read from the remote stream.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Totals for one completed copy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CopyStats {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Non-empty chunks written.
    pub chunks: u64,
}

/// Failure of one side of a chunked copy.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Reading from the source failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// Writing to the destination failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// Copies `reader` into `writer` in [`CHUNK_SIZE`] chunks.
///
/// Each chunk is filled completely unless the source reaches end of stream,
/// so a short pipe read never ends the copy early. The loop stops after the
/// first chunk shorter than [`CHUNK_SIZE`], which for a source whose length
/// is an exact multiple of the chunk size is an empty chunk.
///
/// # Errors
///
/// Returns [`CopyError::Read`] or [`CopyError::Write`] naming the side that
/// failed.
pub fn copy_chunks<R, W>(reader: &mut R, writer: &mut W) -> Result<CopyStats, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut stats = CopyStats::default();

    loop {
        let filled = read_chunk(reader, &mut buffer).map_err(CopyError::Read)?;
        if let Some(chunk) = buffer.get(..filled)
            && !chunk.is_empty()
        {
            writer.write_all(chunk).map_err(CopyError::Write)?;
            stats.bytes += filled as u64;
            stats.chunks += 1;
        }
        if filled < CHUNK_SIZE {
            break;
        }
    }

    writer.flush().map_err(CopyError::Write)?;
    Ok(stats)
}

fn read_chunk<R: Read + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while let Some(rest) = buffer.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match reader.read(rest) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// Result of fetching one remote file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchSummary {
    /// Remote path that was streamed.
    pub source: String,
    /// Local file that received the bytes.
    pub destination: Utf8PathBuf,
    /// Bytes written.
    pub bytes: u64,
    /// Chunks written.
    pub chunks: u64,
}

/// Local file being written by a fetch.
///
/// Bytes land in a hidden sibling of the destination and replace it only on
/// [`commit`](Self::commit), so a failed fetch leaves any existing file
/// untouched. An existing destination is resolved first, which lets a
/// symlinked destination update the file it points to.
#[derive(Debug)]
pub(crate) struct LocalDestination {
    dir: Dir,
    file_name: String,
    part_name: String,
    path: Utf8PathBuf,
}

impl LocalDestination {
    /// Opens the directory holding `path` and creates the part file in it.
    pub(crate) fn create(path: &Utf8Path) -> Result<(Self, File), HdfsError> {
        let local_error = |message: String| HdfsError::LocalFile {
            path: path.to_string(),
            message,
        };

        let resolved = path
            .canonicalize_utf8()
            .unwrap_or_else(|_| path.to_path_buf());
        if resolved.is_dir() {
            return Err(local_error(String::from("destination is a directory")));
        }
        let file_name = resolved
            .file_name()
            .ok_or_else(|| local_error(String::from("destination has no file name")))?
            .to_owned();
        let parent = match resolved.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| local_error(err.to_string()))?;
        let part_name = format!(".{file_name}.{}.part", process::id());
        let file = dir
            .create(&part_name)
            .map_err(|err| local_error(err.to_string()))?;

        Ok((
            Self {
                dir,
                file_name,
                part_name,
                path: path.to_path_buf(),
            },
            file,
        ))
    }

    /// Destination as given by the caller.
    pub(crate) fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Moves the finished part file over the destination.
    pub(crate) fn commit(self) -> Result<(), HdfsError> {
        if let Err(err) = self.dir.rename(&self.part_name, &self.dir, &self.file_name) {
            let failure = HdfsError::LocalFile {
                path: self.path.to_string(),
                message: err.to_string(),
            };
            self.discard();
            return Err(failure);
        }
        Ok(())
    }

    /// Removes the part file, leaving the destination as it was.
    pub(crate) fn discard(self) {
        if let Err(err) = self.dir.remove_file(&self.part_name) {
            warn!(path = %self.path, error = %err, "failed to remove partial download");
        } else {
            warn!(path = %self.path, "removed partial download");
        }
    }
}

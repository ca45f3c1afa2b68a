//! Admission check for restore: is this file a controller data backup?

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;

use crate::error::{FatalError, Result};

/// Members every controller data backup contains.
pub const BACKUP_ARCHIVE_MARKER_PATHS: [&str; 4] = [
    "./db/version",
    "./db/WiredTiger",
    "./firmware.json",
    "./system.properties",
];

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];

/// Compression wrapped around the tar stream, detected from leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Gzip,
    Bzip2,
    Xz,
    Plain,
}

impl Codec {
    fn detect(head: &[u8]) -> Self {
        if head.starts_with(GZIP_MAGIC) {
            Codec::Gzip
        } else if head.starts_with(BZIP2_MAGIC) {
            Codec::Bzip2
        } else if head.starts_with(XZ_MAGIC) {
            Codec::Xz
        } else {
            Codec::Plain
        }
    }
}

/// Open the archive at `path` and confirm every marker path is a member.
///
/// Read only; nothing is extracted.
pub fn verify_backup_archive(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|source| FatalError::ArchiveUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let head = reader.fill_buf().map_err(|source| FatalError::ArchiveUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let not_tar = |source| FatalError::NotTarArchive {
        path: path.to_path_buf(),
        source,
    };
    if head.is_empty() {
        return Err(not_tar(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "empty file",
        )));
    }

    let codec = Codec::detect(head);
    let found = match codec {
        Codec::Gzip => marker_members(GzDecoder::new(reader)),
        Codec::Bzip2 => marker_members(BzDecoder::new(reader)),
        Codec::Xz => marker_members(XzDecoder::new(reader)),
        Codec::Plain => marker_members(reader),
    }
    .map_err(not_tar)?;

    debug!(path = %path.display(), ?codec, found = found.len(), "Scanned archive for marker files");
    if found.len() < BACKUP_ARCHIVE_MARKER_PATHS.len() {
        return Err(FatalError::NotControllerBackup(path.to_path_buf()));
    }
    Ok(())
}

fn marker_members<R: Read>(reader: R) -> io::Result<HashSet<&'static str>> {
    let mut archive = Archive::new(reader);
    let mut found = HashSet::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let name = entry.path_bytes();
        if let Some(marker) = BACKUP_ARCHIVE_MARKER_PATHS
            .iter()
            .find(|marker| marker.as_bytes() == name.as_ref())
        {
            found.insert(*marker);
        }
    }
    Ok(found)
}

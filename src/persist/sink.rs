//! Byte stores for snapshots.

use super::PersistError;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Where snapshot bytes live.
pub trait SnapshotSink {
    /// Read the stored bytes; `Ok(None)` when nothing has been stored yet.
    fn load(&mut self) -> Result<Option<Vec<u8>>, PersistError>;

    /// Replace the stored bytes.
    fn store(&mut self, bytes: &[u8]) -> Result<(), PersistError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// A snapshot file on disk.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous snapshot intact. A `.gz` path is
/// written gzip-compressed; compressed input is detected by magic bytes.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    gzip: bool,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let gzip = is_gzip_path(&path);
        Self { path, gzip }
    }

    /// Force compression regardless of extension.
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(tmp)?;
        if self.gzip {
            let mut encoder = GzEncoder::new(&mut file, Compression::default());
            encoder.write_all(bytes)?;
            encoder.finish()?;
        } else {
            file.write_all(bytes)?;
        }
        file.sync_all()
    }
}

impl SnapshotSink for FileSink {
    fn load(&mut self) -> Result<Option<Vec<u8>>, PersistError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(decode(bytes)?))
    }

    fn store(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        let result = self
            .write_temp(&tmp, bytes)
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            // Best effort; the write error is the one worth reporting.
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// True for paths with a `.gz` extension.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Inflate gzip input; pass anything else through untouched.
pub fn decode(bytes: Vec<u8>) -> Result<Vec<u8>, PersistError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes.as_slice()).read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(bytes)
    }
}

/// In-memory sink for headless use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    data: Option<Vec<u8>>,
    writes: usize,
    fail_writes: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `bytes` already stored.
    pub fn with_data(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(bytes.into()),
            ..Self::default()
        }
    }

    /// A sink whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn set_failing(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotSink for MemorySink {
    fn load(&mut self) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.data.clone())
    }

    fn store(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        if self.fail_writes {
            return Err(std::io::Error::new(ErrorKind::PermissionDenied, "memory sink is read-only").into());
        }
        self.data = Some(bytes.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

use std::io::{BufWriter, Write};
use std::path::Path;
use crc32fast::Hasher;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;
use crate::core::error::Result;

/// Result of publishing one table file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub line_count: u64,
    pub checksum: u32,     // CRC32 of the uncompressed content
    pub size_bytes: u64,   // Compressed size on disk
}

/// Writes a gzip table to a temp file in the destination directory and
/// publishes it with a rename, so readers never see a partial table.
pub struct TableWriter {
    encoder: GzEncoder<BufWriter<NamedTempFile>>,
    hasher: Hasher,
    line_count: u64,
}

impl TableWriter {
    /// `prefix` only labels the temp file; it never matches a published name.
    pub fn create(dir: &Path, prefix: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}.", prefix))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        Ok(TableWriter {
            encoder: GzEncoder::new(BufWriter::with_capacity(1024 * 1024, file), Compression::default()),
            hasher: Hasher::new(),
            line_count: 0,
        })
    }

    /// Append one line; a trailing newline is added when missing
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.encoder.write_all(line.as_bytes())?;
        self.hasher.update(line.as_bytes());
        if !line.ends_with('\n') {
            self.encoder.write_all(b"\n")?;
            self.hasher.update(b"\n");
        }
        self.line_count += 1;
        Ok(())
    }

    /// Flush, fsync and atomically rename into `dest`. An existing file at
    /// `dest` is replaced; concurrent builders write identical content.
    pub fn finish(self, dest: &Path) -> Result<TableSummary> {
        let buffered = self.encoder.finish()?;
        let file = buffered.into_inner().map_err(|e| e.into_error())?;
        file.as_file().sync_all()?;
        let size_bytes = file.as_file().metadata()?.len();

        file.persist(dest)?;

        Ok(TableSummary {
            line_count: self.line_count,
            checksum: self.hasher.finalize(),
            size_bytes,
        })
    }
}

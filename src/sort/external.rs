use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use flate2::read::MultiGzDecoder;
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::sort::spec::SortPlan;
use crate::storage::line_source::{LineSource, ProcessLines};
use crate::storage::table_writer::{TableSummary, TableWriter};

/// Reorders a gzip base table by a multi-key plan.
pub trait ExternalSort: Send + Sync {
    fn name(&self) -> &str;

    /// Sorted lines streamed to the caller; nothing is written to the cache
    fn stream(&self, base: &Path, plan: &SortPlan) -> Result<LineSource>;

    /// Sorted table published at `dest` (temp file + rename)
    fn persist(&self, base: &Path, plan: &SortPlan, dest: &Path) -> Result<TableSummary> {
        let mut writer = writer_for(dest)?;
        for line in self.stream(base, plan)? {
            writer.write_line(&line?)?;
        }
        writer.finish(dest)
    }
}

/// Temp-file writer in the same directory as `dest`, so the final rename
/// never crosses file systems
pub(crate) fn writer_for(dest: &Path) -> Result<TableWriter> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let prefix = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    TableWriter::create(dir, &prefix)
}

/// Sorts with the system `sort` utility
#[derive(Debug, Clone)]
pub struct UnixSort {
    pub program: PathBuf,
    pub temp_dir: Option<PathBuf>,   // Passed as `-T` for spill files
}

impl Default for UnixSort {
    fn default() -> Self {
        UnixSort {
            program: PathBuf::from("sort"),
            temp_dir: None,
        }
    }
}

impl UnixSort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    fn command(&self, plan: &SortPlan) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("LC_ALL", "C")
            .arg("-s")
            .arg("-t")
            .arg("\t");
        for key in &plan.keys {
            cmd.arg(key.sort_arg());
        }
        if let Some(dir) = &self.temp_dir {
            cmd.arg("-T").arg(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Spawn `sort` with a thread streaming the decompressed base into stdin
    pub fn spawn(&self, base: &Path, plan: &SortPlan) -> Result<ProcessLines> {
        let input = File::open(base)?;
        let label = format!("{} {}", self.program.display(), plan.code());

        let mut child = self.command(plan).spawn().map_err(|e| {
            Error::new(ErrorKind::SortFailed, format!("failed to spawn {}: {}", label, e))
        })?;
        debug!(process = %label, pid = child.id(), base = %base.display(), "spawned sort");

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::new(ErrorKind::SortFailed, format!("{}: stdin not captured", label)));
        };

        let feeder = thread::Builder::new()
            .name("sort-feeder".to_string())
            .spawn(move || -> io::Result<()> {
                let mut decoder = MultiGzDecoder::new(BufReader::new(input));
                let mut stdin = BufWriter::with_capacity(64 * 1024, stdin);
                io::copy(&mut decoder, &mut stdin)?;
                stdin.flush()
            });

        match feeder {
            Ok(handle) => ProcessLines::new(child, Some(handle), label),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e.into())
            }
        }
    }
}

impl ExternalSort for UnixSort {
    fn name(&self) -> &str {
        "unix"
    }

    fn stream(&self, base: &Path, plan: &SortPlan) -> Result<LineSource> {
        Ok(LineSource::from_process(self.spawn(base, plan)?))
    }
}

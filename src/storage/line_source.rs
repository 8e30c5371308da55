use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout};
use std::thread::JoinHandle;
use flate2::read::MultiGzDecoder;
use tracing::warn;
use crate::core::error::{Error, ErrorKind, Result};

/// Forward-only stream of table lines (without the trailing newline).
///
/// Dropping a source releases what backs it: the file handle, or the child
/// process, which is killed and reaped if it has not finished yet.
pub enum LineSource {
    File(FileLines),
    Process(ProcessLines),
    Memory(std::vec::IntoIter<String>),
}

impl LineSource {
    /// Stream a gzip-compressed table
    pub fn open(path: &Path) -> Result<Self> {
        Ok(LineSource::File(FileLines::open(path)?))
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        LineSource::Memory(lines.into_iter())
    }

    pub fn from_process(process: ProcessLines) -> Self {
        LineSource::Process(process)
    }
}

impl Iterator for LineSource {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LineSource::File(lines) => lines.next(),
            LineSource::Process(lines) => lines.next(),
            LineSource::Memory(lines) => lines.next().map(Ok),
        }
    }
}

pub struct FileLines {
    reader: BufReader<MultiGzDecoder<File>>,
    path: PathBuf,
    buffer: String,
}

impl FileLines {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(FileLines {
            reader: BufReader::with_capacity(64 * 1024, MultiGzDecoder::new(file)),
            path: path.to_path_buf(),
            buffer: String::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for FileLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        read_line(&mut self.reader, &mut self.buffer)
            .map_err(|e| Error::new(ErrorKind::Io, format!("{}: {}", self.path.display(), e)))
            .transpose()
    }
}

/// Stdout of a spawned sort, plus the thread feeding its stdin
pub struct ProcessLines {
    child: Child,
    stdout: BufReader<ChildStdout>,
    feeder: Option<JoinHandle<io::Result<()>>>,
    label: String,
    buffer: String,
    finished: bool,
}

impl ProcessLines {
    /// `child` must have been spawned with piped stdout and stderr
    pub fn new(mut child: Child, feeder: Option<JoinHandle<io::Result<()>>>, label: String) -> Result<Self> {
        let stdout = child.stdout.take().ok_or_else(|| {
            Error::new(ErrorKind::SortFailed, format!("{}: stdout not captured", label))
        })?;

        Ok(ProcessLines {
            child,
            stdout: BufReader::with_capacity(64 * 1024, stdout),
            feeder,
            label,
            buffer: String::new(),
            finished: false,
        })
    }

    // Stop the sort; the feeder then sees a broken pipe and exits
    fn abort(&mut self) {
        self.finished = true;
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.feeder.take() {
            let _ = handle.join();
        }
    }

    // Reap the child at end of output; a failed sort surfaces as one error item
    fn complete(&mut self) -> Result<()> {
        self.finished = true;

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = self.child.wait()?;
        let fed = self.feeder.take().map(|handle| handle.join());

        if !status.success() {
            return Err(Error::new(
                ErrorKind::SortFailed,
                format!("{} exited with {}: {}", self.label, status, stderr.trim()),
            ));
        }
        if !stderr.trim().is_empty() {
            warn!(process = %self.label, stderr = %stderr.trim(), "sort reported warnings");
        }
        match fed {
            Some(Ok(Err(e))) => Err(Error::new(
                ErrorKind::SortFailed,
                format!("{}: failed to feed input: {}", self.label, e),
            )),
            Some(Err(_)) => Err(Error::new(
                ErrorKind::SortFailed,
                format!("{}: input feeder panicked", self.label),
            )),
            _ => Ok(()),
        }
    }
}

impl Iterator for ProcessLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match read_line(&mut self.stdout, &mut self.buffer) {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => self.complete().err().map(Err),
            Err(e) => {
                self.abort();
                Some(Err(e.into()))
            }
        }
    }
}

impl Drop for ProcessLines {
    fn drop(&mut self) {
        if !self.finished {
            self.abort();
        }
    }
}

fn read_line<R: BufRead>(reader: &mut R, buffer: &mut String) -> io::Result<Option<String>> {
    buffer.clear();
    if reader.read_line(buffer)? == 0 {
        return Ok(None);
    }
    if buffer.ends_with('\n') {
        buffer.pop();
        if buffer.ends_with('\r') {
            buffer.pop();
        }
    }
    Ok(Some(buffer.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::process::{Command, Stdio};
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_gz(path: &Path, text: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn file_source_strips_newlines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t.tsv.gz");
        write_gz(&path, "a\tb\nc\td\r\nlast");

        let lines: Vec<String> = LineSource::open(&path).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["a\tb", "c\td", "last"]);
    }

    #[test]
    fn missing_file_fails_on_open() {
        let tmp = tempfile::tempdir().unwrap();
        let err = LineSource::open(&tmp.path().join("nope.tsv.gz")).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[cfg(unix)]
    #[test]
    fn process_source_reports_failed_exit() {
        let child = Command::new("sh")
            .args(["-c", "echo one; echo boom >&2; exit 3"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut source = LineSource::from_process(ProcessLines::new(child, None, "sh".into()).unwrap());

        assert_eq!(source.next().unwrap().unwrap(), "one");
        let err = source.next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::SortFailed);
        assert!(err.context.contains("boom"));
        assert!(source.next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_process_is_reaped() {
        let child = Command::new("sh")
            .args(["-c", "while true; do echo line; done"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut source = LineSource::from_process(ProcessLines::new(child, None, "yes".into()).unwrap());

        assert_eq!(source.next().unwrap().unwrap(), "line");
        drop(source); // Must not hang
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use rayon::prelude::*;
use tempfile::TempDir;
use tracing::debug;
use crate::core::error::{Error, ErrorKind, Result};
use crate::sort::compare::LineComparator;
use crate::sort::external::{writer_for, ExternalSort};
use crate::sort::spec::SortPlan;
use crate::storage::line_source::LineSource;
use crate::storage::table_writer::TableSummary;

/// In-process external merge sort for hosts without a `sort` binary.
///
/// The base table is cut into runs of `chunk_lines`; each run is sorted in
/// parallel and spilled lz4-compressed to a temp directory, then the runs
/// are k-way merged. Orders exactly like `UnixSort`.
#[derive(Debug, Clone)]
pub struct MergeSort {
    pub chunk_lines: usize,
    pub spill_dir: Option<PathBuf>,   // System temp dir when unset
}

enum Runs {
    InMemory(Vec<String>),
    Spilled { _dir: TempDir, paths: Vec<PathBuf> },
}

struct RunReader {
    reader: BufReader<FrameDecoder<File>>,
    head: Option<String>,
}

impl RunReader {
    fn open(path: &Path) -> Result<Self> {
        let mut run = RunReader {
            reader: BufReader::new(FrameDecoder::new(File::open(path)?)),
            head: None,
        };
        run.advance()?;
        Ok(run)
    }

    fn advance(&mut self) -> Result<()> {
        let mut line = String::new();
        self.head = if self.reader.read_line(&mut line)? == 0 {
            None
        } else {
            line.pop(); // Runs always end lines with '\n'
            Some(line)
        };
        Ok(())
    }
}

impl MergeSort {
    pub fn new(chunk_lines: usize) -> Self {
        MergeSort {
            chunk_lines: chunk_lines.max(1),
            spill_dir: None,
        }
    }

    pub fn with_spill_dir(mut self, dir: PathBuf) -> Self {
        self.spill_dir = Some(dir);
        self
    }

    fn sort_runs(&self, base: &Path, cmp: &LineComparator) -> Result<Runs> {
        let mut chunk: Vec<String> = Vec::new();
        let mut spill: Option<(TempDir, Vec<PathBuf>)> = None;

        for line in LineSource::open(base)? {
            chunk.push(line?);
            if chunk.len() >= self.chunk_lines {
                if spill.is_none() {
                    spill = Some((self.spill_tempdir()?, Vec::new()));
                }
                if let Some((dir, paths)) = spill.as_mut() {
                    let path = Self::spill_run(dir.path(), paths.len(), &mut chunk, cmp)?;
                    paths.push(path);
                }
            }
        }

        match spill {
            None => {
                chunk.par_sort_by(|a, b| cmp.compare(a, b));
                Ok(Runs::InMemory(chunk))
            }
            Some((dir, mut paths)) => {
                if !chunk.is_empty() {
                    let path = Self::spill_run(dir.path(), paths.len(), &mut chunk, cmp)?;
                    paths.push(path);
                }
                debug!(runs = paths.len(), base = %base.display(), "spilled sort runs");
                Ok(Runs::Spilled { _dir: dir, paths })
            }
        }
    }

    fn spill_tempdir(&self) -> Result<TempDir> {
        let dir = match &self.spill_dir {
            Some(dir) => tempfile::Builder::new().prefix("panindex-sort").tempdir_in(dir)?,
            None => tempfile::Builder::new().prefix("panindex-sort").tempdir()?,
        };
        Ok(dir)
    }

    // Sort a chunk in place, write it out and leave `chunk` empty
    fn spill_run(dir: &Path, index: usize, chunk: &mut Vec<String>, cmp: &LineComparator) -> Result<PathBuf> {
        chunk.par_sort_by(|a, b| cmp.compare(a, b));

        let path = dir.join(format!("run_{:06}.lz4", index));
        let mut encoder = FrameEncoder::new(BufWriter::new(File::create(&path)?));
        for line in chunk.drain(..) {
            encoder.write_all(line.as_bytes())?;
            encoder.write_all(b"\n")?;
        }
        let mut inner = encoder
            .finish()
            .map_err(|e| Error::new(ErrorKind::Io, format!("lz4 spill failed: {}", e)))?;
        inner.flush()?;

        Ok(path)
    }

    /// Feed every line of the sorted output to `sink`, in order
    fn merge<F>(runs: Runs, cmp: &LineComparator, mut sink: F) -> Result<()>
    where
        F: FnMut(String) -> Result<()>,
    {
        match runs {
            Runs::InMemory(lines) => lines.into_iter().try_for_each(sink),
            Runs::Spilled { _dir, paths } => {
                // _dir stays alive (and on disk) until the merge is done
                let readers = paths
                    .iter()
                    .map(|p| RunReader::open(p))
                    .collect::<Result<Vec<_>>>()?;
                Self::merge_readers(readers, cmp, &mut sink)
            }
        }
    }

    // Ties go to the lowest run index, which holds the earlier input lines
    fn merge_readers<F>(mut readers: Vec<RunReader>, cmp: &LineComparator, sink: &mut F) -> Result<()>
    where
        F: FnMut(String) -> Result<()>,
    {
        loop {
            let mut best: Option<usize> = None;
            for (i, run) in readers.iter().enumerate() {
                let Some(head) = &run.head else { continue };
                best = match best {
                    Some(b) if cmp.compare(head, readers[b].head.as_deref().unwrap_or("")).is_lt() => Some(i),
                    Some(b) => Some(b),
                    None => Some(i),
                };
            }

            let Some(i) = best else { return Ok(()) };
            if let Some(line) = readers[i].head.take() {
                sink(line)?;
            }
            readers[i].advance()?;
        }
    }
}

impl ExternalSort for MergeSort {
    fn name(&self) -> &str {
        "merge"
    }

    /// Collects the output in memory; the coordinator only streams small tables
    fn stream(&self, base: &Path, plan: &SortPlan) -> Result<LineSource> {
        let cmp = LineComparator::new(plan);
        let runs = self.sort_runs(base, &cmp)?;

        let mut lines = Vec::new();
        Self::merge(runs, &cmp, |line| {
            lines.push(line);
            Ok(())
        })?;
        Ok(LineSource::from_lines(lines))
    }

    fn persist(&self, base: &Path, plan: &SortPlan, dest: &Path) -> Result<TableSummary> {
        let cmp = LineComparator::new(plan);
        let runs = self.sort_runs(base, &cmp)?;

        let mut writer = writer_for(dest)?;
        Self::merge(runs, &cmp, |line| writer.write_line(&line))?;
        writer.finish(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rand::Rng;
    use crate::schema::schema::SortKeyType;
    use crate::sort::spec::ResolvedKey;

    fn write_base(dir: &Path, lines: &[String]) -> PathBuf {
        let path = dir.join("fp_t.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::fast());
        for line in lines {
            writeln!(encoder, "{}", line).unwrap();
        }
        encoder.finish().unwrap();
        path
    }

    fn plan(keys: &[(usize, SortKeyType, bool)]) -> SortPlan {
        SortPlan {
            keys: keys
                .iter()
                .map(|&(column, sort_type, ascending)| ResolvedKey { column, sort_type, ascending })
                .collect(),
        }
    }

    #[test]
    fn spilled_merge_matches_in_memory_sort() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rng = rand::thread_rng();
        let lines: Vec<String> = (0..1000)
            .map(|i| format!("k{}\t{}\trow{}", rng.gen_range(0..20), rng.gen_range(0..50), i))
            .collect();
        let base = write_base(tmp.path(), &lines);
        let plan = plan(&[(1, SortKeyType::Text, true), (2, SortKeyType::Numeric, false)]);

        let spilled: Vec<String> = MergeSort::new(64)
            .with_spill_dir(tmp.path().to_path_buf())
            .stream(&base, &plan)
            .unwrap()
            .map(|l| l.unwrap())
            .collect();

        let cmp = LineComparator::new(&plan);
        let mut expected = lines.clone();
        expected.sort_by(|a, b| cmp.compare(a, b));   // std sort is stable too
        assert_eq!(spilled, expected);
    }

    #[test]
    fn persist_writes_every_line_once() {
        let tmp = tempfile::tempdir().unwrap();
        let lines: Vec<String> = (0..25).map(|i| format!("{}", (i * 7) % 25)).collect();
        let base = write_base(tmp.path(), &lines);
        let dest = tmp.path().join("fp__t_1a.tsv.gz");

        let summary = MergeSort::new(4)
            .persist(&base, &plan(&[(1, SortKeyType::Numeric, true)]), &dest)
            .unwrap();
        assert_eq!(summary.line_count, 25);

        let sorted: Vec<String> = LineSource::open(&dest).unwrap().map(|l| l.unwrap()).collect();
        let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn empty_table_sorts_to_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write_base(tmp.path(), &[]);
        let mut source = MergeSort::new(8).stream(&base, &plan(&[(1, SortKeyType::Text, true)])).unwrap();
        assert!(source.next().is_none());
    }
}

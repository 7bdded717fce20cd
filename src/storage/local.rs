use super::SequenceStore;
use crate::index::{ContigRecord, SequenceIndex};
use crate::{Error, Result, types::ContigEntry};
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sequence store over a local FASTA file.
///
/// Cloning is cheap: the index and file handle are shared. All reads are
/// positioned reads, so clones can be used from any number of threads.
#[derive(Clone)]
pub struct LocalSequenceStore {
    index: Arc<SequenceIndex>,
    file: Arc<File>,
    path: PathBuf,
}

impl LocalSequenceStore {
    pub fn open(fasta_path: &Path, index: SequenceIndex) -> Result<Self> {
        let file = File::open(fasta_path)?;
        Ok(Self {
            index: Arc::new(index),
            file: Arc::new(file),
            path: fasta_path.to_path_buf(),
        })
    }

    pub fn index(&self) -> &SequenceIndex {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking read of `[begin, end)` from `contig`.
    pub fn fetch(&self, contig: &str, begin: i64, end: i64) -> Result<String> {
        let record = self.index.lookup(contig)?;
        let (begin, end) = check_range(record, begin, end)?;
        if begin == end {
            return Ok(String::new());
        }

        let first = record.byte_offset(begin);
        let last = record.byte_offset(end - 1);
        let mut raw = vec![0u8; (last - first + 1) as usize];
        read_exact_at(&self.file, &mut raw, first)?;

        let bases = strip_line_endings(record, &raw, begin, end - begin)?;
        String::from_utf8(bases)
            .map_err(|_| Error::Internal(format!("non-UTF-8 bases in {}", record.name)))
    }
}

#[async_trait]
impl SequenceStore for LocalSequenceStore {
    fn contigs(&self) -> Vec<ContigEntry> {
        self.index
            .contigs()
            .iter()
            .map(|record| ContigEntry {
                name: record.name.clone(),
                length: record.length,
            })
            .collect()
    }

    fn length(&self, contig: &str) -> Result<u64> {
        Ok(self.index.lookup(contig)?.length)
    }

    async fn read(&self, contig: &str, begin: i64, end: i64) -> Result<String> {
        let store = self.clone();
        let contig = contig.to_string();
        tokio::task::spawn_blocking(move || store.fetch(&contig, begin, end))
            .await
            .map_err(|e| Error::Internal(format!("read task failed: {}", e)))?
    }
}

fn check_range(record: &ContigRecord, begin: i64, end: i64) -> Result<(u64, u64)> {
    let out_of_range = || Error::OutOfRange {
        contig: record.name.clone(),
        begin,
        end,
        length: record.length,
    };
    if begin < 0 || begin > end {
        return Err(out_of_range());
    }
    let (begin, end) = (begin as u64, end as u64);
    if end > record.length {
        return Err(out_of_range());
    }
    Ok((begin, end))
}

/// Walk the raw byte window line by line, keeping at most `line_bases` bases
/// per line and skipping the terminator bytes in between.
fn strip_line_endings(record: &ContigRecord, raw: &[u8], begin: u64, count: u64) -> Result<Vec<u8>> {
    let count = count as usize;
    let line_bases = record.line_bases as usize;
    let skip = record.terminator_width() as usize;

    let mut bases = Vec::with_capacity(count);
    let mut pos = 0usize;
    let mut column = (begin % record.line_bases) as usize;

    while bases.len() < count {
        let take = (line_bases - column).min(count - bases.len());
        let segment = raw.get(pos..pos + take).ok_or_else(|| changed_on_disk(record))?;
        if segment.iter().any(|&b| b == b'\n' || b == b'\r' || b == b'>') {
            return Err(changed_on_disk(record));
        }
        bases.extend_from_slice(segment);
        pos += take + skip;
        column = 0;
    }

    Ok(bases)
}

fn changed_on_disk(record: &ContigRecord) -> Error {
    Error::Internal(format!(
        "sequence data for {} does not match its index; was the file modified?",
        record.name
    ))
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

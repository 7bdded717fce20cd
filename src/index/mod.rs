//! Contig index over a FASTA sequence file.
//!
//! The index maps each contig name to its length and on-disk layout so that
//! any base can be located with arithmetic alone. It is either built by
//! scanning the sequence file once ([`SequenceIndex::build`]) or loaded from
//! a persisted side-file in the samtools `.fai` layout
//! ([`SequenceIndex::load`]).
//!
//! # Side-file format
//!
//! One contig per line, tab-separated:
//! `name\tlength\toffset\tline_bases\tline_width`
//!
//! # Example
//!
//! ```no_run
//! use borzoi::index::SequenceIndex;
//! use std::path::Path;
//!
//! let fasta = Path::new("genome.fa");
//! let index = SequenceIndex::open(fasta, &SequenceIndex::default_path(fasta), false)?;
//! for record in index.contigs() {
//!     println!("{}\t{}", record.name, record.length);
//! }
//! # Ok::<(), borzoi::Error>(())
//! ```

mod build;
mod sidefile;

use crate::{Error, Result};
use noodles::fasta::fai;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Location and layout of one contig inside the sequence file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigRecord {
    pub name: String,
    /// Total number of bases.
    pub length: u64,
    /// Byte offset of the first base, just past the header line.
    pub offset: u64,
    /// Bases per full line.
    pub line_bases: u64,
    /// Bytes per full line, line terminator included.
    pub line_width: u64,
}

impl ContigRecord {
    /// Byte offset of the base at logical position `pos`.
    pub fn byte_offset(&self, pos: u64) -> u64 {
        self.offset + (pos / self.line_bases) * self.line_width + pos % self.line_bases
    }

    /// Number of line terminator bytes trailing each full line.
    pub fn terminator_width(&self) -> u64 {
        self.line_width - self.line_bases
    }

    /// Reject layouts that cannot describe a real file: more bases than bytes
    /// per line, bases without lines, or a body extending past `u64::MAX`.
    pub(crate) fn check_layout(&self) -> std::result::Result<(), String> {
        if self.line_bases > self.line_width {
            return Err(format!(
                "{}: line_bases {} exceeds line_width {}",
                self.name, self.line_bases, self.line_width
            ));
        }
        if self.length == 0 {
            return Ok(());
        }
        if self.line_bases == 0 {
            return Err(format!("{}: {} bases but zero line_bases", self.name, self.length));
        }
        (self.length / self.line_bases)
            .checked_mul(self.line_width)
            .and_then(|n| n.checked_add(self.length % self.line_bases))
            .and_then(|n| n.checked_add(self.offset))
            .map(|_| ())
            .ok_or_else(|| format!("{}: byte extent overflows at offset {}", self.name, self.offset))
    }
}

impl TryFrom<&fai::Record> for ContigRecord {
    type Error = String;

    fn try_from(record: &fai::Record) -> std::result::Result<Self, Self::Error> {
        let name = String::from_utf8(record.name().to_vec())
            .map_err(|_| "contig name is not valid UTF-8".to_string())?;
        Ok(Self {
            name,
            length: record.length(),
            offset: record.offset(),
            line_bases: record.line_bases(),
            line_width: record.line_width(),
        })
    }
}

impl From<&ContigRecord> for fai::Record {
    fn from(record: &ContigRecord) -> Self {
        fai::Record::new(
            record.name.as_str(),
            record.length,
            record.offset,
            record.line_bases,
            record.line_width,
        )
    }
}

/// Immutable name → record mapping, in the order contigs appear in the file.
#[derive(Debug, Clone, Default)]
pub struct SequenceIndex {
    records: Vec<ContigRecord>,
    by_name: HashMap<String, usize>,
}

impl SequenceIndex {
    /// Build an index from records, rejecting duplicate names.
    pub(crate) fn from_records(records: Vec<ContigRecord>) -> std::result::Result<Self, String> {
        let mut by_name = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if by_name.insert(record.name.clone(), i).is_some() {
                return Err(format!("duplicate contig name: {}", record.name));
            }
        }
        Ok(Self { records, by_name })
    }

    /// Side-file path used when none is configured: `<fasta>.fai`.
    pub fn default_path(fasta_path: &Path) -> PathBuf {
        PathBuf::from(format!("{}.fai", fasta_path.display()))
    }

    /// Scan the sequence file and build its index.
    pub fn build(fasta_path: &Path) -> Result<Self> {
        let file = fs::File::open(fasta_path)?;
        let records = build::scan(&mut std::io::BufReader::new(file))?;
        Self::from_records(records).map_err(Error::MalformedIndex)
    }

    /// Parse a persisted side-file without touching the sequence file.
    pub fn load(index_path: &Path) -> Result<Self> {
        let file = fs::File::open(index_path)?;
        sidefile::read(std::io::BufReader::new(file))
    }

    /// Persist the index to `index_path`, replacing any existing file atomically.
    pub fn persist(&self, index_path: &Path) -> Result<()> {
        let dir = match index_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        sidefile::write(tmp.as_file_mut(), &self.records)?;
        tmp.as_file().sync_all()?;
        tmp.persist(index_path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Load the side-file if it is present and fresh, otherwise build from the
    /// sequence file and persist the result.
    ///
    /// A side-file older than the sequence file (by modification time) is
    /// considered stale and rebuilt.
    pub fn open(fasta_path: &Path, index_path: &Path, force_rebuild: bool) -> Result<Self> {
        let reason = if force_rebuild {
            Some("rebuild requested")
        } else if !index_path.exists() {
            Some("no index file")
        } else if is_stale(fasta_path, index_path)? {
            tracing::warn!(
                "index {:?} is older than {:?}, rebuilding",
                index_path,
                fasta_path
            );
            Some("index is stale")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                tracing::info!("building index for {:?} ({})", fasta_path, reason);
                let index = Self::build(fasta_path)?;
                tracing::info!("indexed {} contigs", index.len());
                // A read-only reference directory only costs a rescan next time.
                match index.persist(index_path) {
                    Ok(()) => tracing::info!("wrote index {:?}", index_path),
                    Err(e) => tracing::warn!("could not write index {:?}: {}", index_path, e),
                }
                Ok(index)
            }
            None => {
                let index = Self::load(index_path)?;
                tracing::info!("loaded {} contigs from {:?}", index.len(), index_path);
                Ok(index)
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&ContigRecord> {
        self.by_name
            .get(name)
            .map(|&i| &self.records[i])
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn contigs(&self) -> &[ContigRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_stale(fasta_path: &Path, index_path: &Path) -> Result<bool> {
    let fasta_modified = fs::metadata(fasta_path)?.modified()?;
    let index_modified = fs::metadata(index_path)?.modified()?;
    Ok(index_modified < fasta_modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::{Duration, SystemTime};

    const FASTA: &str = ">chr1 first\nACGTA\nCGTAC\nGT\n>chr2\nTTTT\nGG\n";

    fn write_fasta(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("test.fa");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_byte_offset() {
        let record = ContigRecord {
            name: "chr1".to_string(),
            length: 1000,
            offset: 6,
            line_bases: 60,
            line_width: 61,
        };
        assert_eq!(record.byte_offset(0), 6);
        assert_eq!(record.byte_offset(59), 65);
        assert_eq!(record.byte_offset(60), 67);
        assert_eq!(record.byte_offset(130), 6 + 2 * 61 + 10);
        assert_eq!(record.terminator_width(), 1);
    }

    #[test]
    fn test_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let index = SequenceIndex::build(&write_fasta(dir.path(), FASTA)).unwrap();

        let chr2 = index.lookup("chr2").unwrap();
        assert_eq!(chr2.length, 6);
        assert!(matches!(index.lookup("chrX"), Err(Error::NotFound(name)) if name == "chrX"));

        let names: Vec<_> = index.contigs().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_build_persist_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(dir.path(), FASTA);
        let index_path = SequenceIndex::default_path(&fasta);

        let built = SequenceIndex::build(&fasta).unwrap();
        built.persist(&index_path).unwrap();
        let loaded = SequenceIndex::load(&index_path).unwrap();
        assert_eq!(built.contigs(), loaded.contigs());

        let rebuilt = SequenceIndex::build(&fasta).unwrap();
        assert_eq!(built.contigs(), rebuilt.contigs());
    }

    #[test]
    fn test_default_path_appends_extension() {
        assert_eq!(
            SequenceIndex::default_path(Path::new("/data/hg38.fa")),
            PathBuf::from("/data/hg38.fa.fai")
        );
    }

    #[test]
    fn test_open_builds_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(dir.path(), FASTA);
        let index_path = SequenceIndex::default_path(&fasta);
        assert!(!index_path.exists());

        let index = SequenceIndex::open(&fasta, &index_path, false).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index_path.exists());
    }

    #[test]
    fn test_open_trusts_fresh_index() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(dir.path(), FASTA);
        let index_path = SequenceIndex::default_path(&fasta);

        // A hand-written index that differs from the file proves it was loaded
        // rather than rebuilt.
        fs::write(&index_path, "only\t3\t6\t3\t4\n").unwrap();
        let future = SystemTime::now() + Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&index_path)
            .unwrap()
            .set_modified(future)
            .unwrap();

        let index = SequenceIndex::open(&fasta, &index_path, false).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.contigs()[0].name, "only");

        let rebuilt = SequenceIndex::open(&fasta, &index_path, true).unwrap();
        assert_eq!(rebuilt.len(), 2);
    }

    #[test]
    fn test_open_rebuilds_stale_index() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(dir.path(), FASTA);
        let index_path = SequenceIndex::default_path(&fasta);

        fs::write(&index_path, "only\t3\t6\t3\t4\n").unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&index_path)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let index = SequenceIndex::open(&fasta, &index_path, false).unwrap();
        assert_eq!(index.len(), 2);
        let reloaded = SequenceIndex::load(&index_path).unwrap();
        assert_eq!(reloaded.contigs(), index.contigs());
    }

    #[test]
    fn test_open_propagates_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(dir.path(), FASTA);
        let index_path = SequenceIndex::default_path(&fasta);

        fs::write(&index_path, "chr1\tnot-a-number\t6\t5\t6\n").unwrap();
        let future = SystemTime::now() + Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&index_path)
            .unwrap()
            .set_modified(future)
            .unwrap();

        let err = SequenceIndex::open(&fasta, &index_path, false).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }
}

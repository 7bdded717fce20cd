//! Random-access sequence storage.
//!
//! [`SequenceStore`] is the read interface the HTTP layer depends on.
//! [`LocalSequenceStore`] implements it over a FASTA file on local disk using
//! a [`SequenceIndex`](crate::index::SequenceIndex) to translate base
//! coordinates into byte offsets.
//!
//! # Example
//!
//! ```no_run
//! use borzoi::index::SequenceIndex;
//! use borzoi::storage::{LocalSequenceStore, SequenceStore};
//! use std::path::Path;
//!
//! # async fn run() -> borzoi::Result<()> {
//! let fasta = Path::new("genome.fa");
//! let index = SequenceIndex::build(fasta)?;
//! let store = LocalSequenceStore::open(fasta, index)?;
//! let bases = store.read("chr1", 10, 15).await?;
//! assert_eq!(bases.len(), 5);
//! # Ok(())
//! # }
//! ```

mod local;

pub use local::LocalSequenceStore;

use crate::{Result, types::ContigEntry};
use async_trait::async_trait;

/// Read-only access to the bases of indexed contigs.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Contigs with their lengths, in index order.
    fn contigs(&self) -> Vec<ContigEntry>;

    /// Length in bases of `contig`.
    fn length(&self, contig: &str) -> Result<u64>;

    /// Bases in the half-open range `[begin, end)` of `contig`.
    ///
    /// Fails with `NotFound` for an unknown contig and `OutOfRange` when
    /// `begin < 0`, `end > length` or `begin > end`.
    async fn read(&self, contig: &str, begin: i64, end: i64) -> Result<String>;
}

//! Persistence of labeled batches.

mod archive;

pub use archive::{ArchiveError, ArchivedBatch, BatchArchive};

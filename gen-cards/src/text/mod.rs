//! Text processing: normalization and chunking of study documents.

pub mod chunker;
pub mod preprocess;

pub use chunker::{DEFAULT_MAX_CHUNK_SIZE, chunk_content};
pub use preprocess::preprocess;

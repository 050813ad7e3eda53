pub mod chunk;
pub mod document;
pub mod error;
pub mod merger;
pub mod persist;
pub mod postings;
pub mod ranking;
pub mod stats;
pub mod tokenizer;

pub type TermId = u32;
pub type DocId = u32;

pub use chunk::{write_chunk, Chunk, PostingsReader};
pub use document::Document;
pub use error::{IndexError, Result};
pub use merger::{merge_all, MergeEvent};
pub use postings::PostingsData;
pub use ranking::{MemoryIndex, SearchHit, NO_RESULTS};
pub use stats::TermStats;
pub use tokenizer::{Tokenizer, Vocabulary, WordTokenizer};

//! Retrieval of relevant chunks

pub mod search;

pub use search::{to_chunk, Retriever, UNKNOWN_SOURCE};

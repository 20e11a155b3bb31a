//! AgroAssist - Hybrid-retrieval RAG assistant core
//!
//! Answers agronomy questions in Brazilian Portuguese by embedding the
//! query in two retrieval spaces (dense semantic + sparse BM25), running a
//! hybrid prefetch-and-fuse search against Qdrant, and synthesizing a
//! grounded answer through a remote generation backend, with a safety
//! disclaimer appended when the answer carries prescriptive content.
//!
//! # Architecture
//!
//! - `embedding` - query → dense + sparse embedding bundle
//! - `retrieval` - embedding bundle → fused, ranked passages
//! - `generation` + `prompt` - question + context → answer
//! - `pipeline` - the embed → retrieve → generate state machine

pub mod config;
pub mod embedding;
pub mod errors;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

// Re-export commonly used types
pub use errors::{AssistantError, Result};
pub use pipeline::{Pipeline, PipelineStage, PipelineState, StageError};

//! Pipeline stages for one document.
//!
//! Each submodule implements exactly one step, so each can be tested alone
//! and swapped (a different extractor, a caching completion client) without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ parse ──▶ normalize ──▶ xlsx
//! (path/URL) (pdfium)  (chat)  (JSON)    (fix fields)  (write)
//! ```
//!
//! 1. [`input`]     — canonicalise the path or URL to a local PDF
//! 2. [`extract`]   — concatenate the text layer of every page
//! 3. [`llm`]       — one chat-completion call with the extraction prompt;
//!    the only stage with network I/O besides URL download
//! 4. [`parse`]     — locate the JSON array of products in the reply
//! 5. [`normalize`] — deterministic per-field cleanup
//! 6. [`xlsx`]      — shape rows by the column schema and save atomically

pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod parse;
pub mod xlsx;

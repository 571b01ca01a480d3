//! Pipeline stages shared by the rendering engines.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the engines only orchestrate.
//!
//! ## Data Flow (process engine)
//!
//! ```text
//! input ──▶ invoke ──▶ collect ──▶ probe ──▶ [composite ──▶ encode]
//! (PDF)     (gs)       (files)     (size)     (as_one only)
//! ```
//!
//! 1. [`input`]     — check the `%PDF` magic; write in-memory PDFs to disk
//! 2. [`shell`]     — per-platform argument escaping and the `%04d` template
//! 3. [`invoke`]    — build and run the rasterizer command line
//! 4. [`collect`]   — list numbered page files, sorted by page number
//! 5. [`probe`]     — width/height via header parse, else full decode
//! 6. [`composite`] — stack pages on a white canvas
//! 7. [`encode`]    — write a `DynamicImage` to a rewound temp stream

pub mod collect;
pub mod composite;
pub mod encode;
pub mod input;
pub mod invoke;
pub mod probe;
pub mod shell;

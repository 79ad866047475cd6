//! CLI-boundary error taxonomy.
//!
//! The library's transpilation surface never fails (§7: a decode miss, a
//! malformed PUSH, or a dead-code skip are all absorbed into the output;
//! `wast2wasm` signals assembler failure with empty bytes rather than an
//! error). `CliError` exists purely for the binary's own file I/O and
//! argument handling, in the style of the pack's CLI crates
//! (`OffchainLabs-cargo-stylus`'s `check`/`main` crates) rather than
//! evmodin's interpreter-facing `StatusCode`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("usage: evm2wasm <evm-file> [--wast]")]
    Usage,

    #[error("assembly of the generated WAST failed (pass --wast to inspect the text)")]
    AssemblyFailed,
}

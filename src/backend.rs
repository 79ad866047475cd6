//! Binary Backend: thin wrapper over the external Wasm text assembler.
//!
//! Grounded on `fluentlabs-xyz-rwasm/bin/src/main.rs`, which turns
//! hand-assembled WAST/WAT text into a `.wasm` binary via the `wat` crate
//! rather than a hand-rolled parser.

/// Parses and validates `text` as WAST, serializing to the Wasm binary
/// format. Returns an empty byte vector on any parse or validation
/// failure, logging a diagnostic when `debug` is set — mirrors §4.7's
/// `wast2wasm(text, debug) -> bytes | ∅` contract, which has no place in
/// its signature for a `Result`.
pub fn wast_to_wasm(text: &str, debug: bool) -> Vec<u8> {
    match wat::parse_str(text) {
        Ok(bytes) => bytes,
        Err(err) => {
            if debug {
                log::error!("wast2wasm: failed to assemble module: {err}");
            } else {
                log::debug!("wast2wasm: failed to assemble module: {err}");
            }
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_text_yields_empty_bytes() {
        assert!(wast_to_wasm("(not valid wast at all", false).is_empty());
    }

    #[test]
    fn minimal_module_assembles() {
        let bytes = wast_to_wasm("(module)", false);
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"\0asm");
    }
}

//! The Jump Linker: turns the flat chunk/segment list from [`crate::builder`]
//! into the nested block/loop scaffolding that realizes EVM's arbitrary
//! indirect jumps inside Wasm's structured control flow.
//!
//! The linear prologue (`chunks[0]`) runs once, unconditionally, ahead of
//! the dispatch loop — it is not itself a jump target, so unlike the
//! numbered blocks it needs no `(block ...)` wrapper. From there, blocks
//! `$1..=$N` nest outward (`$N` is the outermost, closest to the loop;
//! `$1` is innermost, wrapping the dispatcher directly), so that branching
//! to block `$k` exits precisely through that block's close and falls into
//! `chunks[k]`.

use crate::segment::{JumpKind, Segment};

/// Builds the `(if ...)` chain comparing `$jump_dest` against every
/// recorded `JumpDest` segment's bytecode offset, back to front per
/// segment order, bottoming out at `(unreachable)`. `CbDest` segments are
/// skipped: they are reachable only via the callback `br_table`.
fn build_if_tree(segments: &[Segment]) -> String {
    let mut w = "(unreachable)".to_string();
    for seg in segments {
        if seg.kind == JumpKind::JumpDest {
            w = format!(
                "(if (i32.eq (get_local $jump_dest) (i32.const {})) (then (br ${})) (else {}))",
                seg.number, seg.index, w
            );
        }
    }
    w
}

/// Builds the full dispatcher placed inside the innermost block: gated on
/// `$cb_dest` so a host-driven resumption takes the `br_table` path and a
/// fresh jump takes the if-tree path, both wrapped in the `$init`
/// branch-once preamble so the very first fall-through into the loop
/// (before any real jump or callback has happened) lands in segment 1
/// instead of matching nothing in the if-tree and trapping (§4.5).
fn build_dispatcher(segments: &[Segment]) -> String {
    let if_tree = build_if_tree(segments);
    let dispatch = if segments.is_empty() {
        if_tree
    } else {
        // Position 0 of the br_table list is unreachable (cb_dest is
        // guaranteed nonzero on this path) and exists only to keep
        // position == segment index, since segment indices start at 1.
        let mut labels = String::from("$resume ");
        for seg in segments {
            labels.push_str(&format!("${} ", seg.index));
        }
        format!(
            "(if (i32.eqz (get_global $cb_dest)) (then {if_tree}) (else \
               (set_local $jump_dest (get_global $cb_dest)) \
               (set_global $cb_dest (i32.const 0)) \
               (block $resume (br_table {labels}$resume (get_local $jump_dest)))))"
        )
    };
    format!(
        "(block $0 (if (i32.eqz (get_global $init)) \
           (then (set_global $init (i32.const 1)) (br $0)) \
           (else {dispatch})))"
    )
}

/// Wraps `chunks`/`segments` (as produced by [`crate::builder::translate`])
/// into the complete `main` function body text, excluding the `(func ...)`
/// declaration itself (the assembler adds that along with locals/params).
pub fn link(chunks: &[String], segments: &[Segment]) -> String {
    debug_assert_eq!(chunks.len(), segments.len() + 1);

    let mut core = build_dispatcher(segments);
    for seg in segments {
        let k = seg.index;
        core = format!("(block ${} {})", k, core);
        core.push_str(&chunks[k as usize]);
    }

    format!(
        "{prologue}(block $done (loop $loop {core}))",
        prologue = chunks[0],
        core = core
    )
}

//! The Segment Builder and Snippet Emitter: scans raw EVM bytecode and
//! produces the flat list of code chunks, jump/callback targets, and the
//! set of opcode kinds actually used, ready for the [`crate::linker`].

use std::collections::BTreeSet;

use ethereum_types::U256;

use crate::catalogue;
use crate::opcode::{self, OpKind};
use crate::segment::Segment;
use crate::text::TextBuf;

/// Everything the scan produces, handed to the linker and assembler.
///
/// `chunks[0]` is the linear prologue: the code that runs once,
/// unconditionally, before the dispatch loop is ever entered. For
/// `i in 1..=segments.len()`, `chunks[i]` is the code belonging to
/// `segments[i - 1]` (reached when the dispatcher branches to block `$i`).
/// So `chunks.len() == segments.len() + 1` always.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub chunks: Vec<String>,
    pub segments: Vec<Segment>,
    pub opcodes_used: BTreeSet<OpKind>,
    pub callback_table: Vec<String>,
}

const IGNORED: [OpKind; 6] = [
    OpKind::Jump,
    OpKind::Jumpi,
    OpKind::JumpDest,
    OpKind::Pop,
    OpKind::Stop,
    OpKind::Invalid,
];

struct State {
    gas_count: u64,
    stack_delta: i32,
    stack_high: i32,
    stack_low: i32,
    jump_found: bool,
    segment_text: TextBuf,
    wast_text: String,
    chunks: Vec<String>,
    segments: Vec<Segment>,
    opcodes_used: BTreeSet<OpKind>,
    callback_table: Vec<String>,
}

impl State {
    fn new() -> Self {
        Self {
            gas_count: 0,
            stack_delta: 0,
            stack_high: 0,
            stack_low: 0,
            jump_found: false,
            segment_text: TextBuf::new(),
            wast_text: String::new(),
            chunks: Vec::new(),
            segments: Vec::new(),
            opcodes_used: BTreeSet::new(),
            callback_table: Vec::new(),
        }
    }

    fn reset_segment_counters(&mut self) {
        self.gas_count = 0;
        self.stack_delta = 0;
        self.stack_high = 0;
        self.stack_low = 0;
    }

    /// Prepends stack guards (if any) and a `useGas` call to the text
    /// accumulated since the last close, flushing it into the current
    /// chunk-in-progress. Does not start a new chunk: callers at JUMPI/GAS
    /// boundaries keep accumulating into the same chunk, only real block
    /// boundaries (JUMPDEST/CbDest/end-of-scan) call [`Self::finalize_chunk`]
    /// afterward.
    fn close_segment(&mut self) {
        if self.stack_low < 0 {
            self.segment_text.prepend(&format!(
                "(if (i32.lt_s (get_global $sp) (i32.const {})) (then (unreachable)))",
                -self.stack_low * 32 - 32
            ));
        }
        if self.stack_high > 0 {
            self.segment_text.prepend(&format!(
                "(if (i32.gt_s (get_global $sp) (i32.const {})) (then (unreachable)))",
                (1023 - self.stack_high) * 32
            ));
        }
        if !self.segment_text.is_empty() || self.gas_count > 0 {
            self.segment_text
                .prepend(&format!("(call $useGas (i64.const {}))", self.gas_count));
        }
        self.wast_text.push_str(&self.segment_text.take());
        self.reset_segment_counters();
    }

    fn finalize_chunk(&mut self) {
        self.chunks.push(std::mem::take(&mut self.wast_text));
    }

    fn callback_index(&mut self, name: &str) -> usize {
        if let Some(pos) = self.callback_table.iter().position(|n| n == name) {
            pos
        } else {
            self.callback_table.push(name.to_string());
            self.callback_table.len() - 1
        }
    }
}

/// Scans forward from `pc`, treating PUSH immediates as data rather than
/// opcodes, and returns the offset of the next `JUMPDEST` byte (0x5b) or
/// `code.len()` if none remains. Mirrors the PUSH-skipping scan
/// `AnalyzedCode::analyze` uses to build its jumpdest map.
fn skip_to_next_jumpdest(code: &[u8], mut pc: usize) -> usize {
    while pc < code.len() {
        let byte = code[pc];
        if byte == 0x5b {
            return pc;
        }
        if (0x60..=0x7f).contains(&byte) {
            pc += 1 + (byte - 0x5f) as usize;
        } else {
            pc += 1;
        }
    }
    code.len()
}

/// Reads up to 32 big-endian bytes starting at `code[pc + 1]`, zero-padding
/// on the left (both for immediates shorter than 32 bytes, and for
/// truncated PUSH data running past the end of code), then splits into
/// four little-endian 64-bit lanes, lane 0 least significant.
fn push_lanes(code: &[u8], pc: usize, n: usize) -> [u64; 4] {
    let mut padded = [0u8; 32];
    let start = 32 - n;
    for i in 0..n {
        if let Some(&b) = code.get(pc + 1 + i) {
            padded[start + i] = b;
        }
    }
    // `U256`'s internal limbs are little-endian 64-bit words, lane 0 least
    // significant - exactly the lane order the generated `$PUSH` call wants.
    U256::from_big_endian(&padded).0
}

/// Scans `code` and produces the flat chunk/segment list the linker and
/// assembler need. `stack_trace` emits a `$stackTrace` debug call after
/// every opcode; `async_api` enables the callback-suspend protocol for
/// host-touching opcodes.
pub fn translate(code: &[u8], stack_trace: bool, async_api: bool) -> BuildOutput {
    let mut st = State::new();
    let mut pc = 0usize;

    while pc < code.len() {
        let byte = code[pc];
        let d = opcode::decode(byte);

        if d.kind == OpKind::JumpDest {
            st.close_segment();
            st.finalize_chunk();
            let index = st.segments.len() as u32 + 1;
            st.segments.push(Segment::jump_dest(index, pc as u64));
            st.gas_count = 1;
            pc += 1;
            continue;
        }

        st.gas_count += d.fee as u64;
        st.stack_delta += d.pushes as i32;
        st.stack_high = st.stack_high.max(st.stack_delta);
        st.stack_delta -= d.pops as i32;
        st.stack_low = st.stack_low.min(st.stack_delta);

        if !IGNORED.contains(&d.kind) {
            st.opcodes_used.insert(d.kind);
        }

        let mut advance = 1usize;
        let mut terminates = false;

        match d.kind {
            OpKind::Jump => {
                st.segment_text
                    .append("(call $check_overflow (get_global $sp))(set_local $jump_dest)(br $loop)");
                st.jump_found = true;
            }
            OpKind::Jumpi => {
                st.segment_text.append(
                    "(call $check_overflow (get_global $sp))(set_local $jump_dest)(br_if $loop)",
                );
                st.jump_found = true;
            }
            OpKind::Stop => {
                st.segment_text.append("(br $done)");
                terminates = true;
            }
            OpKind::Return | OpKind::SelfDestruct => {
                let name = catalogue::function_name(d.kind).unwrap_or("$OP");
                st.segment_text.append(&format!("(call {})(br $done)", name));
                terminates = true;
            }
            OpKind::Invalid => {
                st.segment_text.take();
                st.segment_text.append("(unreachable)");
                terminates = true;
            }
            OpKind::Pop => {}
            OpKind::Push => {
                let n = d.number as usize;
                let lanes = push_lanes(code, pc, n);
                st.segment_text.append(&format!(
                    "(call $PUSH (i64.const {}) (i64.const {}) (i64.const {}) (i64.const {}))",
                    lanes[0], lanes[1], lanes[2], lanes[3]
                ));
                advance = 1 + n;
            }
            OpKind::Dup | OpKind::Swap => {
                let name = catalogue::function_name(d.kind).unwrap_or("$OP");
                st.segment_text
                    .append(&format!("(call {} (i32.const {}))", name, d.number - 1));
            }
            OpKind::Pc => {
                st.segment_text.append(&format!("(call $PC (i32.const {}))", pc));
            }
            OpKind::Gas => {
                st.segment_text.append("(call $GAS)");
            }
            OpKind::Log => {
                st.segment_text.append(&format!("(call $LOG (i32.const {}))", d.number));
            }
            _ => {
                if let Some(name) = catalogue::function_name(d.kind) {
                    if catalogue::is_async_capable(d.kind) {
                        // These snippets all declare `(param $cb i32)`: a
                        // real callback-table index when suspension is
                        // live, or -1 (the same "nothing here" sentinel
                        // `$jump_dest` starts at) when it isn't.
                        let index: i64 = if async_api {
                            st.callback_index(name) as i64
                        } else {
                            -1
                        };
                        st.segment_text
                            .append(&format!("(call {} (i32.const {}))", name, index));
                    } else {
                        st.segment_text.append(&format!("(call {})", name));
                    }
                }
            }
        }

        let net = d.pushes as i32 - d.pops as i32;
        if net != 0 {
            st.segment_text.append(&format!(
                "(set_global $sp (i32.add (get_global $sp) (i32.const {})))",
                net * 32
            ));
        }

        if stack_trace {
            st.segment_text.append(&format!(
                "(call $stackTrace (i32.const {}) (i32.const {}) (i64.const {}) (get_global $sp))",
                pc, byte, st.gas_count
            ));
        }

        if matches!(d.kind, OpKind::Gas | OpKind::Jumpi) {
            st.close_segment();
        }

        if async_api && catalogue::is_async_capable(d.kind) {
            let cb_index = st.segments.len() as u32 + 1;
            st.segment_text
                .append(&format!("(set_global $cb_dest (i32.const {}))(br $done)", cb_index));
            st.close_segment();
            st.finalize_chunk();
            st.segments.push(Segment::cb_dest(cb_index));
        }

        if terminates {
            if st.jump_found {
                pc = skip_to_next_jumpdest(code, pc + advance);
            } else {
                break;
            }
        } else {
            pc += advance;
        }
    }

    st.close_segment();
    st.finalize_chunk();

    BuildOutput {
        chunks: st.chunks,
        segments: st.segments,
        opcodes_used: st.opcodes_used,
        callback_table: st.callback_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytecode_emits_no_usegas() {
        let out = translate(&[], false, false);
        assert_eq!(out.chunks, vec!["".to_string()]);
        assert!(out.segments.is_empty());
    }

    #[test]
    fn single_stop_emits_usegas_zero_then_br_done() {
        let out = translate(&[0x00], false, false);
        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0], "(call $useGas (i64.const 0))(br $done)");
        assert!(out.opcodes_used.is_empty());
    }

    #[test]
    fn push1_then_stop() {
        let out = translate(&[0x60, 0x42, 0x00], false, false);
        assert_eq!(out.chunks.len(), 1);
        assert!(out.chunks[0].contains("(call $PUSH (i64.const 66)"));
        assert!(out.chunks[0].contains("(i32.const 32)"));
        assert!(out.chunks[0].ends_with("(br $done)"));
        assert!(out.opcodes_used.contains(&OpKind::Push));
    }

    #[test]
    fn add_of_two_literals() {
        let code = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];
        let out = translate(&code, false, false);
        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0].matches("$PUSH").count(), 2);
        assert!(out.chunks[0].contains("$ADD"));
        assert!(out.chunks[0].contains("(call $useGas (i64.const 9))"));
        assert!(out.opcodes_used.contains(&OpKind::Push));
        assert!(out.opcodes_used.contains(&OpKind::Add));
    }

    #[test]
    fn jumpdest_then_push_then_jump() {
        let code = [0x5b, 0x60, 0x00, 0x56];
        let out = translate(&code, false, false);
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].number, 0);
        assert_eq!(out.chunks.len(), 2);
        assert_eq!(out.chunks[0], "");
        // gas_count resets to 1 for JUMPDEST's own fee, then accrues
        // PUSH1 (3) and JUMP (8) before the final close.
        assert!(out.chunks[1].contains("(call $useGas (i64.const 12))"));
        assert!(out.chunks[1].contains("$check_overflow"));
    }

    #[test]
    fn jumpdest_inside_push_payload_is_not_a_target() {
        let code = [0x61, 0x5b, 0x00, 0x00];
        let out = translate(&code, false, false);
        assert!(out.segments.is_empty());
    }
}

//! The opcode runtime catalogue: hand-written WAST snippets for every
//! opcode kind the builder can emit a call to, their import declarations,
//! and the dependency graph between them.
//!
//! Spec treats this catalogue as an opaque, externally supplied table (the
//! EVM semantics themselves are "out of scope": see §1). The snippets below
//! are modeled on the arithmetic reduced in
//! `vorot93-evmodin/src/instructions/{arithmetic,bitwise,boolean}.rs`,
//! re-expressed as the WAST the generated module would import rather than
//! Rust the translator would execute.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::opcode::OpKind;

/// One catalogue entry: a top-level `(func ...)` declaration plus whatever
/// `(import ...)` lines it needs from the host.
#[derive(Clone, Copy, Debug)]
pub struct Snippet {
    pub function_name: &'static str,
    pub wast: &'static str,
    pub imports: &'static str,
}

macro_rules! snippet {
    ($name:expr, $wast:expr) => {
        Snippet {
            function_name: $name,
            wast: $wast,
            imports: "",
        }
    };
    ($name:expr, $wast:expr, $imports:expr) => {
        Snippet {
            function_name: $name,
            wast: $wast,
            imports: $imports,
        }
    };
}

static CATALOGUE: Lazy<BTreeMap<OpKind, Snippet>> = Lazy::new(|| {
    let mut m = BTreeMap::new();

    // Loads the top-of-stack word's low 32 bits from the stack region at
    // `$sp` after bounds-checking it, per the stack layout in §3/§6: `$sp`
    // is the byte offset of the top element, and a 256-bit word's least
    // significant lane sits at its own address (little-endian lane order).
    // JUMP/JUMPI are the callers that care about the loaded value (the
    // jump destination, which always fits in i32); other callers only
    // want the bounds check and drop the result.
    m.insert(
        OpKind::CheckOverflow,
        snippet!(
            "$check_overflow",
            "(func $check_overflow (param $sp i32) (result i32)\n  (if (i32.lt_s (get_local $sp) (i32.const 0))\n    (then (unreachable)))\n  (i32.load (get_local $sp)))"
        ),
    );
    m.insert(
        OpKind::Add256,
        snippet!("$add_256", "(func $add_256)"),
    );
    m.insert(
        OpKind::Sub256,
        snippet!("$sub_256", "(func $sub_256)"),
    );
    m.insert(
        OpKind::Mul256,
        snippet!(
            "$mul_256",
            "(func $mul_256\n  (drop (call $check_overflow (get_global $sp))))"
        ),
    );
    m.insert(
        OpKind::MemUsage,
        snippet!("$mem_usage", "(func $mem_usage)"),
    );
    m.insert(
        OpKind::Bswap,
        snippet!("$bswap", "(func $bswap)"),
    );

    m.insert(
        OpKind::Add,
        snippet!("$ADD", "(func $ADD\n  (call $add_256))"),
    );
    m.insert(
        OpKind::Mul,
        snippet!("$MUL", "(func $MUL\n  (call $mul_256))"),
    );
    m.insert(
        OpKind::Sub,
        snippet!("$SUB", "(func $SUB\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::Div,
        snippet!("$DIV", "(func $DIV\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::SDiv,
        snippet!("$SDIV", "(func $SDIV\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::Mod,
        snippet!("$MOD", "(func $MOD\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::SMod,
        snippet!("$SMOD", "(func $SMOD\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::AddMod,
        snippet!("$ADDMOD", "(func $ADDMOD\n  (call $add_256))"),
    );
    m.insert(
        OpKind::MulMod,
        snippet!("$MULMOD", "(func $MULMOD\n  (call $mul_256))"),
    );
    m.insert(
        OpKind::Exp,
        snippet!("$EXP", "(func $EXP\n  (call $mul_256))"),
    );
    m.insert(
        OpKind::SignExtend,
        snippet!("$SIGNEXTEND", "(func $SIGNEXTEND\n  (call $bswap))"),
    );

    m.insert(OpKind::Lt, snippet!("$LT", "(func $LT\n  (call $sub_256))"));
    m.insert(OpKind::Gt, snippet!("$GT", "(func $GT\n  (call $sub_256))"));
    m.insert(
        OpKind::SLt,
        snippet!("$SLT", "(func $SLT\n  (call $sub_256))"),
    );
    m.insert(
        OpKind::SGt,
        snippet!("$SGT", "(func $SGT\n  (call $sub_256))"),
    );
    m.insert(OpKind::Eq, snippet!("$EQ", "(func $EQ\n  (call $sub_256))"));
    m.insert(OpKind::IsZero, snippet!("$ISZERO", "(func $ISZERO)"));
    m.insert(OpKind::And, snippet!("$AND", "(func $AND)"));
    m.insert(OpKind::Or, snippet!("$OR", "(func $OR)"));
    m.insert(OpKind::Xor, snippet!("$XOR", "(func $XOR)"));
    m.insert(OpKind::Not, snippet!("$NOT", "(func $NOT)"));
    m.insert(OpKind::Byte, snippet!("$BYTE", "(func $BYTE)"));
    m.insert(
        OpKind::Shl,
        snippet!("$SHL", "(func $SHL\n  (call $bswap))"),
    );
    m.insert(
        OpKind::Shr,
        snippet!("$SHR", "(func $SHR\n  (call $bswap))"),
    );
    m.insert(
        OpKind::Sar,
        snippet!("$SAR", "(func $SAR\n  (call $bswap))"),
    );

    m.insert(
        OpKind::Keccak256,
        snippet!(
            "$KECCAK256",
            "(func $KECCAK256\n  (call $mem_usage))",
            "(import \"ethereum\" \"keccak256\" (func $keccak256_host (param i32 i32 i32)))"
        ),
    );

    m.insert(OpKind::Address, snippet!("$ADDRESS", "(func $ADDRESS)"));
    m.insert(
        OpKind::Balance,
        snippet!(
            "$BALANCE",
            "(func $BALANCE (param $cb i32))",
            "(import \"ethereum\" \"getBalance\" (func $getBalance (param i32 i32)))"
        ),
    );
    m.insert(OpKind::Origin, snippet!("$ORIGIN", "(func $ORIGIN)"));
    m.insert(OpKind::Caller, snippet!("$CALLER", "(func $CALLER)"));
    m.insert(OpKind::CallValue, snippet!("$CALLVALUE", "(func $CALLVALUE)"));
    m.insert(
        OpKind::CallDataLoad,
        snippet!("$CALLDATALOAD", "(func $CALLDATALOAD)"),
    );
    m.insert(
        OpKind::CallDataSize,
        snippet!("$CALLDATASIZE", "(func $CALLDATASIZE)"),
    );
    m.insert(
        OpKind::CallDataCopy,
        snippet!("$CALLDATACOPY", "(func $CALLDATACOPY\n  (call $mem_usage))"),
    );
    m.insert(OpKind::CodeSize, snippet!("$CODESIZE", "(func $CODESIZE)"));
    m.insert(
        OpKind::CodeCopy,
        snippet!("$CODECOPY", "(func $CODECOPY\n  (call $mem_usage))"),
    );
    m.insert(OpKind::GasPrice, snippet!("$GASPRICE", "(func $GASPRICE)"));
    m.insert(
        OpKind::ExtCodeSize,
        snippet!(
            "$EXTCODESIZE",
            "(func $EXTCODESIZE (param $cb i32))",
            "(import \"ethereum\" \"getExternalCodeSize\" (func $getExternalCodeSize (param i32 i32)))"
        ),
    );
    m.insert(
        OpKind::ExtCodeCopy,
        snippet!(
            "$EXTCODECOPY",
            "(func $EXTCODECOPY (param $cb i32)\n  (call $mem_usage))",
            "(import \"ethereum\" \"externalCodeCopy\" (func $externalCodeCopy (param i32 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::ReturnDataSize,
        snippet!("$RETURNDATASIZE", "(func $RETURNDATASIZE)"),
    );
    m.insert(
        OpKind::ReturnDataCopy,
        snippet!("$RETURNDATACOPY", "(func $RETURNDATACOPY\n  (call $mem_usage))"),
    );
    m.insert(
        OpKind::ExtCodeHash,
        snippet!(
            "$EXTCODEHASH",
            "(func $EXTCODEHASH (param $cb i32))",
            "(import \"ethereum\" \"getExternalCodeHash\" (func $getExternalCodeHash (param i32 i32)))"
        ),
    );

    m.insert(
        OpKind::BlockHash,
        snippet!(
            "$BLOCKHASH",
            "(func $BLOCKHASH (param $cb i32))",
            "(import \"ethereum\" \"getBlockHash\" (func $getBlockHash (param i64 i32)))"
        ),
    );
    m.insert(
        OpKind::Coinbase,
        snippet!(
            "$COINBASE",
            "(func $COINBASE (param $cb i32))",
            "(import \"ethereum\" \"getTxContext\" (func $getTxContext (param i32)))"
        ),
    );
    m.insert(
        OpKind::Timestamp,
        snippet!(
            "$TIMESTAMP",
            "(func $TIMESTAMP (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::Number,
        snippet!(
            "$NUMBER",
            "(func $NUMBER (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::Difficulty,
        snippet!(
            "$DIFFICULTY",
            "(func $DIFFICULTY (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::GasLimit,
        snippet!(
            "$GASLIMIT",
            "(func $GASLIMIT (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::ChainId,
        snippet!(
            "$CHAINID",
            "(func $CHAINID (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::SelfBalance,
        snippet!(
            "$SELFBALANCE",
            "(func $SELFBALANCE (param $cb i32)\n  (call $BALANCE (get_local $cb)))"
        ),
    );
    m.insert(
        OpKind::BaseFee,
        snippet!(
            "$BASEFEE",
            "(func $BASEFEE (param $cb i32)\n  (call $COINBASE (get_local $cb)))"
        ),
    );

    m.insert(OpKind::MLoad, snippet!("$MLOAD", "(func $MLOAD\n  (call $mem_usage))"));
    m.insert(OpKind::MStore, snippet!("$MSTORE", "(func $MSTORE\n  (call $mem_usage))"));
    m.insert(OpKind::MStore8, snippet!("$MSTORE8", "(func $MSTORE8\n  (call $mem_usage))"));
    m.insert(
        OpKind::SLoad,
        snippet!(
            "$SLOAD",
            "(func $SLOAD (param $cb i32))",
            "(import \"ethereum\" \"storageLoad\" (func $storageLoad (param i32 i32)))"
        ),
    );
    m.insert(
        OpKind::SStore,
        snippet!(
            "$SSTORE",
            "(func $SSTORE (param $cb i32))",
            "(import \"ethereum\" \"storageStore\" (func $storageStore (param i32 i32)))"
        ),
    );
    m.insert(OpKind::Pc, snippet!("$PC", "(func $PC (param $pc i32))"));
    m.insert(OpKind::MSize, snippet!("$MSIZE", "(func $MSIZE)"));
    m.insert(OpKind::Gas, snippet!("$GAS", "(func $GAS)"));

    m.insert(
        OpKind::Push,
        snippet!(
            "$PUSH",
            "(func $PUSH (param $l0 i64) (param $l1 i64) (param $l2 i64) (param $l3 i64))"
        ),
    );
    m.insert(OpKind::Dup, snippet!("$DUPN", "(func $DUPN (param $n i32))"));
    m.insert(OpKind::Swap, snippet!("$SWAPN", "(func $SWAPN (param $n i32))"));
    m.insert(
        OpKind::Log,
        snippet!(
            "$LOG",
            "(func $LOG (param $n i32)\n  (call $mem_usage))",
            "(import \"ethereum\" \"log\" (func $log_host (param i32 i32 i32 i32 i32 i32 i32)))"
        ),
    );

    m.insert(
        OpKind::Create,
        snippet!(
            "$CREATE",
            "(func $CREATE (param $cb i32)\n  (call $mem_usage))",
            "(import \"ethereum\" \"create\" (func $create_host (param i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::Call,
        snippet!(
            "$CALL",
            "(func $CALL (param $cb i32)\n  (call $mem_usage))",
            "(import \"ethereum\" \"call\" (func $call_host (param i64 i32 i32 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::CallCode,
        snippet!(
            "$CALLCODE",
            "(func $CALLCODE (param $cb i32)\n  (call $CALL (get_local $cb)))",
            "(import \"ethereum\" \"callCode\" (func $callCode_host (param i64 i32 i32 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::Return,
        snippet!("$RETURN", "(func $RETURN\n  (call $mem_usage))"),
    );
    m.insert(
        OpKind::DelegateCall,
        snippet!(
            "$DELEGATECALL",
            "(func $DELEGATECALL (param $cb i32)\n  (call $CALL (get_local $cb)))",
            "(import \"ethereum\" \"callDelegate\" (func $callDelegate_host (param i64 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::Create2,
        snippet!(
            "$CREATE2",
            "(func $CREATE2 (param $cb i32)\n  (call $CREATE (get_local $cb)))",
            "(import \"ethereum\" \"create2\" (func $create2_host (param i32 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::StaticCall,
        snippet!(
            "$STATICCALL",
            "(func $STATICCALL (param $cb i32)\n  (call $CALL (get_local $cb)))",
            "(import \"ethereum\" \"callStatic\" (func $callStatic_host (param i64 i32 i32 i32 i32)))"
        ),
    );
    m.insert(
        OpKind::Revert,
        snippet!("$REVERT", "(func $REVERT\n  (call $mem_usage))"),
    );
    m.insert(
        OpKind::SelfDestruct,
        snippet!(
            "$SELFDESTRUCT",
            "(func $SELFDESTRUCT)",
            "(import \"ethereum\" \"selfDestruct\" (func $selfDestruct_host (param i32)))"
        ),
    );

    m
});

/// `kind -> {kind}`: transitive runtime dependencies between snippets, e.g.
/// `MUL` uses `mul_256`, which uses `check_overflow`.
static DEPS: Lazy<BTreeMap<OpKind, &'static [OpKind]>> = Lazy::new(|| {
    let mut m: BTreeMap<OpKind, &'static [OpKind]> = BTreeMap::new();
    m.insert(OpKind::Mul256, &[OpKind::CheckOverflow]);
    m.insert(OpKind::Add, &[OpKind::Add256]);
    m.insert(OpKind::Sub, &[OpKind::Sub256]);
    m.insert(OpKind::Div, &[OpKind::Sub256]);
    m.insert(OpKind::SDiv, &[OpKind::Sub256]);
    m.insert(OpKind::Mod, &[OpKind::Sub256]);
    m.insert(OpKind::SMod, &[OpKind::Sub256]);
    m.insert(OpKind::AddMod, &[OpKind::Add256]);
    m.insert(OpKind::MulMod, &[OpKind::Mul256]);
    m.insert(OpKind::Mul, &[OpKind::Mul256]);
    m.insert(OpKind::Exp, &[OpKind::Mul256]);
    m.insert(OpKind::SignExtend, &[OpKind::Bswap]);
    m.insert(OpKind::Lt, &[OpKind::Sub256]);
    m.insert(OpKind::Gt, &[OpKind::Sub256]);
    m.insert(OpKind::SLt, &[OpKind::Sub256]);
    m.insert(OpKind::SGt, &[OpKind::Sub256]);
    m.insert(OpKind::Eq, &[OpKind::Sub256]);
    m.insert(OpKind::Shl, &[OpKind::Bswap]);
    m.insert(OpKind::Shr, &[OpKind::Bswap]);
    m.insert(OpKind::Sar, &[OpKind::Bswap]);
    m.insert(OpKind::Keccak256, &[OpKind::MemUsage]);
    m.insert(OpKind::CallDataCopy, &[OpKind::MemUsage]);
    m.insert(OpKind::CodeCopy, &[OpKind::MemUsage]);
    m.insert(OpKind::ExtCodeCopy, &[OpKind::MemUsage]);
    m.insert(OpKind::ReturnDataCopy, &[OpKind::MemUsage]);
    m.insert(OpKind::MLoad, &[OpKind::MemUsage]);
    m.insert(OpKind::MStore, &[OpKind::MemUsage]);
    m.insert(OpKind::MStore8, &[OpKind::MemUsage]);
    m.insert(OpKind::Log, &[OpKind::MemUsage]);
    m.insert(OpKind::Create, &[OpKind::MemUsage]);
    m.insert(OpKind::Call, &[OpKind::MemUsage]);
    m.insert(OpKind::CallCode, &[OpKind::Call]);
    m.insert(OpKind::Return, &[OpKind::MemUsage]);
    m.insert(OpKind::Revert, &[OpKind::MemUsage]);
    m.insert(OpKind::DelegateCall, &[OpKind::Call]);
    m.insert(OpKind::Create2, &[OpKind::Create]);
    m.insert(OpKind::StaticCall, &[OpKind::Call]);
    m.insert(OpKind::Timestamp, &[OpKind::Coinbase]);
    m.insert(OpKind::Number, &[OpKind::Coinbase]);
    m.insert(OpKind::Difficulty, &[OpKind::Coinbase]);
    m.insert(OpKind::GasLimit, &[OpKind::Coinbase]);
    m.insert(OpKind::ChainId, &[OpKind::Coinbase]);
    m.insert(OpKind::BaseFee, &[OpKind::Coinbase]);
    m.insert(OpKind::SelfBalance, &[OpKind::Balance]);
    m
});

pub fn snippet(kind: OpKind) -> Option<&'static Snippet> {
    CATALOGUE.get(&kind)
}

/// Function name to use in a `(call ...)` site for a given opcode kind.
pub fn function_name(kind: OpKind) -> Option<&'static str> {
    CATALOGUE.get(&kind).map(|s| s.function_name)
}

/// Opcode kinds whose catalogue snippet suspends the generated module and
/// waits for a host-driven callback resumption, grounded on which opcodes
/// in evmodin's `interpreter_producer` route through a yield macro
/// (`balance!`, `sload!`, `sstore!`, and `do_log!` at
/// `vorot93-evmodin/src/instructions/external.rs:194`, which yields
/// `Interrupt::EmitLog` the same way the host-touching opcodes below do)
/// rather than pure local-state math.
pub fn is_async_capable(kind: OpKind) -> bool {
    matches!(
        kind,
        OpKind::Balance
            | OpKind::ExtCodeSize
            | OpKind::ExtCodeCopy
            | OpKind::ExtCodeHash
            | OpKind::BlockHash
            | OpKind::Coinbase
            | OpKind::Timestamp
            | OpKind::Number
            | OpKind::Difficulty
            | OpKind::GasLimit
            | OpKind::ChainId
            | OpKind::BaseFee
            | OpKind::SelfBalance
            | OpKind::SLoad
            | OpKind::SStore
            | OpKind::Create
            | OpKind::Call
            | OpKind::CallCode
            | OpKind::DelegateCall
            | OpKind::Create2
            | OpKind::StaticCall
            | OpKind::Log
    )
}

/// Computes the dependency closure of `used` over [`DEPS`], stable under
/// insertion order: a kind appears once, immediately after the first kind
/// that required it, and never before something it requires.
pub fn dependency_closure(used: &[OpKind]) -> Vec<OpKind> {
    let mut seen = std::collections::BTreeSet::new();
    let mut order = Vec::new();

    fn visit(
        kind: OpKind,
        seen: &mut std::collections::BTreeSet<OpKind>,
        order: &mut Vec<OpKind>,
    ) {
        if !seen.insert(kind) {
            return;
        }
        if let Some(deps) = DEPS.get(&kind) {
            for &dep in *deps {
                visit(dep, seen, order);
            }
        }
        order.push(kind);
    }

    for &kind in used {
        visit(kind, &mut seen, &mut order);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_includes_transitive_deps() {
        let closure = dependency_closure(&[OpKind::Mul]);
        assert!(closure.contains(&OpKind::Mul));
        assert!(closure.contains(&OpKind::Mul256));
        assert!(closure.contains(&OpKind::CheckOverflow));
        // check_overflow has no deps of its own, so it must come first.
        let co = closure.iter().position(|k| *k == OpKind::CheckOverflow).unwrap();
        let mul256 = closure.iter().position(|k| *k == OpKind::Mul256).unwrap();
        let mul = closure.iter().position(|k| *k == OpKind::Mul).unwrap();
        assert!(co < mul256);
        assert!(mul256 < mul);
    }

    #[test]
    fn closure_is_idempotent() {
        let once = dependency_closure(&[OpKind::Add, OpKind::Mul]);
        let twice = dependency_closure(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn every_non_ignored_kind_has_a_snippet() {
        for kind in [
            OpKind::Add,
            OpKind::Mul,
            OpKind::Push,
            OpKind::Dup,
            OpKind::Swap,
            OpKind::Log,
            OpKind::Gas,
            OpKind::Pc,
            OpKind::SelfDestruct,
        ] {
            assert!(snippet(kind).is_some(), "{:?} missing from catalogue", kind);
        }
    }
}

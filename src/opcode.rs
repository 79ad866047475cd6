//! EVM opcode table and decoder.
//!
//! Mirrors the construction style of an interpreter's instruction-properties
//! table (one explicit assignment per opcode byte, collected into a static
//! array), but collapses the PUSH/DUP/SWAP/LOG opcode families into a single
//! variant each plus a numeric parameter, and folds gas fee, stack effect and
//! opcode kind into one `Descriptor` rather than keeping separate tables.

use once_cell::sync::Lazy;

/// Discriminates every EVM opcode the translator understands, plus the
/// variadic family representatives, an `Invalid` sentinel for undefined
/// bytes, and the internal runtime-only kinds used purely as dependency keys
/// into the [`crate::catalogue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum OpKind {
    Stop,
    Add,
    Mul,
    Sub,
    Div,
    SDiv,
    Mod,
    SMod,
    AddMod,
    MulMod,
    Exp,
    SignExtend,
    Lt,
    Gt,
    SLt,
    SGt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Byte,
    Shl,
    Shr,
    Sar,
    Keccak256,
    Address,
    Balance,
    Origin,
    Caller,
    CallValue,
    CallDataLoad,
    CallDataSize,
    CallDataCopy,
    CodeSize,
    CodeCopy,
    GasPrice,
    ExtCodeSize,
    ExtCodeCopy,
    ReturnDataSize,
    ReturnDataCopy,
    ExtCodeHash,
    BlockHash,
    Coinbase,
    Timestamp,
    Number,
    Difficulty,
    GasLimit,
    ChainId,
    SelfBalance,
    BaseFee,
    Pop,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    Jump,
    Jumpi,
    Pc,
    MSize,
    Gas,
    JumpDest,
    /// PUSH1..PUSH32. `number` carries the immediate byte count (1..=32).
    Push,
    /// DUP1..DUP16. `number` carries the stack depth (1..=16).
    Dup,
    /// SWAP1..SWAP16. `number` carries the stack depth (1..=16).
    Swap,
    /// LOG0..LOG4. `number` carries the topic count (0..=4).
    Log,
    Create,
    Call,
    CallCode,
    Return,
    DelegateCall,
    Create2,
    StaticCall,
    Revert,
    Invalid,
    SelfDestruct,

    // Internal runtime-only dependency keys. These never appear as the
    // `kind` of a decoded byte; they exist solely so the opcode runtime
    // catalogue can express its dependency graph (e.g. `Mul` depends on
    // `Mul256`, which depends on `CheckOverflow`).
    CheckOverflow,
    Add256,
    Sub256,
    Mul256,
    MemUsage,
    Bswap,
}

/// Static properties of one EVM opcode byte.
#[derive(Clone, Copy, Debug)]
pub struct Descriptor {
    pub kind: OpKind,
    pub fee: u32,
    pub pops: u8,
    pub pushes: u8,
    /// Family index: LOG topic count, PUSH byte count, DUP/SWAP depth.
    /// Unused (0) for fixed-arity opcodes.
    pub number: u8,
}

impl Descriptor {
    const fn new(kind: OpKind, fee: u32, pops: u8, pushes: u8) -> Self {
        Self {
            kind,
            fee,
            pops,
            pushes,
            number: 0,
        }
    }

    const INVALID: Self = Self::new(OpKind::Invalid, 0, 0, 0);
}

static OPCODE_TABLE: Lazy<[Descriptor; 256]> = Lazy::new(|| {
    let mut t = [Descriptor::INVALID; 256];

    t[0x00] = Descriptor::new(OpKind::Stop, 0, 0, 0);
    t[0x01] = Descriptor::new(OpKind::Add, 3, 2, 1);
    t[0x02] = Descriptor::new(OpKind::Mul, 5, 2, 1);
    t[0x03] = Descriptor::new(OpKind::Sub, 3, 2, 1);
    t[0x04] = Descriptor::new(OpKind::Div, 5, 2, 1);
    t[0x05] = Descriptor::new(OpKind::SDiv, 5, 2, 1);
    t[0x06] = Descriptor::new(OpKind::Mod, 5, 2, 1);
    t[0x07] = Descriptor::new(OpKind::SMod, 5, 2, 1);
    t[0x08] = Descriptor::new(OpKind::AddMod, 8, 3, 1);
    t[0x09] = Descriptor::new(OpKind::MulMod, 8, 3, 1);
    t[0x0a] = Descriptor::new(OpKind::Exp, 10, 2, 1);
    t[0x0b] = Descriptor::new(OpKind::SignExtend, 5, 2, 1);

    t[0x10] = Descriptor::new(OpKind::Lt, 3, 2, 1);
    t[0x11] = Descriptor::new(OpKind::Gt, 3, 2, 1);
    t[0x12] = Descriptor::new(OpKind::SLt, 3, 2, 1);
    t[0x13] = Descriptor::new(OpKind::SGt, 3, 2, 1);
    t[0x14] = Descriptor::new(OpKind::Eq, 3, 2, 1);
    t[0x15] = Descriptor::new(OpKind::IsZero, 3, 1, 1);
    t[0x16] = Descriptor::new(OpKind::And, 3, 2, 1);
    t[0x17] = Descriptor::new(OpKind::Or, 3, 2, 1);
    t[0x18] = Descriptor::new(OpKind::Xor, 3, 2, 1);
    t[0x19] = Descriptor::new(OpKind::Not, 3, 1, 1);
    t[0x1a] = Descriptor::new(OpKind::Byte, 3, 2, 1);
    t[0x1b] = Descriptor::new(OpKind::Shl, 3, 2, 1);
    t[0x1c] = Descriptor::new(OpKind::Shr, 3, 2, 1);
    t[0x1d] = Descriptor::new(OpKind::Sar, 3, 2, 1);

    t[0x20] = Descriptor::new(OpKind::Keccak256, 30, 2, 1);

    t[0x30] = Descriptor::new(OpKind::Address, 2, 0, 1);
    t[0x31] = Descriptor::new(OpKind::Balance, 700, 1, 1);
    t[0x32] = Descriptor::new(OpKind::Origin, 2, 0, 1);
    t[0x33] = Descriptor::new(OpKind::Caller, 2, 0, 1);
    t[0x34] = Descriptor::new(OpKind::CallValue, 2, 0, 1);
    t[0x35] = Descriptor::new(OpKind::CallDataLoad, 3, 1, 1);
    t[0x36] = Descriptor::new(OpKind::CallDataSize, 2, 0, 1);
    t[0x37] = Descriptor::new(OpKind::CallDataCopy, 3, 3, 0);
    t[0x38] = Descriptor::new(OpKind::CodeSize, 2, 0, 1);
    t[0x39] = Descriptor::new(OpKind::CodeCopy, 3, 3, 0);
    t[0x3a] = Descriptor::new(OpKind::GasPrice, 2, 0, 1);
    t[0x3b] = Descriptor::new(OpKind::ExtCodeSize, 700, 1, 1);
    t[0x3c] = Descriptor::new(OpKind::ExtCodeCopy, 700, 4, 0);
    t[0x3d] = Descriptor::new(OpKind::ReturnDataSize, 2, 0, 1);
    t[0x3e] = Descriptor::new(OpKind::ReturnDataCopy, 3, 3, 0);
    t[0x3f] = Descriptor::new(OpKind::ExtCodeHash, 700, 1, 1);

    t[0x40] = Descriptor::new(OpKind::BlockHash, 20, 1, 1);
    t[0x41] = Descriptor::new(OpKind::Coinbase, 2, 0, 1);
    t[0x42] = Descriptor::new(OpKind::Timestamp, 2, 0, 1);
    t[0x43] = Descriptor::new(OpKind::Number, 2, 0, 1);
    t[0x44] = Descriptor::new(OpKind::Difficulty, 2, 0, 1);
    t[0x45] = Descriptor::new(OpKind::GasLimit, 2, 0, 1);
    t[0x46] = Descriptor::new(OpKind::ChainId, 2, 0, 1);
    t[0x47] = Descriptor::new(OpKind::SelfBalance, 5, 0, 1);
    t[0x48] = Descriptor::new(OpKind::BaseFee, 2, 0, 1);

    t[0x50] = Descriptor::new(OpKind::Pop, 2, 1, 0);
    t[0x51] = Descriptor::new(OpKind::MLoad, 3, 1, 1);
    t[0x52] = Descriptor::new(OpKind::MStore, 3, 2, 0);
    t[0x53] = Descriptor::new(OpKind::MStore8, 3, 2, 0);
    t[0x54] = Descriptor::new(OpKind::SLoad, 800, 1, 1);
    t[0x55] = Descriptor::new(OpKind::SStore, 0, 2, 0);
    t[0x56] = Descriptor::new(OpKind::Jump, 8, 1, 0);
    t[0x57] = Descriptor::new(OpKind::Jumpi, 10, 2, 0);
    t[0x58] = Descriptor::new(OpKind::Pc, 2, 0, 1);
    t[0x59] = Descriptor::new(OpKind::MSize, 2, 0, 1);
    t[0x5a] = Descriptor::new(OpKind::Gas, 2, 0, 1);
    t[0x5b] = Descriptor::new(OpKind::JumpDest, 1, 0, 0);

    for byte in 0x60..=0x7fusize {
        let mut d = Descriptor::new(OpKind::Push, 3, 0, 1);
        d.number = (byte - 0x5f) as u8;
        t[byte] = d;
    }
    for byte in 0x80..=0x8fusize {
        let mut d = Descriptor::new(OpKind::Dup, 3, 0, 1);
        d.number = (byte - 0x7f) as u8;
        t[byte] = d;
    }
    for byte in 0x90..=0x9fusize {
        let mut d = Descriptor::new(OpKind::Swap, 3, 0, 0);
        d.number = (byte - 0x8f) as u8;
        t[byte] = d;
    }
    for (i, byte) in (0xa0..=0xa4usize).enumerate() {
        let mut d = Descriptor::new(OpKind::Log, 375 * (1 + i as u32), 2 + i as u8, 0);
        d.number = (byte - 0xa0) as u8;
        t[byte] = d;
    }

    t[0xf0] = Descriptor::new(OpKind::Create, 32000, 3, 1);
    t[0xf1] = Descriptor::new(OpKind::Call, 700, 7, 1);
    t[0xf2] = Descriptor::new(OpKind::CallCode, 700, 7, 1);
    t[0xf3] = Descriptor::new(OpKind::Return, 0, 2, 0);
    t[0xf4] = Descriptor::new(OpKind::DelegateCall, 700, 6, 1);
    t[0xf5] = Descriptor::new(OpKind::Create2, 32000, 4, 1);
    t[0xfa] = Descriptor::new(OpKind::StaticCall, 700, 6, 1);
    t[0xfd] = Descriptor::new(OpKind::Revert, 0, 2, 0);
    t[0xfe] = Descriptor::INVALID;
    t[0xff] = Descriptor::new(OpKind::SelfDestruct, 5000, 1, 0);

    t
});

/// Decode a single EVM opcode byte. Every byte decodes to *some* descriptor;
/// an unrecognized byte decodes to `OpKind::Invalid` with zero fee and zero
/// stack effect (spec §4.1: "No failure mode").
pub fn decode(byte: u8) -> Descriptor {
    OPCODE_TABLE[byte as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_decodes() {
        for byte in 0u8..=255 {
            let d = decode(byte);
            // Just exercising the full byte range must not panic, and an
            // unassigned slot must fall back to INVALID.
            if d.kind == OpKind::Invalid {
                assert_eq!(d.fee, 0);
                assert_eq!(d.pops, 0);
                assert_eq!(d.pushes, 0);
            }
        }
    }

    #[test]
    fn push_family_numbers() {
        assert_eq!(decode(0x60).number, 1); // PUSH1
        assert_eq!(decode(0x7f).number, 32); // PUSH32
    }

    #[test]
    fn dup_swap_log_families() {
        assert_eq!(decode(0x80).number, 1); // DUP1
        assert_eq!(decode(0x8f).number, 16); // DUP16
        assert_eq!(decode(0x90).number, 1); // SWAP1
        assert_eq!(decode(0x9f).number, 16); // SWAP16
        assert_eq!(decode(0xa0).number, 0); // LOG0
        assert_eq!(decode(0xa4).number, 4); // LOG4
        assert_eq!(decode(0xa4).fee, 375 * 5);
    }

    #[test]
    fn unassigned_byte_is_invalid() {
        assert_eq!(decode(0x0c).kind, OpKind::Invalid);
        assert_eq!(decode(0xfe).kind, OpKind::Invalid);
    }
}

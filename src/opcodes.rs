//! The 256-entry opcode byte table, named per the Ethereum Yellow Paper /
//! execution-specs. Not every byte is assigned; unassigned bytes decode to
//! `Opcode::Invalid` at dispatch time.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Stop = 0x00,
    Add = 0x01,
    Mul = 0x02,
    Sub = 0x03,
    Div = 0x04,
    SDiv = 0x05,
    Mod = 0x06,
    SMod = 0x07,
    AddMod = 0x08,
    MulMod = 0x09,
    Exp = 0x0a,
    SignExtend = 0x0b,

    Lt = 0x10,
    Gt = 0x11,
    SLt = 0x12,
    SGt = 0x13,
    Eq = 0x14,
    IsZero = 0x15,
    And = 0x16,
    Or = 0x17,
    Xor = 0x18,
    Not = 0x19,
    Byte = 0x1a,
    Shl = 0x1b,
    Shr = 0x1c,
    Sar = 0x1d,

    Keccak256 = 0x20,

    Address = 0x30,
    Balance = 0x31,
    Origin = 0x32,
    Caller = 0x33,
    CallValue = 0x34,
    CallDataLoad = 0x35,
    CallDataSize = 0x36,
    CallDataCopy = 0x37,
    CodeSize = 0x38,
    CodeCopy = 0x39,
    GasPrice = 0x3a,
    ExtCodeSize = 0x3b,
    ExtCodeCopy = 0x3c,
    ReturnDataSize = 0x3d,
    ReturnDataCopy = 0x3e,
    ExtCodeHash = 0x3f,

    BlockHash = 0x40,
    Coinbase = 0x41,
    Timestamp = 0x42,
    Number = 0x43,
    PrevRandao = 0x44,
    GasLimit = 0x45,
    ChainId = 0x46,
    SelfBalance = 0x47,
    BaseFee = 0x48,
    BlobHash = 0x49,
    BlobBaseFee = 0x4a,

    Pop = 0x50,
    MLoad = 0x51,
    MStore = 0x52,
    MStore8 = 0x53,
    SLoad = 0x54,
    SStore = 0x55,
    Jump = 0x56,
    JumpI = 0x57,
    Pc = 0x58,
    MSize = 0x59,
    Gas = 0x5a,
    JumpDest = 0x5b,
    TLoad = 0x5c,
    TStore = 0x5d,
    MCopy = 0x5e,

    Push0 = 0x5f,
    Push1 = 0x60,
    Push2 = 0x61,
    Push3 = 0x62,
    Push4 = 0x63,
    Push5 = 0x64,
    Push6 = 0x65,
    Push7 = 0x66,
    Push8 = 0x67,
    Push9 = 0x68,
    Push10 = 0x69,
    Push11 = 0x6a,
    Push12 = 0x6b,
    Push13 = 0x6c,
    Push14 = 0x6d,
    Push15 = 0x6e,
    Push16 = 0x6f,
    Push17 = 0x70,
    Push18 = 0x71,
    Push19 = 0x72,
    Push20 = 0x73,
    Push21 = 0x74,
    Push22 = 0x75,
    Push23 = 0x76,
    Push24 = 0x77,
    Push25 = 0x78,
    Push26 = 0x79,
    Push27 = 0x7a,
    Push28 = 0x7b,
    Push29 = 0x7c,
    Push30 = 0x7d,
    Push31 = 0x7e,
    Push32 = 0x7f,

    Dup1 = 0x80,
    Dup2 = 0x81,
    Dup3 = 0x82,
    Dup4 = 0x83,
    Dup5 = 0x84,
    Dup6 = 0x85,
    Dup7 = 0x86,
    Dup8 = 0x87,
    Dup9 = 0x88,
    Dup10 = 0x89,
    Dup11 = 0x8a,
    Dup12 = 0x8b,
    Dup13 = 0x8c,
    Dup14 = 0x8d,
    Dup15 = 0x8e,
    Dup16 = 0x8f,

    Swap1 = 0x90,
    Swap2 = 0x91,
    Swap3 = 0x92,
    Swap4 = 0x93,
    Swap5 = 0x94,
    Swap6 = 0x95,
    Swap7 = 0x96,
    Swap8 = 0x97,
    Swap9 = 0x98,
    Swap10 = 0x99,
    Swap11 = 0x9a,
    Swap12 = 0x9b,
    Swap13 = 0x9c,
    Swap14 = 0x9d,
    Swap15 = 0x9e,
    Swap16 = 0x9f,

    Log0 = 0xa0,
    Log1 = 0xa1,
    Log2 = 0xa2,
    Log3 = 0xa3,
    Log4 = 0xa4,

    Create = 0xf0,
    Call = 0xf1,
    CallCode = 0xf2,
    Return = 0xf3,
    DelegateCall = 0xf4,
    Create2 = 0xf5,
    StaticCall = 0xfa,
    Revert = 0xfd,
    Invalid = 0xfe,
    SelfDestruct = 0xff,
}

impl Opcode {
    /// Decodes a raw byte, defaulting to `Invalid` for unassigned opcodes.
    pub fn from_byte(byte: u8) -> Opcode {
        match byte {
            0x00 => Opcode::Stop,
            0x01 => Opcode::Add,
            0x02 => Opcode::Mul,
            0x03 => Opcode::Sub,
            0x04 => Opcode::Div,
            0x05 => Opcode::SDiv,
            0x06 => Opcode::Mod,
            0x07 => Opcode::SMod,
            0x08 => Opcode::AddMod,
            0x09 => Opcode::MulMod,
            0x0a => Opcode::Exp,
            0x0b => Opcode::SignExtend,
            0x10 => Opcode::Lt,
            0x11 => Opcode::Gt,
            0x12 => Opcode::SLt,
            0x13 => Opcode::SGt,
            0x14 => Opcode::Eq,
            0x15 => Opcode::IsZero,
            0x16 => Opcode::And,
            0x17 => Opcode::Or,
            0x18 => Opcode::Xor,
            0x19 => Opcode::Not,
            0x1a => Opcode::Byte,
            0x1b => Opcode::Shl,
            0x1c => Opcode::Shr,
            0x1d => Opcode::Sar,
            0x20 => Opcode::Keccak256,
            0x30 => Opcode::Address,
            0x31 => Opcode::Balance,
            0x32 => Opcode::Origin,
            0x33 => Opcode::Caller,
            0x34 => Opcode::CallValue,
            0x35 => Opcode::CallDataLoad,
            0x36 => Opcode::CallDataSize,
            0x37 => Opcode::CallDataCopy,
            0x38 => Opcode::CodeSize,
            0x39 => Opcode::CodeCopy,
            0x3a => Opcode::GasPrice,
            0x3b => Opcode::ExtCodeSize,
            0x3c => Opcode::ExtCodeCopy,
            0x3d => Opcode::ReturnDataSize,
            0x3e => Opcode::ReturnDataCopy,
            0x3f => Opcode::ExtCodeHash,
            0x40 => Opcode::BlockHash,
            0x41 => Opcode::Coinbase,
            0x42 => Opcode::Timestamp,
            0x43 => Opcode::Number,
            0x44 => Opcode::PrevRandao,
            0x45 => Opcode::GasLimit,
            0x46 => Opcode::ChainId,
            0x47 => Opcode::SelfBalance,
            0x48 => Opcode::BaseFee,
            0x49 => Opcode::BlobHash,
            0x4a => Opcode::BlobBaseFee,
            0x50 => Opcode::Pop,
            0x51 => Opcode::MLoad,
            0x52 => Opcode::MStore,
            0x53 => Opcode::MStore8,
            0x54 => Opcode::SLoad,
            0x55 => Opcode::SStore,
            0x56 => Opcode::Jump,
            0x57 => Opcode::JumpI,
            0x58 => Opcode::Pc,
            0x59 => Opcode::MSize,
            0x5a => Opcode::Gas,
            0x5b => Opcode::JumpDest,
            0x5c => Opcode::TLoad,
            0x5d => Opcode::TStore,
            0x5e => Opcode::MCopy,
            0x5f => Opcode::Push0,
            0x60 => Opcode::Push1,
            0x61 => Opcode::Push2,
            0x62 => Opcode::Push3,
            0x63 => Opcode::Push4,
            0x64 => Opcode::Push5,
            0x65 => Opcode::Push6,
            0x66 => Opcode::Push7,
            0x67 => Opcode::Push8,
            0x68 => Opcode::Push9,
            0x69 => Opcode::Push10,
            0x6a => Opcode::Push11,
            0x6b => Opcode::Push12,
            0x6c => Opcode::Push13,
            0x6d => Opcode::Push14,
            0x6e => Opcode::Push15,
            0x6f => Opcode::Push16,
            0x70 => Opcode::Push17,
            0x71 => Opcode::Push18,
            0x72 => Opcode::Push19,
            0x73 => Opcode::Push20,
            0x74 => Opcode::Push21,
            0x75 => Opcode::Push22,
            0x76 => Opcode::Push23,
            0x77 => Opcode::Push24,
            0x78 => Opcode::Push25,
            0x79 => Opcode::Push26,
            0x7a => Opcode::Push27,
            0x7b => Opcode::Push28,
            0x7c => Opcode::Push29,
            0x7d => Opcode::Push30,
            0x7e => Opcode::Push31,
            0x7f => Opcode::Push32,
            0x80 => Opcode::Dup1,
            0x81 => Opcode::Dup2,
            0x82 => Opcode::Dup3,
            0x83 => Opcode::Dup4,
            0x84 => Opcode::Dup5,
            0x85 => Opcode::Dup6,
            0x86 => Opcode::Dup7,
            0x87 => Opcode::Dup8,
            0x88 => Opcode::Dup9,
            0x89 => Opcode::Dup10,
            0x8a => Opcode::Dup11,
            0x8b => Opcode::Dup12,
            0x8c => Opcode::Dup13,
            0x8d => Opcode::Dup14,
            0x8e => Opcode::Dup15,
            0x8f => Opcode::Dup16,
            0x90 => Opcode::Swap1,
            0x91 => Opcode::Swap2,
            0x92 => Opcode::Swap3,
            0x93 => Opcode::Swap4,
            0x94 => Opcode::Swap5,
            0x95 => Opcode::Swap6,
            0x96 => Opcode::Swap7,
            0x97 => Opcode::Swap8,
            0x98 => Opcode::Swap9,
            0x99 => Opcode::Swap10,
            0x9a => Opcode::Swap11,
            0x9b => Opcode::Swap12,
            0x9c => Opcode::Swap13,
            0x9d => Opcode::Swap14,
            0x9e => Opcode::Swap15,
            0x9f => Opcode::Swap16,
            0xa0 => Opcode::Log0,
            0xa1 => Opcode::Log1,
            0xa2 => Opcode::Log2,
            0xa3 => Opcode::Log3,
            0xa4 => Opcode::Log4,
            0xf0 => Opcode::Create,
            0xf1 => Opcode::Call,
            0xf2 => Opcode::CallCode,
            0xf3 => Opcode::Return,
            0xf4 => Opcode::DelegateCall,
            0xf5 => Opcode::Create2,
            0xfa => Opcode::StaticCall,
            0xfd => Opcode::Revert,
            0xff => Opcode::SelfDestruct,
            _ => Opcode::Invalid,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_push(self) -> bool {
        matches!(self.to_byte(), 0x60..=0x7f)
    }

    /// Number of immediate bytes following a PUSH opcode (0 for PUSH0).
    pub fn push_size(self) -> usize {
        let byte = self.to_byte();
        if byte == 0x5f {
            0
        } else if (0x60..=0x7f).contains(&byte) {
            usize::from(byte.saturating_sub(0x5f))
        } else {
            0
        }
    }
}

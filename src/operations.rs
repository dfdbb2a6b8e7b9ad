//! A small DSL for assembling bytecode in tests: one `Operation` variant per
//! opcode (plus the immediate for PUSHn), turned into raw bytes by
//! `to_bytecode`/`Operation::assemble`.

use ethereum_types::U256;

use crate::opcodes::Opcode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
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
    PrevRandao,
    GasLimit,
    ChainId,
    SelfBalance,
    BaseFee,
    BlobHash,
    BlobBaseFee,

    Pop,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    Jump,
    JumpI,
    Pc,
    MSize,
    Gas,
    JumpDest,
    TLoad,
    TStore,
    MCopy,

    Push0,
    Push(Vec<u8>),

    Dup(u8),
    Swap(u8),
    Log(u8),

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
}

impl Operation {
    /// `PUSHn <value>`, trimmed to the smallest number of big-endian bytes
    /// that represent `value` (at least one byte, as real bytecode requires).
    pub fn push(value: impl Into<U256>) -> Operation {
        let value: U256 = value.into();
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(31);
        Operation::Push(bytes[first_nonzero..].to_vec())
    }

    pub fn to_bytecode(&self) -> Vec<u8> {
        match self {
            Operation::Stop => vec![Opcode::Stop.to_byte()],
            Operation::Add => vec![Opcode::Add.to_byte()],
            Operation::Mul => vec![Opcode::Mul.to_byte()],
            Operation::Sub => vec![Opcode::Sub.to_byte()],
            Operation::Div => vec![Opcode::Div.to_byte()],
            Operation::SDiv => vec![Opcode::SDiv.to_byte()],
            Operation::Mod => vec![Opcode::Mod.to_byte()],
            Operation::SMod => vec![Opcode::SMod.to_byte()],
            Operation::AddMod => vec![Opcode::AddMod.to_byte()],
            Operation::MulMod => vec![Opcode::MulMod.to_byte()],
            Operation::Exp => vec![Opcode::Exp.to_byte()],
            Operation::SignExtend => vec![Opcode::SignExtend.to_byte()],

            Operation::Lt => vec![Opcode::Lt.to_byte()],
            Operation::Gt => vec![Opcode::Gt.to_byte()],
            Operation::SLt => vec![Opcode::SLt.to_byte()],
            Operation::SGt => vec![Opcode::SGt.to_byte()],
            Operation::Eq => vec![Opcode::Eq.to_byte()],
            Operation::IsZero => vec![Opcode::IsZero.to_byte()],
            Operation::And => vec![Opcode::And.to_byte()],
            Operation::Or => vec![Opcode::Or.to_byte()],
            Operation::Xor => vec![Opcode::Xor.to_byte()],
            Operation::Not => vec![Opcode::Not.to_byte()],
            Operation::Byte => vec![Opcode::Byte.to_byte()],
            Operation::Shl => vec![Opcode::Shl.to_byte()],
            Operation::Shr => vec![Opcode::Shr.to_byte()],
            Operation::Sar => vec![Opcode::Sar.to_byte()],

            Operation::Keccak256 => vec![Opcode::Keccak256.to_byte()],

            Operation::Address => vec![Opcode::Address.to_byte()],
            Operation::Balance => vec![Opcode::Balance.to_byte()],
            Operation::Origin => vec![Opcode::Origin.to_byte()],
            Operation::Caller => vec![Opcode::Caller.to_byte()],
            Operation::CallValue => vec![Opcode::CallValue.to_byte()],
            Operation::CallDataLoad => vec![Opcode::CallDataLoad.to_byte()],
            Operation::CallDataSize => vec![Opcode::CallDataSize.to_byte()],
            Operation::CallDataCopy => vec![Opcode::CallDataCopy.to_byte()],
            Operation::CodeSize => vec![Opcode::CodeSize.to_byte()],
            Operation::CodeCopy => vec![Opcode::CodeCopy.to_byte()],
            Operation::GasPrice => vec![Opcode::GasPrice.to_byte()],
            Operation::ExtCodeSize => vec![Opcode::ExtCodeSize.to_byte()],
            Operation::ExtCodeCopy => vec![Opcode::ExtCodeCopy.to_byte()],
            Operation::ReturnDataSize => vec![Opcode::ReturnDataSize.to_byte()],
            Operation::ReturnDataCopy => vec![Opcode::ReturnDataCopy.to_byte()],
            Operation::ExtCodeHash => vec![Opcode::ExtCodeHash.to_byte()],

            Operation::BlockHash => vec![Opcode::BlockHash.to_byte()],
            Operation::Coinbase => vec![Opcode::Coinbase.to_byte()],
            Operation::Timestamp => vec![Opcode::Timestamp.to_byte()],
            Operation::Number => vec![Opcode::Number.to_byte()],
            Operation::PrevRandao => vec![Opcode::PrevRandao.to_byte()],
            Operation::GasLimit => vec![Opcode::GasLimit.to_byte()],
            Operation::ChainId => vec![Opcode::ChainId.to_byte()],
            Operation::SelfBalance => vec![Opcode::SelfBalance.to_byte()],
            Operation::BaseFee => vec![Opcode::BaseFee.to_byte()],
            Operation::BlobHash => vec![Opcode::BlobHash.to_byte()],
            Operation::BlobBaseFee => vec![Opcode::BlobBaseFee.to_byte()],

            Operation::Pop => vec![Opcode::Pop.to_byte()],
            Operation::MLoad => vec![Opcode::MLoad.to_byte()],
            Operation::MStore => vec![Opcode::MStore.to_byte()],
            Operation::MStore8 => vec![Opcode::MStore8.to_byte()],
            Operation::SLoad => vec![Opcode::SLoad.to_byte()],
            Operation::SStore => vec![Opcode::SStore.to_byte()],
            Operation::Jump => vec![Opcode::Jump.to_byte()],
            Operation::JumpI => vec![Opcode::JumpI.to_byte()],
            Operation::Pc => vec![Opcode::Pc.to_byte()],
            Operation::MSize => vec![Opcode::MSize.to_byte()],
            Operation::Gas => vec![Opcode::Gas.to_byte()],
            Operation::JumpDest => vec![Opcode::JumpDest.to_byte()],
            Operation::TLoad => vec![Opcode::TLoad.to_byte()],
            Operation::TStore => vec![Opcode::TStore.to_byte()],
            Operation::MCopy => vec![Opcode::MCopy.to_byte()],

            Operation::Push0 => vec![Opcode::Push0.to_byte()],
            Operation::Push(bytes) => {
                let len = bytes.len().clamp(1, 32);
                let opcode = 0x5f_u8.saturating_add(u8::try_from(len).unwrap_or(32));
                let mut out = vec![opcode];
                out.extend_from_slice(bytes);
                out
            }

            Operation::Dup(n) => vec![0x80_u8.saturating_add(n.saturating_sub(1))],
            Operation::Swap(n) => vec![0x90_u8.saturating_add(n.saturating_sub(1))],
            Operation::Log(n) => vec![0xa0_u8.saturating_add(*n)],

            Operation::Create => vec![Opcode::Create.to_byte()],
            Operation::Call => vec![Opcode::Call.to_byte()],
            Operation::CallCode => vec![Opcode::CallCode.to_byte()],
            Operation::Return => vec![Opcode::Return.to_byte()],
            Operation::DelegateCall => vec![Opcode::DelegateCall.to_byte()],
            Operation::Create2 => vec![Opcode::Create2.to_byte()],
            Operation::StaticCall => vec![Opcode::StaticCall.to_byte()],
            Operation::Revert => vec![Opcode::Revert.to_byte()],
            Operation::Invalid => vec![Opcode::Invalid.to_byte()],
            Operation::SelfDestruct => vec![Opcode::SelfDestruct.to_byte()],
        }
    }

    /// Flattens a whole program into bytecode.
    pub fn assemble(ops: &[Operation]) -> Vec<u8> {
        ops.iter().flat_map(Operation::to_bytecode).collect()
    }
}

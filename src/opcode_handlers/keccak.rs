//! Opcode 0x20: KECCAK256.

use ethereum_types::U256;
use sha3::{Digest, Keccak256};

use crate::call_frame::CallFrame;
use crate::errors::{OpcodeResult, VMError};
use crate::gas_cost;
use crate::memory;
use crate::vm::VM;

impl VM {
    pub fn op_keccak256(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let size = crate::utils::u256_to_usize(frame.stack.pop()?)?;

        let cost = gas_cost::keccak256(size, offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        let data = memory::load_range(&mut frame.memory, offset, size)?;
        let hash = Keccak256::digest(&data);
        frame.stack.push(U256::from_big_endian(&hash))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

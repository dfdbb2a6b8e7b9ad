//! Opcodes 0x90-0x9f: SWAP1 .. SWAP16.

use crate::call_frame::CallFrame;
use crate::constants::GAS_VERY_LOW;
use crate::errors::{OpcodeResult, VMError};
use crate::vm::VM;

impl VM {
    pub fn op_swap(&mut self, frame: &mut CallFrame, depth: u8) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        frame.stack.swap(usize::from(depth))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

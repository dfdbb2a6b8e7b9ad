//! Opcodes 0x80-0x8f: DUP1 .. DUP16.

use crate::call_frame::CallFrame;
use crate::constants::GAS_VERY_LOW;
use crate::errors::{OpcodeResult, VMError};
use crate::vm::VM;

impl VM {
    pub fn op_dup(&mut self, frame: &mut CallFrame, depth: u8) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let value = frame.stack.get_from_top(usize::from(depth))?;
        frame.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

//! Opcodes 0x5f-0x7f: PUSH0, PUSH1 .. PUSH32.

use ethereum_types::U256;

use crate::call_frame::CallFrame;
use crate::constants::{GAS_BASE, GAS_VERY_LOW};
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::vm::VM;

impl VM {
    /// `n_bytes` is the immediate width (1..=32); the bytes are read directly
    /// out of the frame's code buffer without advancing `pc` first, since the
    /// caller applies `pc_increment` after this returns.
    pub fn op_push(&mut self, frame: &mut CallFrame, n_bytes: usize) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let start = frame.pc.saturating_add(1);
        let end = start.saturating_add(n_bytes);
        let value = match frame.code.get(start..end) {
            Some(bytes) => U256::from_big_endian(bytes),
            None => {
                let mut buf = [0u8; 32];
                let available = frame.code.get(start..).unwrap_or(&[]);
                let copy_len = available.len().min(n_bytes);
                #[allow(clippy::indexing_slicing)]
                buf[32 - n_bytes..32 - n_bytes + copy_len].copy_from_slice(&available[..copy_len]);
                U256::from_big_endian(&buf)
            }
        };
        frame.stack.push(value)?;
        Ok(OpcodeResult::Continue {
            pc_increment: n_bytes.checked_add(1).ok_or(ExceptionalHalt::VeryLargeNumber)?,
        })
    }

    pub fn op_push0(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::zero())?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

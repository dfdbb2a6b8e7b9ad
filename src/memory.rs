use ethereum_types::U256;

use crate::errors::{ExceptionalHalt, OutOfGasError, VMError};

/// A frame's byte-addressable memory. Grows in 32-byte words, is always a
/// multiple of 32 bytes long, and reads past the previous high-water mark
/// return zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u8>,
}

fn to_usize(value: U256) -> Result<usize, VMError> {
    if value.bits() > 64 {
        return Err(ExceptionalHalt::VeryLargeNumber.into());
    }
    usize::try_from(value.as_u64()).map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

/// Rounds `n` up to the next multiple of 32.
pub fn ceil32(n: usize) -> Result<usize, VMError> {
    if n == 0 {
        return Ok(0);
    }
    n.checked_add(31)
        .map(|v| v / 32 * 32)
        .ok_or(OutOfGasError::GasCostOverflow.into())
}

fn words_for(n: usize) -> Result<usize, VMError> {
    Ok(ceil32(n)? / 32)
}

/// The new memory size (in bytes) needed to cover `[offset, offset+size)`,
/// or the current size if `size == 0`.
pub fn calculate_memory_size(offset: U256, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    let offset = to_usize(offset)?;
    let end = offset
        .checked_add(size)
        .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
    ceil32(end)
}

fn cost_for_words(words: usize) -> Result<u64, VMError> {
    let words = u64::try_from(words).map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let linear = words
        .checked_mul(3)
        .ok_or(OutOfGasError::GasCostOverflow)?;
    let quadratic = words
        .checked_mul(words)
        .ok_or(OutOfGasError::GasCostOverflow)?
        / 512;
    linear
        .checked_add(quadratic)
        .ok_or(OutOfGasError::GasCostOverflow.into())
}

/// Cost delta to grow memory from `current_size` to `new_size` bytes.
pub fn expansion_cost(new_size: usize, current_size: usize) -> Result<u64, VMError> {
    if new_size <= current_size {
        return Ok(0);
    }
    let new_cost = cost_for_words(words_for(new_size)?)?;
    let old_cost = cost_for_words(words_for(current_size)?)?;
    new_cost
        .checked_sub(old_cost)
        .ok_or(OutOfGasError::GasCostOverflow.into())
}

impl Memory {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn resize_to(&mut self, new_size: usize) -> Result<(), VMError> {
        let new_size = ceil32(new_size)?;
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
        Ok(())
    }

    pub fn load_word(&mut self, offset: U256) -> Result<U256, VMError> {
        let offset = to_usize(offset)?;
        let end = offset
            .checked_add(32)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let slice = self
            .data
            .get(offset..end)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        Ok(U256::from_big_endian(slice))
    }

    pub fn load_range(&mut self, offset: U256, size: usize) -> Result<Vec<u8>, VMError> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let offset = to_usize(offset)?;
        let end = offset
            .checked_add(size)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        Ok(self
            .data
            .get(offset..end)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?
            .to_vec())
    }

    pub fn store_word(&mut self, offset: U256, value: U256) -> Result<(), VMError> {
        let offset = to_usize(offset)?;
        let end = offset
            .checked_add(32)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        let slot = self
            .data
            .get_mut(offset..end)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        slot.copy_from_slice(&word);
        Ok(())
    }

    pub fn store_byte(&mut self, offset: U256, value: u8) -> Result<(), VMError> {
        let offset = to_usize(offset)?;
        let end = offset
            .checked_add(1)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let slot = self
            .data
            .get_mut(offset)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        *slot = value;
        Ok(())
    }

    pub fn store_range(&mut self, offset: U256, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        let offset = to_usize(offset)?;
        let end = offset
            .checked_add(data.len())
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let slot = self
            .data
            .get_mut(offset..end)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        slot.copy_from_slice(data);
        Ok(())
    }

    /// Stores `data`, zero-padding when `data` is shorter than `size` (used
    /// by CODECOPY/CALLDATACOPY/EXTCODECOPY past the end of the source buffer).
    pub fn store_range_padded(
        &mut self,
        offset: U256,
        size: usize,
        data: &[u8],
    ) -> Result<(), VMError> {
        if size == 0 {
            return Ok(());
        }
        let offset_usize = to_usize(offset)?;
        let end = offset_usize
            .checked_add(size)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let slot = self
            .data
            .get_mut(offset_usize..end)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        let copy_len = data.len().min(size);
        slot[..copy_len].copy_from_slice(&data[..copy_len]);
        for byte in slot.iter_mut().skip(copy_len) {
            *byte = 0;
        }
        Ok(())
    }

    pub fn copy_within(&mut self, dst: U256, src: U256, size: usize) -> Result<(), VMError> {
        if size == 0 {
            return Ok(());
        }
        let dst_usize = to_usize(dst)?;
        let src_usize = to_usize(src)?;
        let end = dst_usize
            .max(src_usize)
            .checked_add(size)
            .ok_or::<VMError>(OutOfGasError::GasCostOverflow.into())?;
        self.resize_to(end)?;
        let mut buf = vec![0u8; size];
        buf.copy_from_slice(
            self.data
                .get(src_usize..src_usize + size)
                .ok_or(ExceptionalHalt::OutOfBoundsRead)?,
        );
        let dst_slot = self
            .data
            .get_mut(dst_usize..dst_usize + size)
            .ok_or(ExceptionalHalt::OutOfBoundsRead)?;
        dst_slot.copy_from_slice(&buf);
        Ok(())
    }
}

/// Free-function wrappers kept for call sites that hold a `&mut Memory`
/// borrowed out of a `CallFrame`, matching the teacher's module-function style.
pub fn load_range(memory: &mut Memory, offset: U256, size: usize) -> Result<Vec<u8>, VMError> {
    memory.load_range(offset, size)
}

pub fn try_store_range(
    memory: &mut Memory,
    offset: U256,
    size: usize,
    data: &[u8],
) -> Result<(), VMError> {
    memory.store_range_padded(offset, size, data)
}

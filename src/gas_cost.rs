//! Dynamic gas cost calculators. Static per-opcode costs live as constants
//! in [`crate::constants`]; this module computes the parts that depend on
//! runtime values: memory expansion, word counts, warm/cold access, and the
//! handful of precompiles with data-dependent pricing.

use ethereum_types::{Address, H256, U256};
use num_bigint::BigUint;

use crate::constants::*;
use crate::errors::{ExceptionalHalt, OutOfGasError, VMError};
use crate::fork::Fork;
use crate::memory;

fn add(a: u64, b: u64) -> Result<u64, VMError> {
    a.checked_add(b).ok_or(OutOfGasError::GasCostOverflow.into())
}

fn mul(a: u64, b: u64) -> Result<u64, VMError> {
    a.checked_mul(b).ok_or(OutOfGasError::GasCostOverflow.into())
}

fn words(size: usize) -> Result<u64, VMError> {
    u64::try_from((size.checked_add(31).ok_or(OutOfGasError::GasCostOverflow)?) / 32)
        .map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

/// `(static_cost, memory_expansion_cost)` for a one-operand memory access at
/// `offset` of `size` bytes, given the frame's current memory length.
pub fn memory_expansion(offset: U256, size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    let new_size = memory::calculate_memory_size(offset, size)?;
    memory::expansion_cost(new_size, current_memory_size)
}

pub fn exp(exponent: U256, fork: Fork) -> Result<u64, VMError> {
    if exponent.is_zero() {
        return Ok(GAS_EXP_STATIC);
    }
    let byte_cost = if fork >= Fork::SpuriousDragon { 50 } else { 10 };
    let significant_bytes = u64::try_from(exponent.bits().div_ceil(8)).unwrap_or(32);
    add(GAS_EXP_STATIC, mul(byte_cost, significant_bytes)?)
}

pub fn keccak256(size: usize, offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    let memory_cost = memory_expansion(offset, size, current_memory_size)?;
    let word_cost = mul(KECCAK25_DYNAMIC_BASE, words(size)?)?;
    add(add(GAS_VERY_LOW + 30, word_cost)?, memory_cost)
}

pub fn calldatacopy(size: usize, dest_offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    copy_behavior(CALLDATACOPY_DYNAMIC_BASE, size, dest_offset, current_memory_size)
}

pub fn codecopy(size: usize, dest_offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    copy_behavior(CODECOPY_DYNAMIC_BASE, size, dest_offset, current_memory_size)
}

pub fn returndatacopy(size: usize, dest_offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    copy_behavior(RETURNDATACOPY_DYNAMIC_BASE, size, dest_offset, current_memory_size)
}

pub fn mcopy(size: usize, dest_offset: U256, src_offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    let dest_cost = memory_expansion(dest_offset, size, current_memory_size)?;
    let new_size_src = memory::calculate_memory_size(src_offset, size)?;
    let src_cost = memory::expansion_cost(new_size_src, current_memory_size)?;
    let memory_cost = dest_cost.max(src_cost);
    let word_cost = mul(MCOPY_DYNAMIC_BASE, words(size)?)?;
    add(add(GAS_VERY_LOW, word_cost)?, memory_cost)
}

fn copy_behavior(dynamic_base: u64, size: usize, dest_offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    let memory_cost = memory_expansion(dest_offset, size, current_memory_size)?;
    let word_cost = mul(dynamic_base, words(size)?)?;
    add(add(GAS_VERY_LOW, word_cost)?, memory_cost)
}

pub fn exit_opcode(size: usize, offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    memory_expansion(offset, size, current_memory_size)
}

pub fn log(size: usize, topic_count: u64, offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    let memory_cost = memory_expansion(offset, size, current_memory_size)?;
    let topics_cost = mul(LOGN_DYNAMIC_BASE, topic_count)?;
    let data_cost = mul(LOGN_DYNAMIC_BYTE_BASE, u64::try_from(size).map_err(|_| ExceptionalHalt::VeryLargeNumber)?)?;
    add(add(add(LOGN_DYNAMIC_BASE, topics_cost)?, data_cost)?, memory_cost)
}

pub fn mload(offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    add(GAS_VERY_LOW, memory_expansion(offset, 32, current_memory_size)?)
}

pub fn mstore(offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    add(GAS_VERY_LOW, memory_expansion(offset, 32, current_memory_size)?)
}

pub fn mstore8(offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    add(GAS_VERY_LOW, memory_expansion(offset, 1, current_memory_size)?)
}

/// Cold/warm SLOAD cost per EIP-2929 (Berlin onward; flat `GAS_BASE`-style
/// cost pre-Berlin is handled by the caller selecting this function only
/// from `Fork::Berlin` on).
pub fn sload(is_cold: bool) -> u64 {
    if is_cold {
        GAS_COLD_SLOAD
    } else {
        GAS_WARM_SLOAD
    }
}

/// EIP-2200 net-gas SSTORE metering plus EIP-2929 cold surcharge.
pub fn sstore(
    current_value: U256,
    new_value: U256,
    original_value: U256,
    is_cold: bool,
    remaining_gas: u64,
) -> Result<(u64, i64), VMError> {
    if remaining_gas <= SSTORE_STIPEND {
        return Err(OutOfGasError::ConsumedGasOverflow.into());
    }
    let cold_surcharge = if is_cold { SSTORE_COLD_DYNAMIC } else { 0 };
    let mut refund: i64 = 0;
    let base_cost = if current_value == new_value {
        SSTORE_DEFAULT_DYNAMIC
    } else if original_value == current_value {
        if original_value.is_zero() {
            SSTORE_STORAGE_CREATION
        } else {
            if new_value.is_zero() {
                refund = 4800;
            }
            SSTORE_STORAGE_MODIFICATION
        }
    } else {
        if !original_value.is_zero() {
            if current_value.is_zero() {
                refund -= 4800;
            }
            if new_value.is_zero() {
                refund += 4800;
            }
        }
        if original_value == new_value {
            if original_value.is_zero() {
                refund += i64::try_from(SSTORE_STORAGE_CREATION.saturating_sub(SSTORE_DEFAULT_DYNAMIC))
                    .unwrap_or(0);
            } else {
                refund += i64::try_from(SSTORE_STORAGE_MODIFICATION.saturating_sub(SSTORE_DEFAULT_DYNAMIC))
                    .unwrap_or(0);
            }
        }
        SSTORE_DEFAULT_DYNAMIC
    };
    Ok((add(base_cost, cold_surcharge)?, refund))
}

pub fn selfdestruct_base(fork: Fork) -> u64 {
    if fork >= Fork::London {
        SELFDESTRUCT_STATIC
    } else {
        GAS_SELF_DESTRUCT
    }
}

pub fn selfdestruct(
    is_cold: bool,
    target_is_empty: bool,
    value_is_zero: bool,
    fork: Fork,
) -> Result<u64, VMError> {
    let mut cost = selfdestruct_base(fork);
    if is_cold {
        cost = add(cost, COLD_ADDRESS_ACCESS_COST)?;
    }
    if target_is_empty && !value_is_zero {
        cost = add(cost, SELFDESTRUCT_DYNAMIC)?;
    }
    Ok(cost)
}

pub fn create(init_code_size: usize, offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    compute_gas_create(init_code_size, offset, current_memory_size, false)
}

pub fn create_2(init_code_size: usize, offset: U256, current_memory_size: usize) -> Result<u64, VMError> {
    compute_gas_create(init_code_size, offset, current_memory_size, true)
}

fn compute_gas_create(
    init_code_size: usize,
    offset: U256,
    current_memory_size: usize,
    is_create_2: bool,
) -> Result<u64, VMError> {
    let memory_cost = memory_expansion(offset, init_code_size, current_memory_size)?;
    let init_code_cost = mul(INIT_CODE_WORD_COST, words(init_code_size)?)?;
    let hashing_cost = if is_create_2 {
        mul(KECCAK25_DYNAMIC_BASE, words(init_code_size)?)?
    } else {
        0
    };
    add(add(add(CREATE_BASE_COST, init_code_cost)?, hashing_cost)?, memory_cost)
}

pub fn tx_calldata(calldata: &[u8], fork: Fork) -> Result<u64, VMError> {
    let mut cost = 0u64;
    for &byte in calldata {
        cost = add(
            cost,
            if byte == 0 {
                CALLDATA_COST_ZERO_BYTE
            } else {
                CALLDATA_COST_NON_ZERO_BYTE
            },
        )?;
    }
    // EIP-7623 floor is intentionally not modeled; Osaka keeps the flat per-byte cost.
    let _ = fork;
    Ok(cost)
}

pub fn address_access_cost(is_cold: bool, cold_cost: u64, warm_cost: u64) -> u64 {
    if is_cold {
        cold_cost
    } else {
        warm_cost
    }
}

pub fn balance(is_cold: bool) -> u64 {
    address_access_cost(is_cold, BALANCE_COLD_DYNAMIC, BALANCE_WARM_DYNAMIC)
}

pub fn extcodesize(is_cold: bool) -> u64 {
    address_access_cost(is_cold, EXTCODESIZE_COLD_DYNAMIC, EXTCODESIZE_WARM_DYNAMIC)
}

pub fn extcodehash(is_cold: bool) -> u64 {
    address_access_cost(is_cold, EXTCODEHASH_COLD_DYNAMIC, EXTCODEHASH_WARM_DYNAMIC)
}

pub fn extcodecopy(size: usize, dest_offset: U256, current_memory_size: usize, is_cold: bool) -> Result<u64, VMError> {
    let memory_cost = memory_expansion(dest_offset, size, current_memory_size)?;
    let word_cost = mul(EXTCODECOPY_DYNAMIC_BASE, words(size)?)?;
    let access_cost = address_access_cost(is_cold, EXTCODECOPY_COLD_DYNAMIC, EXTCODECOPY_WARM_DYNAMIC);
    add(add(word_cost, access_cost)?, memory_cost)
}

/// `(static_part, dynamic_part)` for the CALL family. `value_is_zero` and
/// `account_is_empty` only affect CALL/CALLCODE, never STATICCALL/DELEGATECALL.
#[allow(clippy::too_many_arguments)]
pub fn call(
    is_cold: bool,
    value_is_zero: bool,
    account_is_empty: bool,
    is_call_or_callcode: bool,
) -> Result<u64, VMError> {
    let mut cost = address_access_cost(is_cold, CALL_COLD_DYNAMIC, CALL_WARM_DYNAMIC);
    if is_call_or_callcode && !value_is_zero {
        cost = add(cost, CALL_POSITIVE_VALUE)?;
        if account_is_empty {
            cost = add(cost, CALL_TO_EMPTY_ACCOUNT)?;
        }
    }
    Ok(cost)
}

pub fn callcode(is_cold: bool, value_is_zero: bool) -> Result<u64, VMError> {
    let mut cost = address_access_cost(is_cold, CALL_COLD_DYNAMIC, CALL_WARM_DYNAMIC);
    if !value_is_zero {
        cost = add(cost, CALLCODE_POSITIVE_VALUE)?;
    }
    Ok(cost)
}

pub fn delegatecall(is_cold: bool) -> u64 {
    address_access_cost(is_cold, DELEGATECALL_COLD_DYNAMIC, DELEGATECALL_WARM_DYNAMIC)
}

pub fn staticcall(is_cold: bool) -> u64 {
    address_access_cost(is_cold, STATICCALL_COLD_DYNAMIC, STATICCALL_WARM_DYNAMIC)
}

/// EIP-150: the amount of gas a call may forward is capped at `all - all/64`.
pub fn max_message_call_gas(remaining_gas: u64) -> u64 {
    remaining_gas.saturating_sub(remaining_gas / 64)
}

/// Resolves the gas limit passed in the call to the actual amount forwarded
/// and the amount retained by the caller, applying the EIP-150 cap and the
/// EIP-2300 stipend for value-bearing calls.
pub fn calculate_cost_and_gas_limit_call(
    requested_gas: U256,
    remaining_gas: u64,
    value_is_zero: bool,
) -> Result<u64, VMError> {
    let capped = max_message_call_gas(remaining_gas);
    let mut gas_limit = if requested_gas > U256::from(capped) {
        capped
    } else {
        u64::try_from(requested_gas).map_err(|_| ExceptionalHalt::VeryLargeNumber)?
    };
    if !value_is_zero {
        gas_limit = add(gas_limit, CALL_POSITIVE_VALUE_STIPEND)?;
    }
    Ok(gas_limit)
}

fn floor_log2(value: &BigUint) -> u64 {
    value.bits().saturating_sub(1)
}

/// EIP-2565 (pre-Osaka) / EIP-7883 (Osaka) MODEXP gas cost.
pub fn modexp(
    base_size: usize,
    exponent_size: usize,
    modulus_size: usize,
    exponent_head: &BigUint,
    fork: Fork,
) -> Result<u64, VMError> {
    let max_len = base_size.max(modulus_size);
    let words_len = u64::try_from((max_len.checked_add(7).ok_or(OutOfGasError::GasCostOverflow)?) / 8)
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let multiplication_complexity = mul(words_len, words_len)?;

    let is_osaka = fork >= Fork::Osaka;
    let (static_cost, quotient, exponent_factor) = if is_osaka {
        (MODEXP_STATIC_COST_OSAKA, MODEXP_DYNAMIC_QUOTIENT_OSAKA, MODEXP_EXPONENT_FACTOR_OSAKA)
    } else {
        (MODEXP_STATIC_COST, MODEXP_DYNAMIC_QUOTIENT, MODEXP_EXPONENT_FACTOR)
    };

    let iteration_count = if exponent_size <= 32 {
        if exponent_head.is_zero() {
            0
        } else {
            floor_log2(exponent_head)
        }
    } else {
        let bits_over_32 = exponent_size.saturating_sub(32).saturating_mul(8);
        let head_bits = if exponent_head.is_zero() { 0 } else { floor_log2(exponent_head) };
        u64::try_from(bits_over_32).unwrap_or(u64::MAX).saturating_mul(exponent_factor).saturating_add(head_bits)
    };
    let iteration_count = iteration_count.max(1);

    let dynamic = mul(multiplication_complexity, iteration_count)? / quotient;
    Ok(static_cost.max(dynamic))
}

pub fn sha2_256(data_size: usize) -> Result<u64, VMError> {
    add(SHA2_256_STATIC_COST, mul(SHA2_256_DYNAMIC_BASE, words(data_size)?)?)
}

pub fn ripemd_160(data_size: usize) -> Result<u64, VMError> {
    add(RIPEMD_160_STATIC_COST, mul(RIPEMD_160_DYNAMIC_BASE, words(data_size)?)?)
}

pub fn identity(data_size: usize) -> Result<u64, VMError> {
    add(IDENTITY_STATIC_COST, mul(IDENTITY_DYNAMIC_BASE, words(data_size)?)?)
}

pub fn ecpairing(input_size: usize) -> Result<u64, VMError> {
    let pairs = u64::try_from(input_size / 192).map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    add(ECPAIRING_BASE_COST, mul(ECPAIRING_GROUP_COST, pairs)?)
}

pub fn bls12_msm(pairs: u64, discount: u64) -> Result<u64, VMError> {
    let cost = mul(pairs, BLS12_381_MSM_MULTIPLIER)?;
    cost.checked_mul(discount)
        .map(|v| v / 1000)
        .ok_or(OutOfGasError::GasCostOverflow.into())
}

pub fn bls12_pairing_check(pairs: u64) -> Result<u64, VMError> {
    add(BLS12_PAIRING_CHECK_FIXED_COST, mul(BLS12_PAIRING_CHECK_MUL_COST, pairs)?)
}

pub const GAS_EXP_STATIC: u64 = 10;

/// Storage-slot access cost helper used by SLOAD/SSTORE call sites that
/// already know whether `(address, key)` was in the warm set.
pub fn storage_access_cost(is_cold: bool) -> u64 {
    sload(is_cold)
}

/// Addresses of every precompile active at `fork`, for pre-warming the
/// access set at the start of a transaction (EIP-2929).
pub fn precompile_addresses(fork: Fork) -> Vec<Address> {
    let max = if fork >= Fork::Prague {
        0x11u64
    } else if fork >= Fork::Cancun {
        0x0au64
    } else {
        0x08u64
    };
    (1..=max).map(Address::from_low_u64_be).collect()
}

pub fn storage_key(address: Address, slot: H256) -> (Address, H256) {
    (address, slot)
}

/// EIP-7702/-2929 code-access fee: charged once per address per frame, on
/// first access to that address's code (CALL-family target resolution).
pub fn code_access_cost(code_len: usize) -> Result<u64, VMError> {
    mul(CODE_ACCESS_COST_WORD, words(code_len)?)
}

/// EIP-4844 blob base fee: `fake_exponential(MIN_BLOB_BASE_FEE, excess_blob_gas,
/// BLOB_BASE_FEE_UPDATE_FRACTION)`, the standard Taylor-series approximation
/// of `factor * e^(numerator/denominator)`.
pub fn blob_base_fee(excess_blob_gas: u64) -> U256 {
    fake_exponential(MIN_BLOB_BASE_FEE, excess_blob_gas, BLOB_BASE_FEE_UPDATE_FRACTION)
}

fn fake_exponential(factor: u64, numerator: u64, denominator: u64) -> U256 {
    let factor = U256::from(factor);
    let numerator = U256::from(numerator);
    let denominator = U256::from(denominator);

    let mut i = 1u64;
    let mut output = U256::zero();
    let mut numerator_accum = factor.saturating_mul(denominator);
    while !numerator_accum.is_zero() {
        output = output.saturating_add(numerator_accum);
        numerator_accum = numerator_accum.saturating_mul(numerator)
            / (denominator.saturating_mul(U256::from(i)));
        i = i.saturating_add(1);
    }
    output / denominator
}

//! Precompiled contracts, addresses `0x01`-`0x11`. Each entry returns the
//! output bytes and the gas it consumed, or a [`PrecompileError`].

use bytes::Bytes;
use ethereum_types::{Address, U256};
use lambdaworks_math::cyclic_group::IsGroup;
use lambdaworks_math::elliptic_curve::short_weierstrass::curves::bn_254::curve::{
    BN254Curve, BN254FieldElement,
};
use lambdaworks_math::elliptic_curve::traits::IsEllipticCurve;
use lambdaworks_math::traits::ByteConversion;
use lambdaworks_math::unsigned_integer::element::U256 as LambdaWorksU256;
use num_bigint::BigUint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::errors::{PrecompileError, VMError};
use crate::fork::Fork;
use crate::gas_cost;

pub const ECRECOVER_ADDRESS: u64 = 0x01;
pub const SHA2_256_ADDRESS: u64 = 0x02;
pub const RIPEMD_160_ADDRESS: u64 = 0x03;
pub const IDENTITY_ADDRESS: u64 = 0x04;
pub const MODEXP_ADDRESS: u64 = 0x05;
pub const ECADD_ADDRESS: u64 = 0x06;
pub const ECMUL_ADDRESS: u64 = 0x07;
pub const ECPAIRING_ADDRESS: u64 = 0x08;
pub const BLAKE2F_ADDRESS: u64 = 0x09;
pub const POINT_EVALUATION_ADDRESS: u64 = 0x0a;
pub const BLS12_G1ADD_ADDRESS: u64 = 0x0b;
pub const BLS12_G1MSM_ADDRESS: u64 = 0x0c;
pub const BLS12_G2ADD_ADDRESS: u64 = 0x0d;
pub const BLS12_G2MSM_ADDRESS: u64 = 0x0e;
pub const BLS12_PAIRING_CHECK_ADDRESS: u64 = 0x0f;
pub const BLS12_MAP_FP_TO_G1_ADDRESS: u64 = 0x10;
pub const BLS12_MAP_FP2_TO_G2_ADDRESS: u64 = 0x11;

pub fn is_precompile(address: &Address, fork: Fork) -> bool {
    let Some(n) = address_to_number(address) else {
        return false;
    };
    let max = if fork >= Fork::Prague {
        BLS12_MAP_FP2_TO_G2_ADDRESS
    } else if fork >= Fork::Cancun {
        POINT_EVALUATION_ADDRESS
    } else {
        ECPAIRING_ADDRESS
    };
    (1..=max).contains(&n)
}

fn address_to_number(address: &Address) -> Option<u64> {
    let bytes = address.as_bytes();
    if bytes[..19].iter().any(|&b| b != 0) {
        return None;
    }
    Some(u64::from(bytes[19]))
}

/// Runs the precompile at `address` against `calldata`, charging at most
/// `gas_limit`. Returns `(output, gas_used)`.
pub fn execute_precompile(
    address: Address,
    calldata: &[u8],
    gas_limit: u64,
    fork: Fork,
) -> Result<(Bytes, u64), VMError> {
    match address_to_number(&address) {
        Some(ECRECOVER_ADDRESS) => ecrecover(calldata, gas_limit),
        Some(SHA2_256_ADDRESS) => sha2_256(calldata, gas_limit),
        Some(RIPEMD_160_ADDRESS) => ripemd_160(calldata, gas_limit),
        Some(IDENTITY_ADDRESS) => identity(calldata, gas_limit),
        Some(MODEXP_ADDRESS) => modexp(calldata, gas_limit, fork),
        Some(ECADD_ADDRESS) => ecadd(calldata, gas_limit),
        Some(ECMUL_ADDRESS) => ecmul(calldata, gas_limit),
        _ => Err(PrecompileError::NotImplemented.into()),
    }
}

fn charge(cost: u64, gas_limit: u64) -> Result<(), VMError> {
    if cost > gas_limit {
        return Err(crate::errors::OutOfGasError::ConsumedGasOverflow.into());
    }
    Ok(())
}

fn ecrecover(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    charge(crate::constants::ECRECOVER_COST, gas_limit)?;
    let mut input = [0u8; 128];
    let len = calldata.len().min(128);
    input[..len].copy_from_slice(&calldata[..len]);

    let hash = &input[0..32];
    let v = U256::from_big_endian(&input[32..64]);
    let r = &input[64..96];
    let s = &input[96..128];

    if v != U256::from(27) && v != U256::from(28) {
        return Ok((Bytes::new(), crate::constants::ECRECOVER_COST));
    }
    let recovery_id = u8::try_from(v.as_u64().saturating_sub(27))
        .map_err(|_| PrecompileError::ParsingInputError)?;

    let Ok(recovery_id) = libsecp256k1::RecoveryId::parse(recovery_id) else {
        return Ok((Bytes::new(), crate::constants::ECRECOVER_COST));
    };
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let Ok(signature) = libsecp256k1::Signature::parse_standard(&sig_bytes) else {
        return Ok((Bytes::new(), crate::constants::ECRECOVER_COST));
    };
    let Ok(message) = libsecp256k1::Message::parse_slice(hash) else {
        return Ok((Bytes::new(), crate::constants::ECRECOVER_COST));
    };
    let Ok(public_key) = libsecp256k1::recover(&message, &signature, &recovery_id) else {
        return Ok((Bytes::new(), crate::constants::ECRECOVER_COST));
    };

    let serialized = public_key.serialize();
    let hash = keccak_hash::keccak(&serialized[1..]);
    let mut output = vec![0u8; 32];
    output[12..32].copy_from_slice(&hash.as_bytes()[12..32]);
    Ok((Bytes::from(output), crate::constants::ECRECOVER_COST))
}

fn sha2_256(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    let cost = gas_cost::sha2_256(calldata.len())?;
    charge(cost, gas_limit)?;
    let digest = Sha256::digest(calldata);
    Ok((Bytes::copy_from_slice(&digest), cost))
}

fn ripemd_160(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    let cost = gas_cost::ripemd_160(calldata.len())?;
    charge(cost, gas_limit)?;
    let digest = Ripemd160::digest(calldata);
    let mut output = vec![0u8; 32];
    output[12..32].copy_from_slice(&digest);
    Ok((Bytes::from(output), cost))
}

fn identity(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    let cost = gas_cost::identity(calldata.len())?;
    charge(cost, gas_limit)?;
    Ok((Bytes::copy_from_slice(calldata), cost))
}

fn read_u256_at(calldata: &[u8], offset: usize) -> BigUint {
    let mut word = [0u8; 32];
    for (i, byte) in word.iter_mut().enumerate() {
        if let Some(&b) = calldata.get(offset.saturating_add(i)) {
            *byte = b;
        }
    }
    BigUint::from_bytes_be(&word)
}

fn read_size_at(calldata: &[u8], offset: usize) -> Result<usize, VMError> {
    let word = read_u256_at(calldata, offset);
    usize::try_from(word).map_err(|_| PrecompileError::ParsingInputError.into())
}

/// EIP-2565/EIP-7883 MODEXP: variable-length `(base, exponent, modulus)`.
fn modexp(calldata: &[u8], gas_limit: u64, fork: Fork) -> Result<(Bytes, u64), VMError> {
    let base_len = read_size_at(calldata, 0)?;
    let exp_len = read_size_at(calldata, 32)?;
    let mod_len = read_size_at(calldata, 64)?;

    let base_start = 96usize;
    let exp_start = base_start.checked_add(base_len).ok_or(PrecompileError::ParsingInputError)?;
    let mod_start = exp_start.checked_add(exp_len).ok_or(PrecompileError::ParsingInputError)?;

    let base_bytes = read_slice(calldata, base_start, base_len);
    let exponent_bytes = read_slice(calldata, exp_start, exp_len);
    let modulus_bytes = read_slice(calldata, mod_start, mod_len);

    let exponent_head_len = exp_len.min(32);
    let exponent_head = BigUint::from_bytes_be(&exponent_bytes[..exponent_head_len]);

    let cost = gas_cost::modexp(base_len, exp_len, mod_len, &exponent_head, fork)?;
    charge(cost, gas_limit)?;

    let modulus = BigUint::from_bytes_be(&modulus_bytes);
    let output = if modulus == BigUint::default() {
        vec![0u8; mod_len]
    } else {
        let base = BigUint::from_bytes_be(&base_bytes);
        let exponent = BigUint::from_bytes_be(&exponent_bytes);
        let result = base.modpow(&exponent, &modulus);
        let mut bytes = result.to_bytes_be();
        if bytes.len() < mod_len {
            let mut padded = vec![0u8; mod_len.saturating_sub(bytes.len())];
            padded.append(&mut bytes);
            bytes = padded;
        }
        bytes
    };
    Ok((Bytes::from(output), cost))
}

fn read_slice(calldata: &[u8], start: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    for (i, byte) in out.iter_mut().enumerate() {
        if let Some(&b) = calldata.get(start.saturating_add(i)) {
            *byte = b;
        }
    }
    out
}

/// Reads a big-endian field element at `offset`, zero-padding past the end
/// of `calldata` the same way `read_u256_at` does for the BigUint path.
fn read_field_element_at(calldata: &[u8], offset: usize) -> Result<BN254FieldElement, VMError> {
    let mut word = [0u8; 32];
    for (i, byte) in word.iter_mut().enumerate() {
        if let Some(&b) = calldata.get(offset.saturating_add(i)) {
            *byte = b;
        }
    }
    BN254FieldElement::from_bytes_be(&word).map_err(|_| PrecompileError::InvalidEcPoint.into())
}

/// alt_bn128 (BN254) point addition (EIP-196).
fn ecadd(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    charge(crate::constants::ECADD_COST, gas_limit)?;

    let x1 = read_field_element_at(calldata, 0)?;
    let y1 = read_field_element_at(calldata, 32)?;
    let x2 = read_field_element_at(calldata, 64)?;
    let y2 = read_field_element_at(calldata, 96)?;

    // `BN254Curve::create_point_from_affine` rejects (0, 0) even though it is
    // the curve's point at infinity, so the identity cases are special-cased
    // before any conversion to a curve point is attempted.
    let zero = BN254FieldElement::from(0);
    let p1_is_infinity = x1.eq(&zero) && y1.eq(&zero);
    let p2_is_infinity = x2.eq(&zero) && y2.eq(&zero);

    if p1_is_infinity && p2_is_infinity {
        return Ok((Bytes::from(vec![0u8; 64]), crate::constants::ECADD_COST));
    }
    if p1_is_infinity {
        let p2 = BN254Curve::create_point_from_affine(x2, y2)
            .map_err(|_| PrecompileError::InvalidEcPoint)?;
        let out = [p2.x().to_bytes_be(), p2.y().to_bytes_be()].concat();
        return Ok((Bytes::from(out), crate::constants::ECADD_COST));
    }
    if p2_is_infinity {
        let p1 = BN254Curve::create_point_from_affine(x1, y1)
            .map_err(|_| PrecompileError::InvalidEcPoint)?;
        let out = [p1.x().to_bytes_be(), p1.y().to_bytes_be()].concat();
        return Ok((Bytes::from(out), crate::constants::ECADD_COST));
    }

    let p1 =
        BN254Curve::create_point_from_affine(x1, y1).map_err(|_| PrecompileError::InvalidEcPoint)?;
    let p2 =
        BN254Curve::create_point_from_affine(x2, y2).map_err(|_| PrecompileError::InvalidEcPoint)?;
    let sum = p1.operate_with(&p2).to_affine();
    let out = [sum.x().to_bytes_be(), sum.y().to_bytes_be()].concat();
    Ok((Bytes::from(out), crate::constants::ECADD_COST))
}

/// alt_bn128 (BN254) scalar multiplication (EIP-196).
fn ecmul(calldata: &[u8], gas_limit: u64) -> Result<(Bytes, u64), VMError> {
    charge(crate::constants::ECMUL_COST, gas_limit)?;

    let x1 = read_field_element_at(calldata, 0)?;
    let y1 = read_field_element_at(calldata, 32)?;
    let mut scalar_bytes = [0u8; 32];
    for (i, byte) in scalar_bytes.iter_mut().enumerate() {
        if let Some(&b) = calldata.get(64usize.saturating_add(i)) {
            *byte = b;
        }
    }
    let scalar = LambdaWorksU256::from_bytes_be(&scalar_bytes)
        .map_err(|_| PrecompileError::ParsingInputError)?;

    let zero = BN254FieldElement::from(0);
    if x1.eq(&zero) && y1.eq(&zero) {
        return Ok((Bytes::from(vec![0u8; 64]), crate::constants::ECMUL_COST));
    }

    let point = BN254Curve::create_point_from_affine(x1, y1)
        .map_err(|_| PrecompileError::InvalidEcPoint)?;
    let product = point.operate_with_self(scalar).to_affine();
    let out = [product.x().to_bytes_be(), product.y().to_bytes_be()].concat();
    Ok((Bytes::from(out), crate::constants::ECMUL_COST))
}

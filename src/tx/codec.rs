//! Canonical binary serialization for the TrustSet transaction.
//!
//! Fields are emitted sorted by (type code, field code) as the signing
//! and hashing rules require; amounts use the ledger's 64-bit native and
//! 384-bit issued encodings.

use rust_decimal::Decimal;
use sha2::{Digest, Sha512};

use crate::error::CodecError;
use crate::wallet::address;

use super::TrustSet;

/// Prefix of the single-signer signing payload ("STX\0")
const PREFIX_TX_SIGN: [u8; 4] = [0x53, 0x54, 0x58, 0x00];
/// Prefix hashed into the transaction id ("TXN\0")
const PREFIX_TX_ID: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

const TRANSACTION_TYPE_TRUST_SET: u16 = 20;

const TYPE_UINT16: u8 = 1;
const TYPE_UINT32: u8 = 2;
const TYPE_AMOUNT: u8 = 6;
const TYPE_BLOB: u8 = 7;
const TYPE_ACCOUNT: u8 = 8;

const FIELD_TRANSACTION_TYPE: u8 = 2;
const FIELD_FLAGS: u8 = 2;
const FIELD_SEQUENCE: u8 = 4;
const FIELD_QUALITY_IN: u8 = 20;
const FIELD_QUALITY_OUT: u8 = 21;
const FIELD_LAST_LEDGER_SEQUENCE: u8 = 27;
const FIELD_LIMIT_AMOUNT: u8 = 3;
const FIELD_FEE: u8 = 8;
const FIELD_SIGNING_PUB_KEY: u8 = 3;
const FIELD_TXN_SIGNATURE: u8 = 4;
const FIELD_ACCOUNT: u8 = 1;

/// Largest legal native amount, in drops (10^17)
const MAX_DROPS: u64 = 100_000_000_000_000_000;
/// Bit 62 marks a native (XRP) amount as positive
const NATIVE_POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;
/// Bit 63 marks an issued amount
const ISSUED_BIT: u64 = 0x8000_0000_0000_0000;

const MANTISSA_MIN: u128 = 1_000_000_000_000_000;
const MANTISSA_MAX: u128 = 9_999_999_999_999_999;
const EXPONENT_MIN: i32 = -96;
const EXPONENT_MAX: i32 = 80;

/// Serialize the transaction; `signature` is omitted for the signing
/// payload and present in the submitted blob.
pub fn serialize(
    tx: &TrustSet,
    public_key: &[u8; 33],
    signature: Option<&[u8]>,
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(256);

    field_header(&mut out, TYPE_UINT16, FIELD_TRANSACTION_TYPE);
    out.extend_from_slice(&TRANSACTION_TYPE_TRUST_SET.to_be_bytes());

    field_header(&mut out, TYPE_UINT32, FIELD_FLAGS);
    out.extend_from_slice(&tx.flags.to_be_bytes());

    field_header(&mut out, TYPE_UINT32, FIELD_SEQUENCE);
    out.extend_from_slice(&tx.sequence.to_be_bytes());

    field_header(&mut out, TYPE_UINT32, FIELD_QUALITY_IN);
    out.extend_from_slice(&tx.quality_in.to_be_bytes());

    field_header(&mut out, TYPE_UINT32, FIELD_QUALITY_OUT);
    out.extend_from_slice(&tx.quality_out.to_be_bytes());

    field_header(&mut out, TYPE_UINT32, FIELD_LAST_LEDGER_SEQUENCE);
    out.extend_from_slice(&tx.last_ledger_sequence.to_be_bytes());

    field_header(&mut out, TYPE_AMOUNT, FIELD_LIMIT_AMOUNT);
    push_issued_amount(
        &mut out,
        tx.limit_value,
        &tx.limit_currency,
        &tx.limit_issuer,
    )?;

    field_header(&mut out, TYPE_AMOUNT, FIELD_FEE);
    push_native_amount(&mut out, tx.fee_drops)?;

    field_header(&mut out, TYPE_BLOB, FIELD_SIGNING_PUB_KEY);
    push_blob(&mut out, public_key);

    if let Some(signature) = signature {
        field_header(&mut out, TYPE_BLOB, FIELD_TXN_SIGNATURE);
        push_blob(&mut out, signature);
    }

    field_header(&mut out, TYPE_ACCOUNT, FIELD_ACCOUNT);
    push_account(&mut out, &tx.account)?;

    Ok(out)
}

/// Bytes the wallet signs: prefix plus the signature-less serialization
pub fn signing_payload(tx: &TrustSet, public_key: &[u8; 33]) -> Result<Vec<u8>, CodecError> {
    let mut payload = PREFIX_TX_SIGN.to_vec();
    payload.extend_from_slice(&serialize(tx, public_key, None)?);
    Ok(payload)
}

/// Transaction id: first half of SHA-512 over the prefixed signed blob
pub fn transaction_hash(signed_blob: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(PREFIX_TX_ID);
    hasher.update(signed_blob);
    hex::encode_upper(&hasher.finalize()[..32])
}

fn field_header(out: &mut Vec<u8>, type_code: u8, field_code: u8) {
    if field_code < 16 {
        out.push((type_code << 4) | field_code);
    } else {
        out.push(type_code << 4);
        out.push(field_code);
    }
}

fn push_native_amount(out: &mut Vec<u8>, drops: u64) -> Result<(), CodecError> {
    if drops > MAX_DROPS {
        return Err(CodecError::AmountOutOfRange(format!("{} drops", drops)));
    }
    out.extend_from_slice(&(NATIVE_POSITIVE_BIT | drops).to_be_bytes());
    Ok(())
}

fn push_issued_amount(
    out: &mut Vec<u8>,
    value: Decimal,
    currency: &str,
    issuer: &str,
) -> Result<(), CodecError> {
    let bits = issued_value_bits(value)?;
    out.extend_from_slice(&bits.to_be_bytes());
    out.extend_from_slice(&currency_bytes(currency)?);
    let issuer_id = address::decode_classic_address(issuer)
        .map_err(|_| CodecError::InvalidAddress(issuer.to_string()))?;
    out.extend_from_slice(&issuer_id);
    Ok(())
}

fn issued_value_bits(value: Decimal) -> Result<u64, CodecError> {
    if value.is_zero() {
        return Ok(ISSUED_BIT);
    }
    let positive = value.is_sign_positive();
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut exponent = -(value.scale() as i32);

    while mantissa < MANTISSA_MIN {
        mantissa *= 10;
        exponent -= 1;
    }
    while mantissa > MANTISSA_MAX {
        if mantissa % 10 != 0 {
            return Err(CodecError::AmountOutOfRange(format!(
                "{} exceeds 16 significant digits",
                value
            )));
        }
        mantissa /= 10;
        exponent += 1;
    }
    if !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
        return Err(CodecError::AmountOutOfRange(value.to_string()));
    }

    let mut bits = ISSUED_BIT | (mantissa as u64);
    if positive {
        bits |= 1 << 62;
    }
    bits |= ((exponent + 97) as u64) << 54;
    Ok(bits)
}

fn currency_bytes(code: &str) -> Result<[u8; 20], CodecError> {
    let mut bytes = [0u8; 20];
    if code.len() == 3 && code != "XRP" && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        // standard codes sit at offset 12 of the 160-bit field
        bytes[12..15].copy_from_slice(code.as_bytes());
        return Ok(bytes);
    }
    if code.len() == 40 {
        let raw =
            hex::decode(code).map_err(|_| CodecError::InvalidCurrency(code.to_string()))?;
        bytes.copy_from_slice(&raw);
        return Ok(bytes);
    }
    Err(CodecError::InvalidCurrency(code.to_string()))
}

fn push_blob(out: &mut Vec<u8>, data: &[u8]) {
    push_vl_length(out, data.len());
    out.extend_from_slice(data);
}

fn push_account(out: &mut Vec<u8>, account: &str) -> Result<(), CodecError> {
    let id = address::decode_classic_address(account)
        .map_err(|_| CodecError::InvalidAddress(account.to_string()))?;
    push_vl_length(out, id.len());
    out.extend_from_slice(&id);
    Ok(())
}

fn push_vl_length(out: &mut Vec<u8>, len: usize) {
    debug_assert!(len <= 12_480);
    if len <= 192 {
        out.push(len as u8);
    } else {
        let adjusted = len - 193;
        out.push(193 + (adjusted >> 8) as u8);
        out.push((adjusted & 0xFF) as u8);
    }
}

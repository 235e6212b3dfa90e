// OracleRun - A fast, modular RSA PKCS#1 v1.5 padding oracle attack engine
// Copyright (C) 2025 OracleRun Team
// Licensed under GPL-3.0

//! PKCS#1 v1.5 Encryption Block Constants
//!
//! Centralized constants for the encryption-block format of RFC 8017
//! Section 7.2 (identical to RFC 2313 Section 8.1, the version the
//! Bleichenbacher attack targets). Keeping them named avoids magic numbers
//! in the conformance checks and the attack arithmetic.

/// Leading byte of an encryption block (0x00)
///
/// Guarantees the encoded block, read as an integer, is smaller than the
/// modulus.
///
/// Reference: RFC 8017 Section 7.2.1
pub const BLOCK_LEADING_BYTE: u8 = 0x00;

/// Block type for public-key encryption operations (0x02)
///
/// Type 2 blocks carry pseudo-random nonzero padding and are the only block
/// type produced by RSAES-PKCS1-v1_5 encryption. A decryption result starting
/// with `00 02` is what a padding oracle reports as conformant.
///
/// Reference: RFC 8017 Section 7.2.1, RFC 2313 Section 8.1
pub const BLOCK_TYPE_ENCRYPT: u8 = 0x02;

/// Minimum number of nonzero padding bytes in a type 2 block
///
/// Reference: RFC 8017 Section 7.2.1 (PS must be at least eight octets)
pub const MIN_PADDING_LEN: usize = 8;

/// Smallest block size the attack arithmetic is defined for
///
/// The conformance band is derived from `B = 256^(k - 2)`, so a block must
/// span at least two bytes. Real moduli are far above this; tiny test keys
/// sit right at it.
pub const MIN_BLOCK_SIZE: usize = 2;

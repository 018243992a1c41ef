//! Standard account addresses
//!
//! Two textual forms are accepted:
//! - raw: `<workchain>:<64 hex digits>`
//! - user-friendly: 48 base64 (or base64url) characters encoding
//!   `[tag(1)] [workchain(1)] [account(32)] [crc16(2)]`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::checksum::crc16;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("`{0}` is not a valid blockchain address")]
    Malformed(String),
    #[error("address checksum mismatch")]
    InvalidChecksum,
    #[error("unknown address tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("workchain {0} is not supported for mining (expected -1 or 0)")]
    UnsupportedWorkchain(i8),
}

/// An account in a basic workchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
    pub bounceable: bool,
    pub testnet: bool,
}

impl StdAddress {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self {
            workchain,
            hash,
            bounceable: true,
            testnet: false,
        }
    }

    /// Parse either the raw or the user-friendly form
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        if text.contains(':') {
            Self::parse_raw(text)
        } else {
            Self::parse_friendly(text)
        }
    }

    fn parse_raw(text: &str) -> Result<Self, AddressError> {
        let malformed = || AddressError::Malformed(text.to_string());

        let (wc, account) = text.split_once(':').ok_or_else(malformed)?;
        let workchain: i8 = wc.parse().map_err(|_| malformed())?;
        if account.len() != 64 {
            return Err(malformed());
        }
        let mut hash = [0u8; 32];
        hex::decode_to_slice(account, &mut hash).map_err(|_| malformed())?;

        Ok(Self::new(workchain, hash))
    }

    fn parse_friendly(text: &str) -> Result<Self, AddressError> {
        if text.len() != FRIENDLY_LEN {
            return Err(AddressError::Malformed(text.to_string()));
        }
        let data = base64_decode(text).ok_or_else(|| AddressError::Malformed(text.to_string()))?;
        if data.len() != FRIENDLY_BYTES {
            return Err(AddressError::Malformed(text.to_string()));
        }

        let crc = crc16(&data[..34]);
        if data[34..] != crc.to_be_bytes() {
            return Err(AddressError::InvalidChecksum);
        }

        let tag = data[0];
        let testnet = tag & TAG_TESTNET != 0;
        let bounceable = match tag & !TAG_TESTNET {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => return Err(AddressError::UnknownTag(other)),
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&data[2..34]);

        Ok(Self {
            workchain: data[1] as i8,
            hash,
            bounceable,
            testnet,
        })
    }

    /// User-friendly form with checksum
    pub fn to_friendly(&self, url_safe: bool) -> String {
        let mut tag = if self.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if self.testnet {
            tag |= TAG_TESTNET;
        }

        let mut data = Vec::with_capacity(FRIENDLY_BYTES);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash);

        let crc = crc16(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        base64_encode(&data, url_safe)
    }
}

impl FromStr for StdAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StdAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode_upper(self.hash))
    }
}

/// Parse an address that may own a proof-of-work giver slot.
///
/// Only the masterchain (-1) and the basechain (0) are accepted.
pub fn parse_mining_address(text: &str) -> Result<StdAddress, AddressError> {
    let address = StdAddress::parse(text)?;
    match address.workchain {
        -1 | 0 => Ok(address),
        other => Err(AddressError::UnsupportedWorkchain(other)),
    }
}

const STD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const URL_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn base64_encode(data: &[u8], url_safe: bool) -> String {
    let alphabet = if url_safe { URL_ALPHABET } else { STD_ALPHABET };

    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for group in data.chunks(3) {
        let mut word = [0u8; 4];
        word[1..=group.len()].copy_from_slice(group);
        let word = u32::from_be_bytes(word);
        // k input bytes give k + 1 digits, no padding
        for i in 0..=group.len() {
            let digit = (word >> (18 - 6 * i)) & 0x3F;
            out.push(alphabet[digit as usize] as char);
        }
    }
    out
}

// Accepts both alphabets, no padding.
fn base64_decode(text: &str) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len() * 3 / 4);
    let mut bits = 0u32;
    let mut value = 0u32;

    for c in text.bytes() {
        let digit = match c {
            b'A'..=b'Z' => c - b'A',
            b'a'..=b'z' => c - b'a' + 26,
            b'0'..=b'9' => c - b'0' + 52,
            b'+' | b'-' => 62,
            b'/' | b'_' => 63,
            _ => return None,
        };
        value = (value << 6) | digit as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            result.push((value >> bits) as u8);
        }
    }

    Some(result)
}

//! CPU proof-of-work kernel
//!
//! Each candidate is the 121-byte "Mine" body:
//! `[cmd(4)] [flags(1)] [expire(4)] [address(32)] [rdata1(32)] [seed(16)] [rdata2(32)]`.
//! The hashed value is the representation hash of a cell holding exactly
//! that body, so a winning body can be dropped into a message unchanged.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use powminer_ledger::StdAddress;

use crate::config::SearchConfig;
use crate::device::BackendKind;
use crate::trial::{BackendError, HashTrial, TrialContext};

pub const BODY_LEN: usize = 121;

/// Descriptor bytes of a cell with 968 data bits and no refs
const CELL_DESCRIPTORS: [u8; 2] = [0x00, 0xF2];

const CMD: &[u8; 4] = b"Mine";
const FLAGS_AT: usize = 4;
const EXPIRE_AT: usize = 5;
const ADDRESS_AT: usize = 9;
const RDATA1_AT: usize = 41;
const SEED_AT: usize = 73;
const RDATA2_AT: usize = 89;

/// Body bytes covered by the cached first SHA-256 block
const PREFIX_BODY_LEN: usize = 64 - CELL_DESCRIPTORS.len();

const EXPIRE_WINDOW_SECS: u64 = 900;
const ATTEMPTS_PER_FACTOR: u64 = 256;
const MAX_POLL_BATCH: u64 = 1 << 20;

/// Mutable candidate body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineBody([u8; BODY_LEN]);

impl MineBody {
    pub fn new(origin: &StdAddress, seed: &[u8; 16], rdata: &[u8; 32]) -> Self {
        let mut body = [0u8; BODY_LEN];
        body[..4].copy_from_slice(CMD);
        body[FLAGS_AT] = (origin.workchain as i32 * 4 + origin.bounceable as i32) as u8;
        body[ADDRESS_AT..RDATA1_AT].copy_from_slice(&origin.hash);
        body[RDATA1_AT..SEED_AT].copy_from_slice(rdata);
        body[SEED_AT..RDATA2_AT].copy_from_slice(seed);
        body[RDATA2_AT..].copy_from_slice(rdata);
        Self(body)
    }

    pub fn as_bytes(&self) -> &[u8; BODY_LEN] {
        &self.0
    }

    pub fn set_expire(&mut self, unix_secs: u32) {
        self.0[EXPIRE_AT..ADDRESS_AT].copy_from_slice(&unix_secs.to_be_bytes());
    }

    /// Step both random fields as one 256-bit big-endian counter.
    ///
    /// Returns the body offset of the most significant rdata1 byte touched.
    pub fn increment(&mut self) -> usize {
        for i in (0..32).rev() {
            let next = self.0[RDATA2_AT + i].wrapping_add(1);
            self.0[RDATA2_AT + i] = next;
            self.0[RDATA1_AT + i] = next;
            if next != 0 {
                return RDATA1_AT + i;
            }
        }
        RDATA1_AT
    }
}

/// Proof-of-work hash of a body
pub fn pow_hash(body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(CELL_DESCRIPTORS);
    hasher.update(body);
    hasher.finalize().into()
}

fn prefix_state(body: &MineBody) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(CELL_DESCRIPTORS);
    hasher.update(&body.0[..PREFIX_BODY_LEN]);
    hasher
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Attempts between two poll points for a given boost factor
pub fn poll_batch(boost_factor: u32) -> u64 {
    (ATTEMPTS_PER_FACTOR * boost_factor.max(1) as u64).min(MAX_POLL_BATCH)
}

/// Software kernel; every invocation starts from fresh random data
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuTrial;

impl HashTrial for CpuTrial {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn try_search(
        &self,
        config: &SearchConfig,
        ctx: &TrialContext<'_>,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        let mut rdata = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut rdata);
        let mut body = MineBody::new(&config.origin, &config.seed, &rdata);

        let batch = poll_batch(config.boost_factor) as i64;
        let mut done: i64 = 0;

        while done < config.max_iterations {
            if ctx.is_cancelled() || config.is_expired() {
                break;
            }
            body.set_expire((unix_now() + EXPIRE_WINDOW_SECS) as u32);

            let mut prefix = prefix_state(&body);
            let chunk = batch.min(config.max_iterations - done);
            let mut tried: i64 = 0;

            while tried < chunk {
                let mut hasher = prefix.clone();
                hasher.update(&body.0[PREFIX_BODY_LEN..]);
                let hash: [u8; 32] = hasher.finalize().into();
                tried += 1;

                if hash < config.target {
                    ctx.record(tried as u64);
                    debug!("candidate accepted after {} local attempts", done + tried);
                    return Ok(Some(body.0.to_vec()));
                }

                if body.increment() < PREFIX_BODY_LEN {
                    prefix = prefix_state(&body);
                }
            }

            ctx.record(tried as u64);
            done += tried;
        }

        Ok(None)
    }
}

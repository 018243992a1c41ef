//! Inbound external message carrying a proof-of-work result

use std::sync::Arc;

use crate::address::StdAddress;
use crate::cell::{Cell, CellBuilder, CellError};

/// `ext_in_msg_info$10 src:addr_none$00 dest:addr_std$10 anycast:nothing$0`
const EXT_IN_MSG_PREFIX: u64 = 0x44;
const EXT_IN_MSG_PREFIX_BITS: usize = 7;

/// `import_fee:(Grams 0) init:nothing$0 body:right$1`
const MSG_TAIL: u64 = 1;
const MSG_TAIL_BITS: usize = 6;

/// Build the root cell of the message; the result goes verbatim into the body cell.
pub fn build_external_message(result: &[u8], destination: &StdAddress) -> Result<Cell, CellError> {
    let mut body = CellBuilder::new();
    body.store_bytes(result)?;
    let body = Arc::new(body.build());

    let mut msg = CellBuilder::new();
    msg.store_bits(EXT_IN_MSG_PREFIX, EXT_IN_MSG_PREFIX_BITS)?
        .store_i8(destination.workchain)?
        .store_bytes(&destination.hash)?
        .store_bits(MSG_TAIL, MSG_TAIL_BITS)?
        .store_reference(body)?;

    Ok(msg.build())
}

//! Powminer Ledger Primitives
//!
//! Account addresses, cells, bag-of-cells serialization and the external
//! message envelope that carries a proof-of-work result.

pub mod address;
pub mod boc;
pub mod cell;
pub mod checksum;
pub mod envelope;

pub use address::{parse_mining_address, AddressError, StdAddress};
pub use boc::serialize_boc;
pub use cell::{Cell, CellBuilder, CellError};
pub use envelope::build_external_message;

pub use hex;

//! Domain layer: the QRIS payload codec, amount heuristics and the event model.
//!
//! Nothing in here performs I/O; storage and time are reached through the
//! traits in [`ports`].

pub mod amount;
pub mod checksum;
pub mod event;
pub mod money;
pub mod payload;
pub mod ports;
pub mod qr_image;
pub mod request;
pub mod tlv;

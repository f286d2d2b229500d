//! Static to dynamic QRIS payload conversion.

use super::checksum::{CHECKSUM_HEADER, checksum};
use super::money::MonetaryAmount;
use super::tlv::{self, TAG_AMOUNT, TAG_CHECKSUM, TAG_CURRENCY};
use crate::error::{QrisError, Result};

/// Embeds `amount` into a static payload and recomputes the checksum.
///
/// Any existing amount and checksum records are dropped first, so feeding an
/// already dynamic payload back in yields the same result as converting the
/// static one. Malformed trailing data is ignored: the payload is rebuilt
/// from whatever records parse cleanly.
pub fn make_dynamic(static_payload: &str, amount: MonetaryAmount) -> Result<String> {
    let trimmed = static_payload.trim();
    if trimmed.is_empty() {
        return Err(QrisError::InvalidPayload(
            "static payload is empty".to_string(),
        ));
    }

    let mut records = tlv::parse(strip_checksum(trimmed));
    if records.is_empty() {
        return Err(QrisError::InvalidPayload(
            "no TLV records could be parsed".to_string(),
        ));
    }

    tlv::remove_tag(&mut records, TAG_CHECKSUM);
    tlv::remove_tag(&mut records, TAG_AMOUNT);
    tlv::set_or_insert(&mut records, TAG_AMOUNT, &amount.to_field(), Some(TAG_CURRENCY));

    let mut payload = tlv::build(&records);
    payload.push_str(CHECKSUM_HEADER);
    let digest = checksum(&payload);
    payload.push_str(&digest);

    Ok(payload)
}

/// Drops a trailing `6304XXXX` record, if present.
fn strip_checksum(payload: &str) -> &str {
    let Some(split) = payload.len().checked_sub(8) else {
        return payload;
    };
    if !payload.is_char_boundary(split) {
        return payload;
    }
    let (head, tail) = payload.split_at(split);
    if tail.starts_with(CHECKSUM_HEADER) && tail[4..].bytes().all(|b| b.is_ascii_hexdigit()) {
        head
    } else {
        payload
    }
}

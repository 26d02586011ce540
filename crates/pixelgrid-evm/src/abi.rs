//! ABI surface of the two billboard contracts.
//!
//! Primary contract: `Transfer(address indexed from, address indexed to,
//! uint256 indexed squareNumber)`, `Personalized(uint256 squareNumber)`,
//! view call `suSquares(uint256) -> (uint96 version, bytes rgbData,
//! string title, string href)`.
//!
//! Underlay contract: `PersonalizedUnderlay(uint256 indexed squareId,
//! bytes rgbData, string title, string href)`.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::keccak256;

use pixelgrid_core::{
    IndexError, PrimaryEvent, SoldEvent, SquareRecord, UnderlayEvent, NUM_SQUARES,
    SQUARE_PIXEL_BYTES,
};

use crate::fetcher::RawLog;

/// `topic0` of the ERC-721 `Transfer` event.
pub fn transfer_topic() -> String {
    event_topic("Transfer(address,address,uint256)")
}

/// `topic0` of the primary contract's `Personalized` event.
pub fn personalized_topic() -> String {
    event_topic("Personalized(uint256)")
}

/// `topic0` of the underlay contract's `PersonalizedUnderlay` event.
pub fn personalized_underlay_topic() -> String {
    event_topic("PersonalizedUnderlay(uint256,bytes,string,string)")
}

fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

/// A 20-byte address left-padded to the 32-byte topic form, for filtering
/// `Transfer` events on their indexed `from` parameter.
pub fn address_topic(address: &str) -> Result<String, IndexError> {
    let bytes = decode_hex(address)?;
    if bytes.len() != 20 {
        return Err(IndexError::Decode(format!(
            "address {address} is {} bytes, expected 20",
            bytes.len()
        )));
    }
    Ok(format!("0x{:0>24}{}", "", hex::encode(bytes)))
}

// ─── Event decoding ───────────────────────────────────────────────────────────

/// Decode a `Transfer(from=contract)` log into a sale.
pub fn decode_sold(log: &RawLog) -> Result<SoldEvent, IndexError> {
    let square = square_id(topic_u64(log, 3)?, "Transfer")?;
    Ok(SoldEvent {
        square,
        block: log.block_number_u64(),
    })
}

/// Decode a `Personalized` log. The square number is the single
/// non-indexed parameter.
pub fn decode_primary(log: &RawLog) -> Result<PrimaryEvent, IndexError> {
    let data = decode_hex(&log.data)?;
    let values = DynSolType::Tuple(vec![DynSolType::Uint(256)])
        .abi_decode_sequence(&data)
        .map_err(|e| IndexError::Decode(format!("Personalized data: {e}")))?;
    let square = match values {
        DynSolValue::Tuple(vals) => uint_to_u64(vals.into_iter().next(), "squareNumber")?,
        _ => return Err(IndexError::Decode("Personalized: unexpected shape".into())),
    };
    Ok(PrimaryEvent {
        square: square_id(square, "Personalized")?,
        block: log.block_number_u64(),
    })
}

/// Decode a `PersonalizedUnderlay` log: indexed square id, then
/// `(bytes rgbData, string title, string href)` in the data.
pub fn decode_underlay(log: &RawLog) -> Result<UnderlayEvent, IndexError> {
    let square = square_id(topic_u64(log, 1)?, "PersonalizedUnderlay")?;
    let data = decode_hex(&log.data)?;
    let values = DynSolType::Tuple(vec![
        DynSolType::Bytes,
        DynSolType::String,
        DynSolType::String,
    ])
    .abi_decode_sequence(&data)
    .map_err(|e| IndexError::Decode(format!("PersonalizedUnderlay data: {e}")))?;

    match values {
        DynSolValue::Tuple(vals) => {
            let mut it = vals.into_iter();
            let rgb = match it.next() {
                Some(DynSolValue::Bytes(b)) => b,
                _ => return Err(IndexError::Decode("PersonalizedUnderlay: rgbData".into())),
            };
            if rgb.len() != SQUARE_PIXEL_BYTES {
                return Err(IndexError::Decode(format!(
                    "PersonalizedUnderlay for square {square}: rgbData is {} bytes, \
                     expected {SQUARE_PIXEL_BYTES}",
                    rgb.len()
                )));
            }
            let title = string_value(it.next(), "title")?;
            let href = string_value(it.next(), "href")?;
            Ok(UnderlayEvent {
                square,
                title,
                href,
                rgb,
                block: log.block_number_u64(),
            })
        }
        _ => Err(IndexError::Decode("PersonalizedUnderlay: unexpected shape".into())),
    }
}

// ─── suSquares view call ─────────────────────────────────────────────────────

/// Calldata for `suSquares(uint256)`.
pub fn su_squares_calldata(square: u64) -> String {
    let selector = &keccak256(b"suSquares(uint256)")[..4];
    format!("0x{}{:064x}", hex::encode(selector), square)
}

/// Decode the `suSquares` return struct.
pub fn decode_su_squares(result: &str) -> Result<SquareRecord, IndexError> {
    let data = decode_hex(result)?;
    let values = DynSolType::Tuple(vec![
        DynSolType::Uint(96),
        DynSolType::Bytes,
        DynSolType::String,
        DynSolType::String,
    ])
    .abi_decode_sequence(&data)
    .map_err(|e| IndexError::Decode(format!("suSquares return: {e}")))?;

    match values {
        DynSolValue::Tuple(vals) => {
            let mut it = vals.into_iter();
            let version = uint_to_u64(it.next(), "version")?;
            let rgb = match it.next() {
                Some(DynSolValue::Bytes(b)) => b,
                _ => return Err(IndexError::Decode("suSquares: rgbData".into())),
            };
            let title = string_value(it.next(), "title")?;
            let href = string_value(it.next(), "href")?;
            let record = SquareRecord {
                version,
                rgb,
                title,
                href,
            };
            // A personalized struct must carry a full pixel buffer; the
            // publisher blits it without re-checking.
            if record.is_personalized() && record.rgb.len() != SQUARE_PIXEL_BYTES {
                return Err(IndexError::Decode(format!(
                    "suSquares: rgbData is {} bytes, expected {SQUARE_PIXEL_BYTES}",
                    record.rgb.len()
                )));
            }
            Ok(record)
        }
        _ => Err(IndexError::Decode("suSquares: unexpected shape".into())),
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn decode_hex(s: &str) -> Result<Vec<u8>, IndexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| IndexError::Decode(format!("hex {s:.18}…: {e}")))
}

fn topic_u64(log: &RawLog, position: usize) -> Result<u64, IndexError> {
    let topic = log.topics.get(position).ok_or_else(|| {
        IndexError::Decode(format!("log is missing topic {position}"))
    })?;
    let bytes = decode_hex(topic)?;
    if bytes.len() != 32 {
        return Err(IndexError::Decode(format!("topic {position} is not 32 bytes")));
    }
    if bytes[..24].iter().any(|&b| b != 0) {
        return Err(IndexError::Decode(format!("topic {position} exceeds u64")));
    }
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[24..]);
    Ok(u64::from_be_bytes(out))
}

/// Validate a decoded square id against the board's 1-based range.
fn square_id(square: u64, event: &str) -> Result<u64, IndexError> {
    if !(1..=NUM_SQUARES as u64).contains(&square) {
        return Err(IndexError::Decode(format!(
            "{event}: square id {square} is outside 1..={NUM_SQUARES}"
        )));
    }
    Ok(square)
}

fn uint_to_u64(value: Option<DynSolValue>, field: &str) -> Result<u64, IndexError> {
    match value {
        Some(DynSolValue::Uint(v, _)) => u64::try_from(v)
            .map_err(|_| IndexError::Decode(format!("{field} exceeds u64"))),
        _ => Err(IndexError::Decode(format!("{field}: expected uint"))),
    }
}

fn string_value(value: Option<DynSolValue>, field: &str) -> Result<String, IndexError> {
    match value {
        Some(DynSolValue::String(s)) => Ok(s),
        _ => Err(IndexError::Decode(format!("{field}: expected string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn log(topics: Vec<String>, data: Vec<u8>, block: u64) -> RawLog {
        RawLog {
            address: "0xcontract".into(),
            topics,
            data: format!("0x{}", hex::encode(data)),
            block_number: format!("0x{block:x}"),
            tx_hash: "0x0".into(),
            log_index: "0x0".into(),
        }
    }

    fn uint_topic(n: u64) -> String {
        format!("0x{n:064x}")
    }

    #[test]
    fn known_transfer_topic() {
        // The canonical ERC-721 Transfer signature hash.
        assert_eq!(
            transfer_topic(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn address_topic_padding() {
        let t = address_topic("0xE9e3F9cfc1A64DFca53614a0182CFAD56c10624F").unwrap();
        assert_eq!(t.len(), 66);
        assert!(t.starts_with("0x000000000000000000000000e9e3f9cf"));

        assert!(address_topic("0x1234").is_err());
    }

    #[test]
    fn sold_decodes_square_from_third_topic() {
        let l = log(
            vec![
                transfer_topic(),
                uint_topic(0),
                uint_topic(0),
                uint_topic(42),
            ],
            vec![],
            1000,
        );
        let ev = decode_sold(&l).unwrap();
        assert_eq!(ev.square, 42);
        assert_eq!(ev.block, 1000);
    }

    #[test]
    fn primary_decodes_square_from_data() {
        let data = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(7u64), 256)])
            .abi_encode_params();
        let l = log(vec![personalized_topic()], data, 2100);
        let ev = decode_primary(&l).unwrap();
        assert_eq!(ev.square, 7);
        assert_eq!(ev.block, 2100);
    }

    #[test]
    fn underlay_roundtrip() {
        let rgb = vec![0x11u8; 300];
        let data = DynSolValue::Tuple(vec![
            DynSolValue::Bytes(rgb.clone()),
            DynSolValue::String("A".into()),
            DynSolValue::String("http://a".into()),
        ])
        .abi_encode_params();
        let l = log(vec![personalized_underlay_topic(), uint_topic(7)], data, 2000);

        let ev = decode_underlay(&l).unwrap();
        assert_eq!(ev.square, 7);
        assert_eq!(ev.title, "A");
        assert_eq!(ev.href, "http://a");
        assert_eq!(ev.rgb, rgb);
    }

    #[test]
    fn su_squares_calldata_shape() {
        let data = su_squares_calldata(1);
        // 4-byte selector + one 32-byte argument.
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.ends_with(&format!("{:064x}", 1)));
    }

    #[test]
    fn su_squares_return_roundtrip() {
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(3u64), 96),
            DynSolValue::Bytes(vec![0xAB; 300]),
            DynSolValue::String("Title".into()),
            DynSolValue::String("https://example.com".into()),
        ])
        .abi_encode_params();

        let rec = decode_su_squares(&format!("0x{}", hex::encode(encoded))).unwrap();
        assert_eq!(rec.version, 3);
        assert_eq!(rec.rgb, vec![0xAB; 300]);
        assert_eq!(rec.title, "Title");
        assert_eq!(rec.href, "https://example.com");
        assert!(rec.is_personalized());
    }

    #[test]
    fn missing_topic_is_a_decode_error() {
        let l = log(vec![transfer_topic()], vec![], 1);
        assert!(matches!(decode_sold(&l), Err(IndexError::Decode(_))));
    }

    #[test]
    fn out_of_range_square_ids_are_rejected() {
        for bad in [0u64, 10_001] {
            let l = log(
                vec![transfer_topic(), uint_topic(0), uint_topic(0), uint_topic(bad)],
                vec![],
                1000,
            );
            assert!(matches!(decode_sold(&l), Err(IndexError::Decode(_))));

            let data = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(bad), 256)])
                .abi_encode_params();
            let l = log(vec![personalized_topic()], data, 1000);
            assert!(matches!(decode_primary(&l), Err(IndexError::Decode(_))));

            let data = DynSolValue::Tuple(vec![
                DynSolValue::Bytes(vec![0; 300]),
                DynSolValue::String("A".into()),
                DynSolValue::String("http://a".into()),
            ])
            .abi_encode_params();
            let l = log(vec![personalized_underlay_topic(), uint_topic(bad)], data, 1000);
            assert!(matches!(decode_underlay(&l), Err(IndexError::Decode(_))));
        }
    }

    #[test]
    fn oversized_topic_does_not_alias_into_range() {
        // squareNumber = 2^64 + 42 would read back as 42 if the high
        // bytes were dropped.
        let big = U256::from((1u128 << 64) + 42);
        let topic = format!("0x{big:064x}");
        let l = log(
            vec![transfer_topic(), uint_topic(0), uint_topic(0), topic],
            vec![],
            1000,
        );
        assert!(matches!(decode_sold(&l), Err(IndexError::Decode(_))));
    }

    #[test]
    fn underlay_with_short_pixel_buffer_is_rejected() {
        let data = DynSolValue::Tuple(vec![
            DynSolValue::Bytes(vec![0x11; 3]),
            DynSolValue::String("A".into()),
            DynSolValue::String("http://a".into()),
        ])
        .abi_encode_params();
        let l = log(vec![personalized_underlay_topic(), uint_topic(7)], data, 2000);

        let err = decode_underlay(&l).unwrap_err();
        assert!(err.to_string().contains("expected 300"));
    }

    #[test]
    fn personalized_struct_with_short_pixel_buffer_is_rejected() {
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1u64), 96),
            DynSolValue::Bytes(vec![0xAB; 30]),
            DynSolValue::String("Title".into()),
            DynSolValue::String(String::new()),
        ])
        .abi_encode_params();

        let err = decode_su_squares(&format!("0x{}", hex::encode(encoded))).unwrap_err();
        assert!(matches!(err, IndexError::Decode(_)));
    }

    #[test]
    fn empty_struct_may_omit_pixel_buffer() {
        // An unsold or never-personalized square can read back with an
        // empty rgbData; its pixels are never published.
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::ZERO, 96),
            DynSolValue::Bytes(vec![]),
            DynSolValue::String(String::new()),
            DynSolValue::String(String::new()),
        ])
        .abi_encode_params();

        let rec = decode_su_squares(&format!("0x{}", hex::encode(encoded))).unwrap();
        assert!(!rec.is_personalized());
    }
}

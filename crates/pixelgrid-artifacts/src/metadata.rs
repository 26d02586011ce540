//! Per-square metadata document.
//!
//! The attribute set is fixed: row, column, Manhattan distance to the
//! board center, count of prime factors with multiplicity, and a
//! three-way palindrome classification of the square id.

use serde_json::{json, Value};

use pixelgrid_core::geometry;

use crate::padded_id;

/// Count of prime factors with multiplicity (Ω), e.g. 12 = 2·2·3 → 3.
/// Ω(1) = 0.
pub fn prime_factor_count(n: u64) -> u64 {
    let mut n = n;
    let mut count = 0;
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            n /= p;
            count += 1;
        }
        p += 1;
    }
    if n > 1 {
        count += 1;
    }
    count
}

/// Three-way classification of the decimal digits of a square id.
pub fn palindrome_class(n: u64) -> &'static str {
    let digits: Vec<u8> = {
        let mut d = vec![];
        let mut n = n;
        loop {
            d.push((n % 10) as u8);
            n /= 10;
            if n == 0 {
                break;
            }
        }
        d
    };
    if digits.iter().all(|&d| d == digits[0]) {
        "ALL SAME DIGIT"
    } else if digits.iter().eq(digits.iter().rev()) {
        "PALINDROME"
    } else {
        "NOT A PALINDROME"
    }
}

/// Build the metadata JSON document for one square.
pub fn build(square: u64, title: &str, token_uri_base: &str, site_base: &str) -> Value {
    let padded = padded_id(square);
    let description = if title.is_empty() {
        format!("Square #{padded} on the 10,000-square pixel billboard")
    } else {
        title.to_string()
    };
    json!({
        "name": format!("Square #{padded}"),
        "description": description,
        "image": format!("{token_uri_base}{padded}.svg"),
        "external_url": format!("{site_base}/#square-{square}"),
        "attributes": [
            { "trait_type": "Row", "value": geometry::row(square) },
            { "trait_type": "Column", "value": geometry::column(square) },
            {
                "trait_type": "Distance to center",
                "value": geometry::manhattan_distance_to_center(square),
            },
            { "trait_type": "Prime factors", "value": prime_factor_count(square) },
            { "value": palindrome_class(square) },
        ],
    })
}

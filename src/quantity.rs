// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Semantic comparison of Kubernetes resource quantities.
//!
//! The API server canonicalises quantities it stores (`1024Mi` comes back as `1Gi`,
//! `0.5` as `500m`), so comparing the strings would make every reconcile see a diff.
//! Quantities are parsed to an exact integer number of nano-units and compared by
//! value instead.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Nano-units per unit
const NANOS_EXPONENT: i32 = 9;

/// Parse a quantity string to an exact count of nano-units, rounding fractions of a
/// nano-unit up the way the API server does.
///
/// Returns `None` for strings that are not valid quantities or do not fit in `i128`.
#[must_use]
pub fn parse_nanos(value: &str) -> Option<i128> {
    let value = value.trim();
    let (number, mut exp10, exp2) = split_suffix(value);
    let has_suffix = number.len() != value.len();

    let (negative, number) = match number.as_bytes().first()? {
        b'-' => (true, &number[1..]),
        b'+' => (false, &number[1..]),
        _ => (false, number),
    };

    // Decimal exponent form: 1e3, 2.5E-2
    let (mantissa, exponent) = match number.find(['e', 'E']) {
        Some(pos) if !has_suffix => (&number[..pos], Some(&number[pos + 1..])),
        _ => (number, None),
    };
    if let Some(exponent) = exponent {
        exp10 = exp10.checked_add(exponent.parse::<i32>().ok()?)?;
    }

    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut digits: i128 = 0;
    for b in whole.bytes().chain(fraction.bytes()) {
        digits = digits.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    let scale = i32::try_from(fraction.len()).ok()?;

    let mut numerator = digits.checked_mul(2i128.checked_pow(exp2)?)?;
    let shift = NANOS_EXPONENT.checked_add(exp10)?.checked_sub(scale)?;
    let nanos = if shift >= 0 {
        numerator = numerator.checked_mul(10i128.checked_pow(shift.unsigned_abs())?)?;
        numerator
    } else {
        let denominator = 10i128.checked_pow(shift.unsigned_abs())?;
        (numerator + denominator - 1) / denominator
    };

    Some(if negative { -nanos } else { nanos })
}

/// Split a quantity into its number and its suffix's decimal and binary exponents.
fn split_suffix(value: &str) -> (&str, i32, u32) {
    const BINARY: [(&str, u32); 6] = [
        ("Ki", 10),
        ("Mi", 20),
        ("Gi", 30),
        ("Ti", 40),
        ("Pi", 50),
        ("Ei", 60),
    ];
    const DECIMAL: [(char, i32); 9] = [
        ('n', -9),
        ('u', -6),
        ('m', -3),
        ('k', 3),
        ('M', 6),
        ('G', 9),
        ('T', 12),
        ('P', 15),
        ('E', 18),
    ];

    for (suffix, exp2) in BINARY {
        if let Some(number) = value.strip_suffix(suffix) {
            return (number, 0, exp2);
        }
    }
    for (suffix, exp10) in DECIMAL {
        if let Some(number) = value.strip_suffix(suffix) {
            return (number, exp10, 0);
        }
    }
    (value, 0, 0)
}

/// Whether two quantities have the same value. Unparseable quantities fall back to
/// string equality.
#[must_use]
pub fn quantities_equal(a: &Quantity, b: &Quantity) -> bool {
    match (parse_nanos(&a.0), parse_nanos(&b.0)) {
        (Some(a), Some(b)) => a == b,
        _ => a.0 == b.0,
    }
}

/// Whether two resource lists hold the same resources with the same values.
#[must_use]
pub fn resource_lists_equal(a: &BTreeMap<String, Quantity>, b: &BTreeMap<String, Quantity>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(name, qa)| b.get(name).is_some_and(|qb| quantities_equal(qa, qb)))
}

/// Same as [`resource_lists_equal`], treating a missing list as empty.
#[must_use]
pub fn optional_resource_lists_equal(
    a: Option<&BTreeMap<String, Quantity>>,
    b: Option<&BTreeMap<String, Quantity>>,
) -> bool {
    let empty = BTreeMap::new();
    resource_lists_equal(a.unwrap_or(&empty), b.unwrap_or(&empty))
}

#[cfg(test)]
#[path = "quantity_tests.rs"]
mod quantity_tests;

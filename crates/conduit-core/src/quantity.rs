//! Bounded-precision quantities.
//!
//! The host score store only holds 32-bit integers, so every stored
//! quantity is split into a mantissa and a decimal exponent. The mantissa
//! is kept at or below [`MANTISSA_LIMIT`] by dividing by 1000 and bumping
//! the exponent by 3 until it fits, then flooring. Values above the limit
//! therefore lose their low digits; that rounding is part of the stored
//! format and must not change.

use serde::{Deserialize, Serialize};

/// Largest mantissa kept without rescaling.
pub const MANTISSA_LIMIT: u64 = 1_000_000_000;

/// Exponent step applied per rescale.
pub const EXPONENT_STEP: i32 = 3;

/// A quantity stored as `mantissa * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScaledQuantity {
    pub mantissa: i32,
    pub exponent: i32,
}

impl ScaledQuantity {
    pub const ZERO: ScaledQuantity = ScaledQuantity {
        mantissa: 0,
        exponent: 0,
    };

    pub const fn new(mantissa: i32, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    /// Reconstructed value. See [`combine`].
    pub fn value(self) -> u64 {
        combine(self.mantissa, self.exponent)
    }

    /// Re-normalize the reconstructed value. A no-op for pairs produced by
    /// [`normalize`].
    pub fn renormalized(self) -> Self {
        normalize(self.value())
    }
}

impl From<u64> for ScaledQuantity {
    fn from(raw: u64) -> Self {
        normalize(raw)
    }
}

/// Split `raw` into a mantissa at most [`MANTISSA_LIMIT`] and an exponent
/// that is a multiple of 3.
pub fn normalize(raw: u64) -> ScaledQuantity {
    let mut mantissa = raw;
    let mut exponent = 0;
    while mantissa > MANTISSA_LIMIT {
        mantissa /= 1000;
        exponent += EXPONENT_STEP;
    }
    // mantissa <= 1e9 < i32::MAX
    ScaledQuantity::new(mantissa as i32, exponent)
}

/// `mantissa * 10^exponent`, saturating at `u64::MAX`. Negative parts
/// read as zero.
pub fn combine(mantissa: i32, exponent: i32) -> u64 {
    if mantissa <= 0 {
        return 0;
    }
    let exponent = exponent.max(0) as u32;
    10u64
        .checked_pow(exponent)
        .and_then(|scale| (mantissa as u64).checked_mul(scale))
        .unwrap_or(u64::MAX)
}

/// The value `raw` reads back as once stored: `combine(normalize(raw))`.
pub fn quantize(raw: u64) -> u64 {
    normalize(raw).value()
}

/// The smallest storable value at or above `raw`.
pub fn quantize_up(raw: u64) -> u64 {
    let mut up = raw;
    // Crossing into the next exponent band can land between storable
    // values once; the second step always settles.
    for _ in 0..3 {
        let down = quantize(up);
        if down == up {
            return up;
        }
        let step = combine(1, normalize(up).exponent);
        up = down.saturating_add(step);
    }
    up
}

/// The largest amount up to `amount` that can leave a store holding `from`
/// and enter one holding `to` with both sides landing exactly on storable
/// values. Both `from` and `to` must already be storable.
pub fn exact_transfer(from: u64, to: u64, amount: u64) -> u64 {
    let mut x = amount.min(from);
    for _ in 0..8 {
        if x == 0 {
            return 0;
        }
        let out = from.saturating_sub(quantize_up(from - x));
        let into = quantize(to.saturating_add(out)).saturating_sub(to);
        if out == x && into == x {
            return x;
        }
        x = out.min(into);
    }
    0
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

const ENERGY_UNITS: [(f64, &str); 4] = [(1e12, "TDE"), (1e9, "GDE"), (1e6, "MDE"), (1e3, "kDE")];

/// Format an energy amount with the largest fitting unit and up to two
/// decimals: `15300` is `"15.3 kDE"`, `1048576` is `"1.05 MDE"`.
pub fn format_energy(value: u64) -> String {
    let raw = value as f64;
    let (scaled, unit) = ENERGY_UNITS
        .iter()
        .find(|(threshold, _)| raw >= *threshold)
        .map(|(threshold, unit)| (raw / threshold, *unit))
        .unwrap_or((raw, "DE"));
    format!("{} {unit}", trim_decimals(&format!("{scaled:.2}")))
}

/// Multiplier for an energy unit suffix.
pub fn energy_unit_multiplier(unit: &str) -> Option<f64> {
    match unit {
        "DE" => Some(1.0),
        "kDE" => Some(1e3),
        "MDE" => Some(1e6),
        "GDE" => Some(1e9),
        "TDE" => Some(1e12),
        _ => None,
    }
}

/// Format a fluid amount with one decimal: `mB` below a million, `kB`
/// below a billion, `MB` above.
pub fn format_fluid(value: u64) -> String {
    let raw = value as f64;
    let (scaled, unit) = if raw >= 1e9 {
        (raw / 1e6, "MB")
    } else if raw >= 1e6 {
        (raw / 1e3, "kB")
    } else {
        (raw, "mB")
    };
    format!("{scaled:.1} {unit}")
}

/// Multiplier for a fluid unit suffix. `B` and `kB` both mean a thousand.
pub fn fluid_unit_multiplier(unit: &str) -> Option<f64> {
    match unit {
        "mB" => Some(1.0),
        "B" | "kB" => Some(1e3),
        "MB" => Some(1e6),
        _ => None,
    }
}

fn trim_decimals(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_untouched() {
        assert_eq!(normalize(0), ScaledQuantity::ZERO);
        assert_eq!(normalize(999), ScaledQuantity::new(999, 0));
        assert_eq!(normalize(1_000_000_000), ScaledQuantity::new(1_000_000_000, 0));
    }

    #[test]
    fn overflow_divides_by_thousand() {
        let q = normalize(2_500_000_000);
        assert_eq!(q, ScaledQuantity::new(2_500_000, 3));
        assert_eq!(q.value(), 2_500_000_000);
    }

    #[test]
    fn overflow_floors_low_digits() {
        let q = normalize(2_500_000_999);
        assert_eq!(q, ScaledQuantity::new(2_500_000, 3));
        assert_eq!(q.value(), 2_500_000_000);
    }

    #[test]
    fn multiple_steps() {
        let q = normalize(5_000_000_000_000_000);
        assert_eq!(q, ScaledQuantity::new(5_000_000, 9));
    }

    #[test]
    fn renormalize_is_noop() {
        let q = normalize(123_456_789_012);
        assert_eq!(q.renormalized(), q);
    }

    #[test]
    fn combine_saturates() {
        assert_eq!(combine(1_000_000_000, 30), u64::MAX);
        assert_eq!(combine(-5, 3), 0);
        assert_eq!(combine(7, -2), 7);
    }

    #[test]
    fn quantize_rounds_down_and_up() {
        assert_eq!(quantize(500), 500);
        assert_eq!(quantize(2_000_000_999), 2_000_000_000);
        assert_eq!(quantize_up(500), 500);
        assert_eq!(quantize_up(1_999_999_001), 2_000_000_000);
        assert_eq!(quantize_up(2_000_000_000), 2_000_000_000);
    }

    #[test]
    fn quantize_up_across_an_exponent_band() {
        // 1e12 + 1000 stores with exponent 6, so the next value up is 1e12 + 1e6.
        assert_eq!(quantize_up(1_000_000_000_500), 1_000_001_000_000);
    }

    #[test]
    fn exact_transfer_lands_on_storable_values() {
        assert_eq!(exact_transfer(500, 900, 300), 300);
        assert_eq!(exact_transfer(200, 0, 300), 200);
        // Below one storage step of the source nothing can move.
        assert_eq!(exact_transfer(2_000_000_000, 0, 999), 0);
        assert_eq!(exact_transfer(2_000_000_000, 0, 1_500), 1_000);
        // The target's step limits a small source too.
        assert_eq!(exact_transfer(5_000, 2_000_000_000, 1_500), 1_000);
    }

    #[test]
    fn energy_formatting() {
        assert_eq!(format_energy(500), "500 DE");
        assert_eq!(format_energy(15_300), "15.3 kDE");
        assert_eq!(format_energy(1_048_576), "1.05 MDE");
        assert_eq!(format_energy(2_000_000_000), "2 GDE");
        assert_eq!(format_energy(3_500_000_000_000), "3.5 TDE");
        assert_eq!(format_energy(0), "0 DE");
    }

    #[test]
    fn fluid_formatting() {
        assert_eq!(format_fluid(5000), "5000.0 mB");
        assert_eq!(format_fluid(2_500_000), "2500.0 kB");
        assert_eq!(format_fluid(3_000_000_000), "3000.0 MB");
    }

    #[test]
    fn unit_multipliers() {
        assert_eq!(energy_unit_multiplier("kDE"), Some(1e3));
        assert_eq!(energy_unit_multiplier("mB"), None);
        assert_eq!(fluid_unit_multiplier("B"), Some(1e3));
        assert_eq!(fluid_unit_multiplier("MB"), Some(1e6));
    }
}

use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Number of frames in a ledger fill bar (0..=48).
pub const BAR_FRAMES: u32 = 48;

/// Fraction `part / whole`, clamped to `[0, 1]`. A zero `whole` yields 0.
///
/// Both operands are reduced by a common power of ten until they fit the
/// integer range of [`Fixed64`], so very large quantities still produce a
/// meaningful ratio.
pub fn ratio(part: u64, whole: u64) -> Fixed64 {
    if whole == 0 {
        return Fixed64::ZERO;
    }
    let mut p = part.min(whole);
    let mut w = whole;
    while w > i32::MAX as u64 {
        p /= 10;
        w /= 10;
    }
    if w == 0 {
        return Fixed64::ZERO;
    }
    let r = Fixed64::from_num(p) / Fixed64::from_num(w);
    r.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Bar frame for a fill ratio: `floor(ratio * 48)`, clamped to `0..=48`.
pub fn bar_frame(ratio: Fixed64) -> u32 {
    let scaled = (ratio * Fixed64::from_num(BAR_FRAMES)).floor();
    scaled.to_num::<i64>().clamp(0, BAR_FRAMES as i64) as u32
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_half() {
        assert_eq!(ratio(500, 1000), Fixed64::from_num(0.5));
    }

    #[test]
    fn ratio_zero_whole_is_zero() {
        assert_eq!(ratio(10, 0), Fixed64::ZERO);
    }

    #[test]
    fn ratio_clamps_overfull() {
        assert_eq!(ratio(2000, 1000), Fixed64::ONE);
    }

    #[test]
    fn ratio_handles_huge_values() {
        let r = ratio(5_000_000_000_000, 10_000_000_000_000);
        assert_eq!(r, Fixed64::from_num(0.5));
    }

    #[test]
    fn bar_frame_bounds() {
        assert_eq!(bar_frame(Fixed64::ZERO), 0);
        assert_eq!(bar_frame(Fixed64::ONE), 48);
        assert_eq!(bar_frame(Fixed64::from_num(0.5)), 24);
    }

    #[test]
    fn bar_frame_floors() {
        // 0.99 * 48 = 47.52
        assert_eq!(bar_frame(ratio(99, 100)), 47);
    }
}

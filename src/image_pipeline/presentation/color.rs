use crate::image_pipeline::presentation::types::{CieLabColor, ConfidenceTier};

const FULL: f64 = 65535.0;

fn channel(value: f64) -> u16 {
    value.round().clamp(0.0, FULL) as u16
}

/// Outline colour for a confidence, interpolated within its tier.
///
/// Green runs from `[FFFF, AAAA, FFFF]` down to `[FFFF, 0000, FFFF]` at 1.0,
/// yellow from `[FFFF, AAAA, FFFF]` at 0.8 towards `[FFFF, E000, F000]`, and
/// red from `[FFFF, FFFF, F000]` at 0.65 downwards.
pub fn tier_color(confidence: f64) -> (ConfidenceTier, CieLabColor) {
    let c = confidence.clamp(0.0, 1.0);
    let tier = ConfidenceTier::classify(c);
    let lab = match tier {
        ConfidenceTier::Green => [0xFFFF, channel((1.0 - c) / 0.2 * f64::from(0xAAAAu16)), 0xFFFF],
        ConfidenceTier::Yellow => {
            let t = (0.8 - c) / 0.15;
            [
                0xFFFF,
                channel(t * f64::from(0x3556u16) + f64::from(0xAAAAu16)),
                channel(t * -4095.0 + FULL),
            ]
        }
        ConfidenceTier::Red => {
            let t = (0.65 - c) / 0.15;
            [channel(t * -4095.0 + FULL), channel(t * -8191.0 + FULL), 0xF000]
        }
    };
    (tier, CieLabColor(lab))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_color(0.81).0, ConfidenceTier::Green);
        assert_eq!(tier_color(0.8).0, ConfidenceTier::Yellow);
        assert_eq!(tier_color(0.66).0, ConfidenceTier::Yellow);
        assert_eq!(tier_color(0.65).0, ConfidenceTier::Red);
        assert_eq!(tier_color(0.0).0, ConfidenceTier::Red);
    }

    #[test]
    fn test_boundary_colours() {
        assert_eq!(tier_color(1.0).1, CieLabColor([0xFFFF, 0x0000, 0xFFFF]));
        assert_eq!(tier_color(0.9).1, CieLabColor([0xFFFF, 0x5555, 0xFFFF]));
        assert_eq!(tier_color(0.8).1, CieLabColor([0xFFFF, 0xAAAA, 0xFFFF]));
        assert_eq!(tier_color(0.65).1, CieLabColor([0xFFFF, 0xFFFF, 0xF000]));
        assert_eq!(tier_color(0.5).1, CieLabColor([0xF000, 0xE000, 0xF000]));
    }

    #[test]
    fn test_yellow_approaches_orange_at_lower_bound() {
        let CieLabColor([l, a, b]) = tier_color(0.650_001).1;
        assert_eq!(l, 0xFFFF);
        assert!((i32::from(a) - 0xE000).abs() <= 1);
        assert!((i32::from(b) - 0xF000).abs() <= 1);
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        assert_eq!(tier_color(1.2), tier_color(1.0));
        assert_eq!(tier_color(-0.5), tier_color(0.0));
    }
}

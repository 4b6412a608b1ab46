//! Hex color parsing.
//!
//! Colors arrive as `#RRGGBB` or `#RGB` strings (the `#` is optional). The
//! digits are split into three equal groups and each group is read as a
//! base-16 channel value. A 3-digit string therefore yields channels in
//! `0..=15`, not the CSS-style doubled form.

use image::{Rgb, Rgba};

use crate::error::{Error, Result};

/// Parse a hex color string into an RGB triple.
///
/// # Errors
///
/// Returns [`Error::InvalidColorFormat`] if the string does not hold exactly
/// 3 or 6 hex digits.
pub fn parse_color(hex: &str) -> Result<Rgb<u8>> {
    let invalid = || Error::InvalidColorFormat(hex.to_string());

    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let group = match digits.len() {
        3 => 1,
        6 => 2,
        _ => return Err(invalid()),
    };

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let start = i * group;
        *channel = u8::from_str_radix(&digits[start..start + group], 16).map_err(|_| invalid())?;
    }

    Ok(Rgb(channels))
}

/// Parse a hex color and attach an opacity as the alpha channel.
///
/// # Errors
///
/// Returns [`Error::InvalidColorFormat`] if `hex` is malformed.
pub fn hex_to_rgba(hex: &str, opacity: u8) -> Result<Rgba<u8>> {
    parse_color(hex).map(|rgb| with_opacity(rgb, opacity))
}

/// Combine an RGB color with an opacity value.
#[must_use]
pub fn with_opacity(rgb: Rgb<u8>, opacity: u8) -> Rgba<u8> {
    let [r, g, b] = rgb.0;
    Rgba([r, g, b, opacity])
}

/// Render an RGB color as an upper-case `#RRGGBB` string.
#[must_use]
pub fn to_hex(rgb: Rgb<u8>) -> String {
    let [r, g, b] = rgb.0;
    format!("#{r:02X}{g:02X}{b:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_colors() {
        assert_eq!(parse_color("#FF0000").unwrap(), Rgb([255, 0, 0]));
        assert_eq!(parse_color("#feffff").unwrap(), Rgb([254, 255, 255]));
        assert_eq!(parse_color("00ff7f").unwrap(), Rgb([0, 255, 127]));
    }

    #[test]
    fn three_digit_colors_use_single_digit_groups() {
        assert_eq!(parse_color("#F00").unwrap(), Rgb([15, 0, 0]));
        assert_eq!(parse_color("abc").unwrap(), Rgb([10, 11, 12]));
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "#", "#FF00", "#FF000", "#FF00000", "#GGGGGG", "#12345z", "#FFFFFFFFF"] {
            let err = parse_color(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidColorFormat(ref s) if s == bad),
                "{bad:?} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn rejects_non_ascii_without_panicking() {
        assert!(parse_color("#ÿÿÿ").is_err());
        assert!(parse_color("１２３").is_err());
    }

    #[test]
    fn red_with_quarter_opacity() {
        assert_eq!(hex_to_rgba("#FF0000", 64).unwrap(), Rgba([255, 0, 0, 64]));
    }

    #[test]
    fn hex_round_trip_over_channel_extremes() {
        for r in [0u8, 1, 127, 128, 254, 255] {
            for g in [0u8, 15, 16, 200] {
                for b in [0u8, 99, 255] {
                    let rgb = Rgb([r, g, b]);
                    assert_eq!(parse_color(&to_hex(rgb)).unwrap(), rgb);
                }
            }
        }
    }

    #[test]
    fn to_hex_is_upper_case() {
        assert_eq!(to_hex(Rgb([254, 255, 255])), "#FEFFFF");
        assert_eq!(to_hex(Rgb([0, 10, 171])), "#000AAB");
    }
}

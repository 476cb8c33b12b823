//! Aspect ratio to pixel dimension mapping.

/// Default base size: the geometric-mean side length targeted by [`image_dimensions`].
pub const DEFAULT_BASE_SIZE: u32 = 512;

/// Inference models expect both sides to be divisible by this.
const ALIGNMENT: u32 = 16;

/// Target width and height sent to the inference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Width in pixels, a multiple of 16.
    pub width: u32,
    /// Height in pixels, a multiple of 16.
    pub height: u32,
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parse `"w/h"` (or `"w:h"`) into its two positive ratio parts.
///
/// # Errors
///
/// Returns an error if the separator is missing or either part is not a
/// positive, finite number.
pub fn parse_ratio(ratio: &str) -> Result<(f64, f64), String> {
    let (w, h) = ratio
        .split_once('/')
        .or_else(|| ratio.split_once(':'))
        .ok_or_else(|| format!("Malformed aspect ratio '{ratio}'. Expected 'w/h'."))?;

    let parse_part = |part: &str| -> Result<f64, String> {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| format!("Malformed aspect ratio '{ratio}': '{part}' is not a number"))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(format!("Malformed aspect ratio '{ratio}': parts must be positive"))
        }
    };

    Ok((parse_part(w)?, parse_part(h)?))
}

/// Compute the pixel dimensions for an aspect ratio.
///
/// The ratio is scaled so the geometric mean of the sides is roughly
/// `base_size`, each side is rounded to the nearest pixel, then floored to a
/// multiple of 16.
///
/// # Errors
///
/// Returns an error if the ratio cannot be parsed (see [`parse_ratio`]) or a
/// side would floor to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn image_dimensions(ratio: &str, base_size: u32) -> Result<ImageDimensions, String> {
    let (width_ratio, height_ratio) = parse_ratio(ratio)?;
    let scale = f64::from(base_size) / (width_ratio * height_ratio).sqrt();

    let rounded_width = (width_ratio * scale).round() as u32;
    let rounded_height = (height_ratio * scale).round() as u32;

    let dims = ImageDimensions {
        width: rounded_width / ALIGNMENT * ALIGNMENT,
        height: rounded_height / ALIGNMENT * ALIGNMENT,
    };
    if dims.width == 0 || dims.height == 0 {
        return Err(format!(
            "Base size {base_size} is too small for aspect ratio '{ratio}' ({dims})"
        ));
    }
    Ok(dims)
}

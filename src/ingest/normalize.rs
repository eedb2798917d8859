use anyhow::{anyhow, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelFormat {
    Rgb24,
    /// Packed YUV 4:2:2, the usual USB webcam default.
    Yuyv,
}

/// Normalize a captured buffer to packed RGB24, validating its length
/// against the negotiated dimensions.
pub(crate) fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    match format {
        PixelFormat::Rgb24 => {
            let expected = (width as usize)
                .checked_mul(height as usize)
                .and_then(|v| v.checked_mul(3))
                .ok_or_else(|| anyhow!("RGB frame dimensions overflow"))?;
            if pixels.len() != expected {
                return Err(anyhow!(
                    "RGB frame length mismatch: expected {}, got {}",
                    expected,
                    pixels.len()
                ));
            }
            Ok(pixels.to_vec())
        }
        PixelFormat::Yuyv => yuyv_to_rgb(pixels, width, height),
    }
}

fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    if w % 2 != 0 {
        return Err(anyhow!("YUYV frames require an even width, got {}", w));
    }
    let expected = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(2))
        .ok_or_else(|| anyhow!("YUYV frame dimensions overflow"))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "YUYV frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    // Each 4-byte group Y0 U Y1 V encodes two horizontally adjacent pixels
    // sharing one chroma pair.
    let mut rgb = vec![0u8; w * h * 3];
    for (group, out) in pixels.chunks_exact(4).zip(rgb.chunks_exact_mut(6)) {
        let u = group[1] as f32 - 128.0;
        let v = group[3] as f32 - 128.0;
        for (i, &y) in [group[0], group[2]].iter().enumerate() {
            let y = y as f32;
            out[i * 3] = clamp_to_u8(y + 1.402_f32 * v);
            out[i * 3 + 1] = clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v);
            out[i * 3 + 2] = clamp_to_u8(y + 1.772_f32 * u);
        }
    }

    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_gray_converts_to_gray() -> Result<()> {
        // Y=128, U=V=128 is mid gray for every pixel.
        let yuyv = vec![128u8; 2 * 2 * 2];
        let rgb = normalize_to_rgb(&yuyv, 2, 2, PixelFormat::Yuyv)?;
        assert_eq!(rgb, vec![128u8; 12]);
        Ok(())
    }

    #[test]
    fn yuyv_rejects_odd_width() {
        assert!(normalize_to_rgb(&[0u8; 6], 3, 1, PixelFormat::Yuyv).is_err());
    }

    #[test]
    fn rgb_pass_through_validates_length() -> Result<()> {
        let pixels = vec![1u8; 9];
        let rgb = normalize_to_rgb(&pixels, 1, 3, PixelFormat::Rgb24)?;
        assert_eq!(rgb, pixels);
        Ok(())
    }
}

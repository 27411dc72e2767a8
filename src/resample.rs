//! Separable Lanczos resampling.
//!
//! Each axis is filtered independently with a Lanczos kernel of radius
//! [`LANCZOS_RADIUS`].  When shrinking, the kernel is stretched by the scale
//! factor so that it acts as a low-pass filter over every source pixel that
//! maps into an output pixel; this is what keeps 16x16 icons cut from large
//! sources free of aliasing.  The four channels are filtered independently
//! with the same weights, and alpha is not premultiplied.

use crate::image::PixelBuffer;
use std::f32::consts::PI;

//===========================================================================//

/// The radius (`a`) of the Lanczos window.
pub const LANCZOS_RADIUS: f32 = 3.0;

//===========================================================================//

/// Resamples `image` to exactly `width` x `height` pixels.
///
/// Panics if `width` or `height` is zero.
pub fn resize(image: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    assert!(
        width > 0 && height > 0,
        "Invalid target size ({}x{}); both dimensions must be nonzero",
        width,
        height
    );
    let src_width = image.width() as usize;
    let src_height = image.height() as usize;
    let dst_width = width as usize;
    let dst_height = height as usize;
    let rgba = image.rgba_data();

    // Horizontal pass: src_width x src_height -> dst_width x src_height.
    let columns = contributions(src_width, dst_width);
    let mut horizontal = vec![0f32; dst_width * src_height * 4];
    for y in 0..src_height {
        let src_row = &rgba[y * src_width * 4..][..src_width * 4];
        let dst_row = &mut horizontal[y * dst_width * 4..][..dst_width * 4];
        for (dst, weights) in dst_row.chunks_exact_mut(4).zip(&columns) {
            for &(x, weight) in weights.iter() {
                let src = &src_row[x * 4..x * 4 + 4];
                for channel in 0..4 {
                    dst[channel] += src[channel] as f32 * weight;
                }
            }
        }
    }

    // Vertical pass: dst_width x src_height -> dst_width x dst_height.
    let rows = contributions(src_height, dst_height);
    let mut output = vec![0u8; dst_width * dst_height * 4];
    for (dst_row, weights) in output.chunks_exact_mut(dst_width * 4).zip(&rows)
    {
        for x in 0..dst_width {
            let mut sums = [0f32; 4];
            for &(y, weight) in weights.iter() {
                let src = &horizontal[(y * dst_width + x) * 4..][..4];
                for channel in 0..4 {
                    sums[channel] += src[channel] * weight;
                }
            }
            for channel in 0..4 {
                dst_row[x * 4 + channel] = to_channel(sums[channel]);
            }
        }
    }

    PixelBuffer::from_rgba_data(width, height, output)
}

//===========================================================================//

/// The Lanczos kernel: `sinc(x) * sinc(x / a)` inside the window, zero
/// outside.
#[inline]
fn lanczos(x: f32) -> f32 {
    let x = x.abs();
    if x < f32::EPSILON {
        1.0
    } else if x >= LANCZOS_RADIUS {
        0.0
    } else {
        let pi_x = PI * x;
        let pi_x_a = pi_x / LANCZOS_RADIUS;
        (pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x_a)
    }
}

/// For each of `dst_len` output samples along one axis, computes the source
/// indices it reads and their normalized weights.  Indices that fall outside
/// `0..src_len` are clamped to the nearest edge sample.
fn contributions(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f32 / dst_len as f32;
    let filter_scale = scale.max(1.0);
    let support = LANCZOS_RADIUS * filter_scale;
    let last = src_len as isize - 1;
    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * scale - 0.5;
            let start = (center - support).floor() as isize;
            let end = (center + support).ceil() as isize;
            let mut weights: Vec<(usize, f32)> = (start..=end)
                .filter_map(|j| {
                    let weight = lanczos((j as f32 - center) / filter_scale);
                    if weight == 0.0 {
                        None
                    } else {
                        Some((j.clamp(0, last) as usize, weight))
                    }
                })
                .collect();
            let total: f32 = weights.iter().map(|&(_, w)| w).sum();
            if total.abs() > f32::EPSILON {
                for (_, weight) in weights.iter_mut() {
                    *weight /= total;
                }
            } else {
                // Degenerate window; fall back to the nearest sample.
                let nearest = (center.round() as isize).clamp(0, last);
                weights = vec![(nearest as usize, 1.0)];
            }
            weights
        })
        .collect()
}

#[inline]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{contributions, lanczos, resize};
    use crate::image::PixelBuffer;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let x_max = (width - 1).max(1);
        let y_max = (height - 1).max(1);
        let mut rgba = Vec::new();
        for y in 0..height {
            for x in 0..width {
                rgba.push((x * 255 / x_max) as u8);
                rgba.push((y * 255 / y_max) as u8);
                rgba.push(((x + y) % 256) as u8);
                rgba.push(255 - (x % 256) as u8);
            }
        }
        PixelBuffer::from_rgba_data(width, height, rgba)
    }

    #[test]
    fn kernel_shape() {
        assert_eq!(lanczos(0.0), 1.0);
        assert!(lanczos(1.0).abs() < 1e-6);
        assert!(lanczos(2.0).abs() < 1e-6);
        assert_eq!(lanczos(3.0), 0.0);
        assert_eq!(lanczos(-4.5), 0.0);
        assert!(lanczos(1.5) < 0.0);
        assert!((lanczos(0.5) - lanczos(-0.5)).abs() < 1e-6);
    }

    #[test]
    fn weights_are_normalized() {
        for &(src, dst) in &[(512, 16), (300, 48), (7, 7), (3, 256), (1, 5)] {
            for weights in contributions(src, dst) {
                let total: f32 = weights.iter().map(|&(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-4, "{} -> {}", src, dst);
                assert!(weights.iter().all(|&(index, _)| index < src));
            }
        }
    }

    #[test]
    fn downscale_support_widens() {
        let shrink = contributions(512, 16);
        let same = contributions(16, 16);
        assert!(shrink[8].len() > same[8].len());
    }

    #[test]
    fn exact_output_size() {
        let image = gradient(37, 23);
        for &size in &[256, 128, 64, 48, 32, 16, 1] {
            let resized = resize(&image, size, size);
            assert_eq!(resized.width(), size);
            assert_eq!(resized.height(), size);
            let len = (size * size * 4) as usize;
            assert_eq!(resized.rgba_data().len(), len);
        }
    }

    #[test]
    fn solid_color_is_preserved() {
        let image = PixelBuffer::filled(512, 512, [255, 0, 0, 255]);
        for &size in &[256, 48, 16] {
            let resized = resize(&image, size, size);
            assert!(resized
                .rgba_data()
                .chunks_exact(4)
                .all(|pixel| pixel == [255, 0, 0, 255]));
        }
    }

    #[test]
    fn partial_alpha_is_not_premultiplied() {
        let image = PixelBuffer::filled(40, 40, [200, 100, 50, 128]);
        let resized = resize(&image, 10, 10);
        assert_eq!(resized.pixel(5, 5), [200, 100, 50, 128]);
    }

    #[test]
    fn identity_size_keeps_pixels() {
        let image = gradient(9, 9);
        assert_eq!(resize(&image, 9, 9), image);
    }

    #[test]
    fn upscale_single_pixel() {
        let image = PixelBuffer::filled(1, 1, [1, 2, 3, 4]);
        let resized = resize(&image, 5, 3);
        assert!(resized.rgba_data().chunks_exact(4).all(|p| p == [1, 2, 3, 4]));
    }

    #[test]
    fn deterministic() {
        let image = gradient(100, 60);
        assert_eq!(resize(&image, 32, 32), resize(&image, 32, 32));
    }

    #[test]
    #[should_panic(expected = "Invalid target size")]
    fn zero_target_panics() {
        resize(&PixelBuffer::filled(4, 4, [0; 4]), 0, 4);
    }
}

//===========================================================================//

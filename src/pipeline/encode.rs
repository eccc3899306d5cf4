//! Image preparation: downscale, stretch levels, boost contrast, encode as
//! base64 PNG.
//!
//! Phone photos of ID cards are routinely 12+ megapixels. Small VLMs gain
//! nothing from that resolution and pay for it in latency and tokens, so the
//! image is capped by both its longest side and its total pixel count before
//! encoding. Faded laminated cards then get a per-channel level stretch
//! (1 % clipped at each end) and a mild contrast boost around the mean grey.

use crate::config::ExtractionConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Scale factor (≤ 1.0) that fits `width × height` within both limits.
pub fn downscale_factor(width: u32, height: u32, max_side: u32, max_pixels: u64) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let longest = width.max(height) as f64;
    let side_scale = (max_side as f64 / longest).min(1.0);
    let area = width as f64 * height as f64;
    let pixel_scale = (max_pixels as f64 / area).sqrt().min(1.0);
    side_scale.min(pixel_scale)
}

/// Convert to RGB, downscale within the configured limits, then apply
/// [`autocontrast`] and [`enhance_contrast`].
pub fn preprocess(img: &DynamicImage, config: &ExtractionConfig) -> DynamicImage {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (w, h) = (rgb.width(), rgb.height());
    let scale = downscale_factor(w, h, config.max_side, config.max_pixels);

    let resized = if scale < 1.0 {
        let nw = ((w as f64 * scale) as u32).max(1);
        let nh = ((h as f64 * scale) as u32).max(1);
        debug!("Downscaling {}x{} → {}x{}", w, h, nw, nh);
        rgb.resize_exact(nw, nh, FilterType::Lanczos3)
    } else {
        rgb
    };

    let mut out = resized.into_rgb8();
    if let Some(cutoff) = config.autocontrast_cutoff {
        autocontrast(&mut out, cutoff);
    }
    if config.contrast != 1.0 {
        enhance_contrast(&mut out, config.contrast);
    }
    DynamicImage::ImageRgb8(out)
}

/// Stretch each channel so its darkest and brightest samples span 0–255.
///
/// `cutoff_percent` of the samples are discarded from each end of every
/// channel histogram first, so a few specks of glare or shadow do not pin the
/// range. A channel with a single remaining level is left untouched.
pub fn autocontrast(img: &mut RgbImage, cutoff_percent: f32) {
    let mut hist = [[0u64; 256]; 3];
    for px in img.pixels() {
        for (c, &v) in px.0.iter().enumerate() {
            hist[c][v as usize] += 1;
        }
    }

    let luts = hist.map(|h| level_lut(h, cutoff_percent));
    for px in img.pixels_mut() {
        for (c, v) in px.0.iter_mut().enumerate() {
            *v = luts[c][*v as usize];
        }
    }
}

fn level_lut(mut h: [u64; 256], cutoff_percent: f32) -> [u8; 256] {
    let total: u64 = h.iter().sum();
    let cut = (total as f64 * cutoff_percent as f64 / 100.0) as u64;

    if cut > 0 {
        trim_tail(h.iter_mut(), cut);
        trim_tail(h.iter_mut().rev(), cut);
    }

    let lo = h.iter().position(|&n| n > 0);
    let hi = h.iter().rposition(|&n| n > 0);
    let mut lut = [0u8; 256];
    match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => {
            let scale = 255.0 / (hi - lo) as f64;
            let offset = -(lo as f64) * scale;
            for (i, slot) in lut.iter_mut().enumerate() {
                *slot = (i as f64 * scale + offset).clamp(0.0, 255.0) as u8;
            }
        }
        _ => {
            for (i, slot) in lut.iter_mut().enumerate() {
                *slot = i as u8;
            }
        }
    }
    lut
}

/// Remove `cut` samples from one end of a histogram.
fn trim_tail<'a>(bins: impl Iterator<Item = &'a mut u64>, mut cut: u64) {
    for bin in bins {
        if cut > *bin {
            cut -= *bin;
            *bin = 0;
        } else {
            *bin -= cut;
            break;
        }
    }
}

/// Scale every sample's distance from the image's mean grey by `factor`.
///
/// `1.0` is the identity, `1.15` a mild boost. A uniform image is unchanged
/// whatever the factor.
pub fn enhance_contrast(img: &mut RgbImage, factor: f32) {
    let count = u64::from(img.width()) * u64::from(img.height());
    if count == 0 {
        return;
    }
    let luma_sum: u64 = img.pixels().map(|px| u64::from(luma(px.0))).sum();
    let mean = (luma_sum as f64 / count as f64 + 0.5).floor() as f32;

    let lut: Vec<u8> = (0..=255u16)
        .map(|v| (mean + factor * (f32::from(v) - mean)).clamp(0.0, 255.0) as u8)
        .collect();
    for px in img.pixels_mut() {
        for v in px.0.iter_mut() {
            *v = lut[*v as usize];
        }
    }
}

/// ITU-R 601-2 luma, fixed point.
fn luma([r, g, b]: [u8; 3]) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

/// Encode an image as a base64 PNG ready for the VLM API.
///
/// PNG keeps the printed digits crisp; JPEG artefacts around small glyphs are
/// a common cause of misread Aadhaar digits.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    /// Left half `left`, right half `right`, all channels equal.
    fn two_tone(left: u8, right: u8) -> RgbImage {
        RgbImage::from_fn(10, 10, |x, _| {
            let v = if x < 5 { left } else { right };
            Rgb([v, v, v])
        })
    }

    #[test]
    fn factor_is_one_for_small_images() {
        assert_eq!(downscale_factor(800, 600, 1800, 4_000_000), 1.0);
    }

    #[test]
    fn factor_caps_longest_side() {
        let f = downscale_factor(3600, 1000, 1800, 4_000_000);
        assert!((f - 0.5).abs() < 1e-9, "got {f}");
    }

    #[test]
    fn factor_caps_pixel_count() {
        // 1600 x 1600 = 2.56 MP; cap at 0.64 MP → scale 0.5.
        let f = downscale_factor(1600, 1600, 1800, 640_000);
        assert!((f - 0.5).abs() < 1e-9, "got {f}");
    }

    #[test]
    fn preprocess_downscales_and_converts() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 200, Rgba([200, 0, 0, 255])));
        let config = ExtractionConfig::builder().max_side(100).build().unwrap();
        let out = preprocess(&img, &config);
        assert_eq!((out.width(), out.height()), (100, 50));
        assert!(out.as_rgb8().is_some());
    }

    #[test]
    fn contrast_boost_is_mild() {
        // Mean grey 150; 200 sits 50 above it and moves to 150 + 1.15 * 50.
        let mut img = two_tone(100, 200);
        enhance_contrast(&mut img, 1.15);
        assert_eq!(img.get_pixel(9, 0).0, [207, 207, 207]);
        assert_eq!(img.get_pixel(0, 0).0, [92, 92, 92]);
    }

    #[test]
    fn contrast_leaves_uniform_image_alone() {
        let mut img = RgbImage::from_pixel(3, 3, Rgb([200, 120, 40]));
        let before = img.clone();
        enhance_contrast(&mut img, 1.0);
        assert_eq!(img, before);

        let mut grey = RgbImage::from_pixel(3, 3, Rgb([180, 180, 180]));
        enhance_contrast(&mut grey, 1.15);
        assert_eq!(grey.get_pixel(1, 1).0, [180, 180, 180]);
    }

    #[test]
    fn autocontrast_stretches_to_full_range() {
        let mut img = two_tone(50, 101);
        autocontrast(&mut img, 1.0);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(9, 9).0, [255, 255, 255]);
    }

    #[test]
    fn autocontrast_cutoff_ignores_outliers() {
        // 98 mid-grey pixels between one black and one white speck.
        let mut img = RgbImage::from_fn(10, 10, |x, y| match (x, y) {
            (0, 0) => Rgb([0, 0, 0]),
            (9, 9) => Rgb([255, 255, 255]),
            _ if x < 5 => Rgb([110, 110, 110]),
            _ => Rgb([150, 150, 150]),
        });
        autocontrast(&mut img, 1.0);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(8, 0).0, [255, 255, 255]);
    }

    #[test]
    fn autocontrast_single_level_is_identity() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([90, 90, 90]));
        autocontrast(&mut img, 1.0);
        assert_eq!(img.get_pixel(2, 2).0, [90, 90, 90]);
    }

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_image(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(!decoded.is_empty());
    }
}

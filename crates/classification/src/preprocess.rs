//! Image normalization for model input
//!
//! Turns an image file into the `[1, H, W, 3]` float tensor the classifier
//! expects. Resizing is a plain stretch to the configured size; the model
//! was trained on similarly distorted inputs, so no letterboxing.

use image::RgbImage;
use ndarray::Array4;
use std::path::Path;
use tracing::debug;

use crate::{ChannelOrder, ClassificationError, PreprocessingProfile};

/// Decode an image file and normalize it for the classifier
///
/// Fails with [`ClassificationError::Decode`] when the path does not exist
/// or the bytes are not a decodable image. Deterministic: identical input
/// bytes and profile always produce an identical tensor.
pub fn normalize_file<P: AsRef<Path>>(
    path: P,
    profile: &PreprocessingProfile,
) -> Result<Array4<f32>, ClassificationError> {
    let path = path.as_ref();
    debug!("Normalizing image: {}", path.display());

    // image::open covers both the missing-file and undecodable-bytes cases
    let img = image::open(path)?;

    // Decoders hand back varying pixel layouts; collapse to RGB exactly once
    let rgb = img.to_rgb8();

    Ok(normalize_image(&rgb, profile))
}

/// Normalize an already decoded RGB image
///
/// Resizes (no aspect-ratio preservation), orders channels per the profile,
/// applies the linear rescale and optional standardization, and prepends the
/// batch axis.
#[must_use]
pub fn normalize_image(image: &RgbImage, profile: &PreprocessingProfile) -> Array4<f32> {
    let (target_w, target_h) = (profile.input_width, profile.input_height);

    let resized = if image.dimensions() != (target_w, target_h) {
        image::imageops::resize(image, target_w, target_h, image::imageops::FilterType::Triangle)
    } else {
        image.clone()
    };

    let mut tensor = Array4::<f32>::zeros((1, target_h as usize, target_w as usize, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            let source = match profile.channel_order {
                ChannelOrder::Rgb => channel,
                ChannelOrder::Bgr => 2 - channel,
            };
            let mut value = f32::from(pixel[source]) * profile.rescale;
            if let Some(standardize) = &profile.standardize {
                value = (value - standardize.mean[channel]) / standardize.std[channel];
            }
            tensor[[0, y as usize, x as usize, channel]] = value;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Standardization;
    use image::Rgb;

    fn profile_64() -> PreprocessingProfile {
        PreprocessingProfile {
            input_height: 64,
            input_width: 64,
            ..PreprocessingProfile::default()
        }
    }

    #[test]
    fn test_normalized_shape_matches_profile() {
        let img = RgbImage::from_pixel(320, 240, Rgb([10, 20, 30]));
        let tensor = normalize_image(&img, &PreprocessingProfile::default());
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn test_tiny_and_large_images_normalize_to_configured_shape() {
        let profile = PreprocessingProfile::default();

        let tiny = RgbImage::from_pixel(1, 1, Rgb([255, 0, 128]));
        assert_eq!(normalize_image(&tiny, &profile).shape(), &[1, 224, 224, 3]);

        let large = RgbImage::from_pixel(4000, 3000, Rgb([255, 0, 128]));
        assert_eq!(normalize_image(&large, &profile).shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn test_rescale_maps_255_to_unit_range() {
        let img = RgbImage::from_pixel(64, 64, Rgb([255, 0, 51]));
        let tensor = normalize_image(&img, &profile_64());

        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 0, 0, 1]].abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_bgr_channel_order_swaps_red_and_blue() {
        let img = RgbImage::from_pixel(64, 64, Rgb([255, 0, 0]));
        let profile = PreprocessingProfile {
            channel_order: ChannelOrder::Bgr,
            ..profile_64()
        };
        let tensor = normalize_image(&img, &profile);

        // Red pixel lands in the last channel under BGR ordering
        assert!(tensor[[0, 0, 0, 0]].abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 2]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_standardization_applied_after_rescale() {
        let img = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
        let profile = PreprocessingProfile {
            standardize: Some(Standardization::imagenet()),
            ..profile_64()
        };
        let tensor = normalize_image(&img, &profile);

        let expected = (1.0 - 0.485) / 0.229;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let mut img = RgbImage::new(37, 53);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8]);
        }

        let profile = PreprocessingProfile::default();
        let first = normalize_image(&img, &profile);
        let second = normalize_image(&img, &profile);
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        let img = RgbImage::from_pixel(30, 40, Rgb([0, 128, 255]));
        img.save(&path).unwrap();

        let tensor = normalize_file(&path, &profile_64()).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 64, 3]);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = normalize_file("does/not/exist.jpg", &PreprocessingProfile::default());
        assert!(matches!(result, Err(ClassificationError::Decode(_))));
    }

    #[test]
    fn test_non_image_bytes_are_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let result = normalize_file(&path, &PreprocessingProfile::default());
        assert!(matches!(result, Err(ClassificationError::Decode(_))));
    }
}

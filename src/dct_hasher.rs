use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage};

use crate::definitions::*;
use crate::utils::dct_ops;
use crate::*;

/// Create the perceptual fingerprint of an already-decoded frame.
///
/// The frame is resampled to 32x32 with a bilinear filter (skipped when it already has that size),
/// converted to luminance, and transformed with an orthonormal DCT-II. The 8x8 lowest-frequency
/// coefficients are flattened row-major (`u * 8 + v`) and each becomes one bit: 1 when the
/// coefficient is strictly greater than the median coefficient, 0 otherwise.
///
/// The result is always 64 bits long. A frame with no pixels fails with
/// [FingerprintErrorKind::Decode] rather than producing a degenerate fingerprint.
pub fn fingerprint(image: &DynamicImage) -> Result<Fingerprint, FingerprintErrorKind> {
    fingerprint_inner(image, Path::new(""))
}

/// Decode the image at src_path and create its fingerprint. See [fingerprint].
pub fn fingerprint_path(src_path: impl AsRef<Path>) -> Result<Fingerprint, FingerprintErrorKind> {
    let src_path = src_path.as_ref();
    let image = image::open(src_path).map_err(|e| FingerprintErrorKind::Decode {
        src_path: src_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    fingerprint_inner(&image, src_path)
}

fn fingerprint_inner(image: &DynamicImage, src_path: &Path) -> Result<Fingerprint, FingerprintErrorKind> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(FingerprintErrorKind::Decode {
            src_path: src_path.to_path_buf(),
            reason: format!("image has no pixels ({}x{})", width, height),
        });
    }

    let grey = resize_grey(image);

    //row-major, so index = y * RESIZE_IMAGE_X + x
    let pixels = grey.pixels().map(|p| f64::from(p.0[0])).collect::<Vec<_>>();
    let dct = dct_ops::perform_dct(&pixels);

    Ok(bittify(&low_frequencies(&dct)))
}

fn resize_grey(image: &DynamicImage) -> GrayImage {
    if image.dimensions() == (RESIZE_IMAGE_X, RESIZE_IMAGE_Y) {
        image.to_luma8()
    } else {
        image
            .resize_exact(RESIZE_IMAGE_X, RESIZE_IMAGE_Y, FilterType::Triangle)
            .to_luma8()
    }
}

//take the top-left HASH_IMAGE_Y x HASH_IMAGE_X window of the coefficients.
//Coefficients are kept as f32, which is the precision existing fingerprints were thresholded at.
fn low_frequencies(dct: &[f64]) -> Vec<f32> {
    let rowstride = RESIZE_IMAGE_X as usize;

    dct.chunks(rowstride)
        .take(HASH_IMAGE_Y)
        .flat_map(|row| row.iter().take(HASH_IMAGE_X))
        .map(|coefficient| *coefficient as f32)
        .collect()
}

fn bittify(coefficients: &[f32]) -> Fingerprint {
    let mut sorted = coefficients.to_vec();
    sorted.sort_by(f32::total_cmp);

    //upper median: for an even count this is the element just past the middle.
    let median = sorted[sorted.len() / 2];

    Fingerprint::from_bits(coefficients.iter().map(|c| *c > median))
}

#[cfg(test)]
mod test {
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
    use rand::prelude::*;

    use super::*;

    fn random_grey(rng: &mut StdRng, width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |_, _| Luma([rng.gen_range(20..=200)]))
    }

    #[test]
    fn test_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let image = DynamicImage::ImageLuma8(random_grey(&mut rng, 123, 77));

        let fp_1 = fingerprint(&image).unwrap();
        let fp_2 = fingerprint(&image.clone()).unwrap();
        assert_eq!(fp_1, fp_2);
    }

    #[test]
    fn test_always_64_bits() {
        let mut rng = StdRng::seed_from_u64(2);
        let sizes = [(1, 1), (7, 300), (32, 32), (640, 480), (33, 31)];

        for (width, height) in sizes {
            let grey = DynamicImage::ImageLuma8(random_grey(&mut rng, width, height));
            assert_eq!(fingerprint(&grey).unwrap().len(), 64);

            let rgb = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
                Rgb([rng.gen(), rng.gen(), rng.gen()])
            }));
            assert_eq!(fingerprint(&rgb).unwrap().len(), 64);
        }
    }

    #[test]
    fn test_uniform_brightness_shift_is_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        let base = random_grey(&mut rng, 32, 32);
        let brighter = GrayImage::from_fn(32, 32, |x, y| Luma([base.get_pixel(x, y).0[0] + 30]));

        let fp_base = fingerprint(&DynamicImage::ImageLuma8(base)).unwrap();
        let fp_brighter = fingerprint(&DynamicImage::ImageLuma8(brighter)).unwrap();
        assert_eq!(fp_base, fp_brighter);
    }

    #[test]
    fn test_dc_coefficient_is_above_median() {
        //the DC term of any reasonably bright frame dwarfs the AC terms
        let mut rng = StdRng::seed_from_u64(4);
        let image = DynamicImage::ImageLuma8(random_grey(&mut rng, 32, 32));
        assert_eq!(fingerprint(&image).unwrap().bit(0), Some(true));
    }

    #[test]
    fn test_at_most_half_the_bits_are_set() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let image = DynamicImage::ImageLuma8(random_grey(&mut rng, 40, 40));
            let set_bits = fingerprint(&image).unwrap().bits().filter(|b| *b).count();
            assert!(set_bits <= 31, "set bits: {}", set_bits);
        }
    }

    #[test]
    fn test_empty_image_is_a_decode_error() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            fingerprint(&image),
            Err(FingerprintErrorKind::Decode { .. })
        ));
    }

    #[test]
    fn test_unreadable_files_are_decode_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.jpg");
        assert!(matches!(
            fingerprint_path(&missing),
            Err(FingerprintErrorKind::Decode { src_path, .. }) if src_path == missing
        ));

        let not_an_image = dir.path().join("notes.jpg");
        std::fs::write(&not_an_image, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            fingerprint_path(&not_an_image),
            Err(FingerprintErrorKind::Decode { .. })
        ));
    }

    #[test]
    fn test_path_and_image_agree() {
        let mut rng = StdRng::seed_from_u64(6);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let image = random_grey(&mut rng, 64, 48);
        image.save(&path).unwrap();

        assert_eq!(
            fingerprint_path(&path).unwrap(),
            fingerprint(&DynamicImage::ImageLuma8(image)).unwrap()
        );
    }
}

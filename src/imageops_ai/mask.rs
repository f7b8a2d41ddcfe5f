use anyhow::{anyhow, ensure, Result};
use image::{GenericImageView, ImageBuffer, Luma, Pixel, Primitive, Rgb, Rgba};
use ndarray::ArrayView2;
use num_traits::AsPrimitive;

use crate::imageops_ai::get_max_value;

/// Uses `mask` as the alpha channel of `image`.
///
/// With `premultiply` the colour channels are scaled by the mask as well, the
/// same as compositing the image over a fully transparent canvas.
pub fn apply<I, M, SI, SM>(
    image: &I,
    mask: &M,
    premultiply: bool,
) -> Result<ImageBuffer<Rgba<SI>, Vec<SI>>>
where
    I: GenericImageView<Pixel = Rgb<SI>>,
    M: GenericImageView<Pixel = Luma<SM>>,
    Rgba<SI>: Pixel<Subpixel = SI>,
    SI: Primitive + 'static + AsPrimitive<f32>,
    SM: Primitive + 'static + AsPrimitive<f32>,
    f32: AsPrimitive<SI>,
    f32: AsPrimitive<SM>,
{
    ensure!(
        image.dimensions() == mask.dimensions(),
        "Image and mask dimensions do not match: image {:?}, mask {:?}",
        image.dimensions(),
        mask.dimensions()
    );

    let sm_max: f32 = get_max_value::<SM>().as_();
    let si_max: f32 = get_max_value::<SI>().as_();

    let processed_pixels = image
        .pixels()
        .zip(mask.pixels())
        .flat_map(|(image_pixel, mask_pixel)| {
            let Rgb([red, green, blue]) = image_pixel.2;
            let coverage = mask_pixel.2 .0[0].as_() / sm_max;
            let alpha: SI = (coverage * si_max).as_();

            if premultiply {
                let scale = |c: SI| -> SI { (c.as_() * coverage).as_() };
                [scale(red), scale(green), scale(blue), alpha]
            } else {
                [red, green, blue, alpha]
            }
        })
        .collect::<Vec<SI>>();

    ImageBuffer::from_raw(image.width(), image.height(), processed_pixels)
        .ok_or_else(|| anyhow!("Failed to create ImageBuffer from processed pixels"))
}

/// Min-max normalizes a saliency map into an 8-bit mask.
///
/// A constant map has no contrast to stretch and yields an all-zero mask.
pub fn from_saliency(saliency: ArrayView2<f32>) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let (height, width) = saliency.dim();
    let (min, max) = saliency
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let pixels = saliency
        .iter()
        .map(|&v| {
            if range > 0.0 {
                (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect::<Vec<u8>>();

    ImageBuffer::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| anyhow!("Failed to create mask from a {width}x{height} saliency map"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};
    use ndarray::array;

    #[test]
    fn test_apply_sets_alpha_from_mask() -> Result<()> {
        let image = RgbImage::from_pixel(2, 1, Rgb([200, 100, 50]));
        let mask = GrayImage::from_raw(2, 1, vec![255, 0]).ok_or_else(|| anyhow!("mask"))?;

        let straight = apply(&image, &mask, false)?;
        assert_eq!(straight.get_pixel(0, 0).0, [200, 100, 50, 255]);
        assert_eq!(straight.get_pixel(1, 0).0, [200, 100, 50, 0]);

        let premultiplied = apply(&image, &mask, true)?;
        assert_eq!(premultiplied.get_pixel(0, 0).0, [200, 100, 50, 255]);
        assert_eq!(premultiplied.get_pixel(1, 0).0, [0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_apply_rejects_mismatched_mask() {
        let image = RgbImage::new(4, 4);
        let mask = GrayImage::new(2, 2);
        assert!(apply(&image, &mask, true).is_err());
    }

    #[test]
    fn test_from_saliency_stretches_range() -> Result<()> {
        let saliency = array![[0.0_f32, 0.5], [1.0, 0.0]];
        let mask = from_saliency(saliency.view())?;
        assert_eq!(mask.dimensions(), (2, 2));
        assert_eq!(mask.get_pixel(0, 0).0, [0]);
        assert_eq!(mask.get_pixel(1, 0).0, [128]);
        assert_eq!(mask.get_pixel(0, 1).0, [255]);
        Ok(())
    }

    #[test]
    fn test_from_saliency_constant_map() -> Result<()> {
        let saliency = ndarray::Array2::<f32>::from_elem((3, 5), 0.7);
        let mask = from_saliency(saliency.view())?;
        assert_eq!(mask.dimensions(), (5, 3));
        assert!(mask.pixels().all(|p| p.0[0] == 0));
        Ok(())
    }
}

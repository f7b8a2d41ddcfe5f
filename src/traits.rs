use std::io::Cursor;

use crate::errors::{BgRemoverError, Result};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

/// Decodes in-memory image bytes and applies the EXIF orientation, so a
/// phone photo taken in portrait comes out upright.
pub fn decode_oriented(input: &[u8]) -> Result<DynamicImage> {
    let decode_err = |e| BgRemoverError::image_processing("<memory>", "decode model input", e);

    let mut decoder = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .into_decoder()
        .map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;

    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Background removal model abstraction.
///
/// The conversion pipeline only depends on this trait, so the ONNX-backed
/// [`crate::Model`] and the test mocks are interchangeable.
pub trait BackgroundRemovalModel: Send + Sync {
    /// Returns the image with background pixels made transparent.
    fn segment_image(&self, img: &DynamicImage) -> Result<DynamicImage>;

    /// Raw bytes in, PNG bytes out. An empty vector means the model produced
    /// nothing. The input is turned upright per its EXIF orientation first.
    fn remove_background(&self, input: &[u8]) -> Result<Vec<u8>> {
        let img = decode_oriented(input)?;
        let cutout = self.segment_image(&img)?;

        let mut output = Vec::new();
        cutout
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| BgRemoverError::image_processing("<memory>", "encode model output", e))?;
        Ok(output)
    }
}

impl<M: BackgroundRemovalModel + ?Sized> BackgroundRemovalModel for std::sync::Arc<M> {
    fn segment_image(&self, img: &DynamicImage) -> Result<DynamicImage> {
        (**self).segment_image(img)
    }

    fn remove_background(&self, input: &[u8]) -> Result<Vec<u8>> {
        (**self).remove_background(input)
    }
}

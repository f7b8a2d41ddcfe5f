use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::errors::{BgRemoverError, Result};

/// Opens the native file dialog. `None` when the user cancels.
///
/// No extension filter is applied; validity is decided by [`validate_image`].
pub fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select Image")
        .pick_file()
}

/// Fully decodes the file to make sure it is a usable image.
///
/// The format is guessed from the content, so a mislabelled extension is
/// fine. Any failure, whether opening, sniffing or decoding, is reported as
/// [`BgRemoverError::InvalidImage`].
pub fn validate_image(path: &Path) -> Result<()> {
    let invalid = |source: image::ImageError| BgRemoverError::InvalidImage {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| invalid(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| invalid(image::ImageError::IoError(e)))?
        .decode()
        .map_err(invalid)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_valid_png_passes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("sample.png");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])).save(&path)?;

        validate_image(&path)
    }

    #[test]
    fn test_content_wins_over_extension() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let png = temp_dir.path().join("real.png");
        RgbImage::new(4, 4).save(&png)?;
        let renamed = temp_dir.path().join("mislabelled.jpg");
        fs::rename(&png, &renamed)?;

        validate_image(&renamed)
    }

    /// 1x1 24-bit BMP, bottom-up, one padded row.
    fn tiny_bmp() -> Vec<u8> {
        let mut bytes = Vec::with_capacity(58);
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&58u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&54u32.to_le_bytes());
        // BITMAPINFOHEADER
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&2835i32.to_le_bytes());
        bytes.extend_from_slice(&2835i32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // B, G, R, pad
        bytes.extend_from_slice(&[30, 20, 10, 0]);
        bytes
    }

    #[test]
    fn test_bmp_passes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("tiny.bmp");
        fs::write(&path, tiny_bmp())?;

        validate_image(&path)
    }

    #[test]
    fn test_gif_and_tiff_pass() -> Result<()> {
        let temp_dir = TempDir::new()?;
        for (name, format) in [("anim.gif", ImageFormat::Gif), ("scan.tiff", ImageFormat::Tiff)] {
            let path = temp_dir.path().join(name);
            RgbImage::from_pixel(6, 6, Rgb([200, 100, 0])).save_with_format(&path, format)?;
            validate_image(&path)?;
        }
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_invalid() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("corrupt.png");
        fs::write(&path, b"definitely not a png")?;

        let err = validate_image(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        Ok(())
    }

    #[test]
    fn test_truncated_png_is_invalid() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("truncated.png");
        RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])).save(&path)?;
        let bytes = fs::read(&path)?;
        fs::write(&path, &bytes[..bytes.len() / 2])?;

        assert!(validate_image(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let err = validate_image(Path::new("/nonexistent/cat.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
    }
}

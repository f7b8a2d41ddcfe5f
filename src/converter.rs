use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::ImageFormat;

use crate::errors::{BgRemoverError, Result};
use crate::traits::BackgroundRemovalModel;

pub const OUTPUT_SUFFIX: &str = "_removed_background";

/// `<dir>/<stem>_removed_background<.ext>`, next to the source.
pub fn output_path_for(source: &Path) -> PathBuf {
    let mut file_name = source
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    file_name.push(OUTPUT_SUFFIX);
    if let Some(extension) = source.extension() {
        file_name.push(".");
        file_name.push(extension);
    }
    source.with_file_name(file_name)
}

/// One selection gesture: where the image comes from and where the cutout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output = output_path_for(&source);
        Self { source, output }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub request: ConversionRequest,
    pub elapsed: Duration,
}

pub struct Converter<M: BackgroundRemovalModel> {
    model: M,
}

impl<M: BackgroundRemovalModel> Converter<M> {
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// Runs the model on the source file and writes the result as PNG,
    /// overwriting whatever is at the output path.
    pub fn convert(&self, request: &ConversionRequest) -> Result<ConversionOutcome> {
        let started = Instant::now();

        let input = fs::read(&request.source)
            .map_err(|e| BgRemoverError::file_system(&request.source, "read source image", e))?;

        let output = self.model.remove_background(&input)?;
        if output.is_empty() {
            return Err(BgRemoverError::model("Failed to process image"));
        }

        let image = image::load_from_memory(&output).map_err(|e| {
            BgRemoverError::image_processing(
                request.output.display(),
                "decode model output",
                e,
            )
        })?;

        image
            .save_with_format(&request.output, ImageFormat::Png)
            .map_err(|e| {
                BgRemoverError::image_processing(request.output.display(), "save output", e)
            })?;

        Ok(ConversionOutcome {
            request: request.clone(),
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::MockBackgroundRemover;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_output_path_examples() {
        let cases = [
            ("/a/b/cat.jpg", "/a/b/cat_removed_background.jpg"),
            ("/a/b/sample.png", "/a/b/sample_removed_background.png"),
            ("/a/b/archive.tar.gz", "/a/b/archive.tar_removed_background.gz"),
            ("/a/b/noext", "/a/b/noext_removed_background"),
            ("/a/b/.hidden", "/a/b/.hidden_removed_background"),
            ("relative.webp", "relative_removed_background.webp"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                output_path_for(Path::new(input)),
                PathBuf::from(expected),
                "input: {input}"
            );
        }
    }

    fn write_sample(dir: &Path, name: &str, format: ImageFormat) -> Result<PathBuf> {
        let path = dir.join(name);
        RgbImage::from_pixel(12, 8, Rgb([200, 30, 30])).save_with_format(&path, format)?;
        Ok(path)
    }

    #[test]
    fn test_output_is_png_even_for_jpeg_name() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source = write_sample(temp_dir.path(), "cat.jpg", ImageFormat::Jpeg)?;
        let request = ConversionRequest::new(&source);

        let converter = Converter::new(MockBackgroundRemover::passthrough());
        let outcome = converter.convert(&request)?;

        assert_eq!(outcome.request.output, temp_dir.path().join("cat_removed_background.jpg"));
        let bytes = fs::read(&outcome.request.output)?;
        assert_eq!(image::guess_format(&bytes)?, ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes)?;
        assert_eq!(decoded.dimensions(), (12, 8));
        Ok(())
    }

    #[test]
    fn test_existing_output_is_overwritten() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source = write_sample(temp_dir.path(), "sample.png", ImageFormat::Png)?;
        let request = ConversionRequest::new(&source);
        fs::write(&request.output, b"stale")?;

        Converter::new(MockBackgroundRemover::passthrough()).convert(&request)?;

        let bytes = fs::read(&request.output)?;
        assert_eq!(image::guess_format(&bytes)?, ImageFormat::Png);
        Ok(())
    }

    #[test]
    fn test_model_failure_message() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source = write_sample(temp_dir.path(), "sample.png", ImageFormat::Png)?;
        let request = ConversionRequest::new(&source);

        let converter = Converter::new(MockBackgroundRemover::failing("Failed to process image"));
        let err = converter.convert(&request).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModelFailure);
        assert_eq!(err.status_message(), "Error: Failed to process image");
        assert!(!request.output.exists());
        Ok(())
    }

    #[test]
    fn test_empty_model_output_is_a_failure() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source = write_sample(temp_dir.path(), "sample.png", ImageFormat::Png)?;
        let request = ConversionRequest::new(&source);

        let err = Converter::new(MockBackgroundRemover::empty())
            .convert(&request)
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to process image");
        assert!(!request.output.exists());
        Ok(())
    }

    #[test]
    fn test_missing_source_is_io_failure() {
        let request = ConversionRequest::new("/nonexistent/dir/cat.png");
        let err = Converter::new(MockBackgroundRemover::passthrough())
            .convert(&request)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}

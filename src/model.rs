use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    config::Config,
    errors::{BgRemoverError, Result},
    imageops_ai::mask,
    traits::BackgroundRemovalModel,
};
use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, Rgb32FImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

/// Input size of U²-Net when the session reports a dynamic dimension.
pub const DEFAULT_IMAGE_SIZE: u32 = 320;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub struct Model {
    pub image_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(model_path: &Path, device_id: i32, num_threads: usize) -> Result<Self> {
        let mut builder = SessionBuilder::new()
            .map_err(|e| BgRemoverError::model_with_source("Failed to create model session", e))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| {
                BgRemoverError::model_with_source("Failed to register execution providers", e)
            })?
            .with_memory_pattern(true)
            .map_err(|e| BgRemoverError::model_with_source("Failed to enable memory pattern", e))?;

        if num_threads > 0 {
            builder = builder.with_intra_threads(num_threads).map_err(|e| {
                BgRemoverError::model_with_source("Failed to set model thread count", e)
            })?;
        }

        let mut session = builder.commit_from_file(model_path).map_err(|e| {
            BgRemoverError::model_with_source(
                format!("Failed to load model {}", model_path.display()),
                e,
            )
        })?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| BgRemoverError::model("Model has no inputs"))?;
        let input_name = input.name.clone();
        let image_size = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.get(2).copied())
            .filter(|&dim| dim > 0)
            .map_or(DEFAULT_IMAGE_SIZE, |dim| dim as u32);
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| BgRemoverError::model("Model has no outputs"))?;

        // warm up
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)?])
            .map_err(|e| BgRemoverError::model_with_source("Model warm-up run failed", e))?;

        tracing::info!(
            path = %model_path.display(),
            image_size,
            input = %input_name,
            output = %output_name,
            "model loaded"
        );

        Ok(Self {
            image_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    /// Runs the network on an NCHW tensor and returns its first output.
    pub fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
        ])?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl BackgroundRemovalModel for Model {
    fn segment_image(&self, img: &DynamicImage) -> Result<DynamicImage> {
        let tensor = preprocess(&img.to_rgb32f(), self.image_size)?;
        let prediction = self.predict(tensor.view())?;
        let (width, height) = img.dimensions();
        let alpha = postprocess_mask(prediction.view(), width, height)?;

        let rgba = mask::apply(&img.to_rgb8(), &alpha, true)?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// Resizes to the model size and normalizes into a `1x3xSxS` tensor.
pub fn preprocess(image: &Rgb32FImage, image_size: u32) -> Result<Array4<f32>> {
    let image = imageops::resize(image, image_size, image_size, FilterType::Lanczos3);
    let mut tensor = image.as_ndarray3().to_owned();

    let peak = tensor.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v)).max(1e-6);
    for (channel, mut plane) in tensor.axis_iter_mut(Axis(0)).enumerate() {
        plane.mapv_inplace(|v| (v / peak - MEAN[channel]) / STD[channel]);
    }

    Ok(tensor.insert_axis(Axis(0)))
}

/// Turns the first channel of the prediction into an alpha mask of the
/// original size.
pub fn postprocess_mask(
    prediction: ArrayView4<f32>,
    width: u32,
    height: u32,
) -> Result<image::GrayImage> {
    if prediction.shape()[0] == 0 || prediction.shape()[1] == 0 {
        return Err(BgRemoverError::model("Failed to process image"));
    }
    let saliency = prediction.slice(s![0, 0, .., ..]);
    let mask = mask::from_saliency(saliency)?;
    Ok(imageops::resize(&mask, width, height, FilterType::Lanczos3))
}

/// Loads [`Model`] on first use so the window opens even when the model file
/// is missing. A failed load is retried on the next conversion.
pub struct LazyModel {
    model_path: PathBuf,
    device_id: i32,
    num_threads: usize,
    model: Mutex<Option<Arc<Model>>>,
}

impl LazyModel {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            model_path: config.resolved_model_path()?,
            device_id: config.device_id,
            num_threads: config.num_threads,
            model: Mutex::new(None),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn get(&self) -> Result<Arc<Model>> {
        let mut slot = self.model.lock();
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }
        if !self.model_path.exists() {
            return Err(BgRemoverError::model_with_source(
                format!("Model file not found: {}", self.model_path.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let model = Arc::new(Model::new(
            &self.model_path,
            self.device_id,
            self.num_threads,
        )?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }
}

impl BackgroundRemovalModel for LazyModel {
    fn segment_image(&self, img: &DynamicImage) -> Result<DynamicImage> {
        self.get()?.segment_image(img)
    }
}

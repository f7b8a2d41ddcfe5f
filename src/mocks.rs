use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::{BgRemoverError, Result};
use crate::traits::{decode_oriented, BackgroundRemovalModel};
use image::DynamicImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Returns the input as RGBA, fully opaque.
    Passthrough,
    /// Fails every call with this message.
    Fail(String),
    /// Succeeds with zero bytes of output.
    Empty,
}

/// Test double for the background removal model.
#[derive(Debug)]
pub struct MockBackgroundRemover {
    behavior: MockBehavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockBackgroundRemover {
    pub const fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub const fn passthrough() -> Self {
        Self::new(MockBehavior::Passthrough)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fail(message.into()))
    }

    pub const fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Simulates inference time.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl BackgroundRemovalModel for MockBackgroundRemover {
    fn segment_image(&self, img: &DynamicImage) -> Result<DynamicImage> {
        match &self.behavior {
            MockBehavior::Passthrough | MockBehavior::Empty => {
                Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
            }
            MockBehavior::Fail(message) => Err(BgRemoverError::model(message.clone())),
        }
    }

    fn remove_background(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.record_call();
        match &self.behavior {
            MockBehavior::Empty => Ok(Vec::new()),
            MockBehavior::Fail(message) => Err(BgRemoverError::model(message.clone())),
            MockBehavior::Passthrough => {
                let img = decode_oriented(input)?;
                let cutout = self.segment_image(&img)?;
                let mut output = Vec::new();
                cutout.write_to(
                    &mut std::io::Cursor::new(&mut output),
                    image::ImageFormat::Png,
                )?;
                Ok(output)
            }
        }
    }
}

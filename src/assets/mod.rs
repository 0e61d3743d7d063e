//! Visual inputs: still images, probed media and looping motion sources.

/// Image decoding into premultiplied RGBA8.
pub mod decode;
/// `ffprobe`/`ffmpeg` media helpers.
pub mod media;
/// Looping background motion sources.
pub mod motion;

use crate::assets::decode::PreparedImage;
use crate::assets::motion::MotionSource;

/// The three independently optional visual inputs of a composition.
#[derive(Default)]
pub struct AssetSet {
    /// Background motion. Absent means the gradient placeholder is drawn.
    pub motion: Option<Box<dyn MotionSource>>,
    /// Background template image. When present the motion is drawn as an inset instead.
    pub template: Option<PreparedImage>,
    /// Sketch image. Absent means the sketch card is skipped.
    pub sketch: Option<PreparedImage>,
}

impl AssetSet {
    /// Empty set: placeholder background and text only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the motion source.
    pub fn with_motion(mut self, motion: impl MotionSource + 'static) -> Self {
        self.motion = Some(Box::new(motion));
        self
    }

    /// Set the template image.
    pub fn with_template(mut self, template: PreparedImage) -> Self {
        self.template = Some(template);
        self
    }

    /// Set the sketch image.
    pub fn with_sketch(mut self, sketch: PreparedImage) -> Self {
        self.sketch = Some(sketch);
        self
    }
}

impl std::fmt::Debug for AssetSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetSet")
            .field("motion", &self.motion.is_some())
            .field("template", &self.template.as_ref().map(|i| (i.width, i.height)))
            .field("sketch", &self.sketch.as_ref().map(|i| (i.width, i.height)))
            .finish()
    }
}

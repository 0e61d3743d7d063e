use std::collections::{HashMap, VecDeque};

use crate::assets::decode::PreparedImage;
use crate::assets::media::{MediaTools, VideoSourceInfo, decode_video_frame_rgba8, loop_time};
use crate::foundation::core::Fps;
use crate::foundation::error::{ComposerError, ComposerResult};

/// A background motion source sampled once per tick.
///
/// Sources loop: any non-negative presentation time maps to a frame.
pub trait MotionSource: Send {
    /// Frame shown at presentation time `t_secs`.
    fn frame_at(&mut self, t_secs: f64) -> ComposerResult<PreparedImage>;

    /// Whether the source is currently playing. Paused sources are not drawn.
    fn is_playing(&self) -> bool {
        true
    }
}

/// In-memory looping frame sequence.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<PreparedImage>,
    fps: Fps,
    playing: bool,
}

impl FrameSequence {
    /// Create a playing sequence. Fails when `frames` is empty.
    pub fn new(frames: Vec<PreparedImage>, fps: Fps) -> ComposerResult<Self> {
        if frames.is_empty() {
            return Err(ComposerError::validation(
                "frame sequence needs at least one frame",
            ));
        }
        Ok(Self {
            frames,
            fps,
            playing: true,
        })
    }

    /// A single still frame that loops forever.
    pub fn still(frame: PreparedImage) -> Self {
        Self {
            frames: vec![frame],
            fps: Fps::CAPTURE,
            playing: true,
        }
    }

    /// Set the playing flag.
    pub fn with_playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 * self.fps.frame_duration_secs()
    }
}

impl MotionSource for FrameSequence {
    fn frame_at(&mut self, t_secs: f64) -> ComposerResult<PreparedImage> {
        let local = loop_time(t_secs, self.duration_secs());
        let idx = (self.fps.secs_to_frames_floor(local) as usize).min(self.frames.len() - 1);
        Ok(self.frames[idx].clone())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Looping video file decoded on demand through `ffmpeg`, with a small LRU of decoded frames.
pub struct VideoLoop {
    tools: MediaTools,
    info: VideoSourceInfo,
    frame_cache: HashMap<u64, PreparedImage>,
    lru: VecDeque<u64>,
    capacity: usize,
}

impl VideoLoop {
    /// Wrap a probed video.
    pub fn new(tools: MediaTools, info: VideoSourceInfo) -> Self {
        let capacity = std::env::var("SKETCH_COMPOSER_VIDEO_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(64);
        Self {
            tools,
            info,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity,
        }
    }

    /// Probed source metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn key_for_time(source_time_secs: f64) -> u64 {
        (source_time_secs.max(0.0) * 1000.0).round() as u64
    }

    fn insert_frame(&mut self, key: u64, image: PreparedImage) {
        self.frame_cache.insert(key, image);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

impl MotionSource for VideoLoop {
    fn frame_at(&mut self, t_secs: f64) -> ComposerResult<PreparedImage> {
        let source_t = loop_time(t_secs, self.info.duration_secs);
        let key = Self::key_for_time(source_t);
        if let Some(img) = self.frame_cache.get(&key).cloned() {
            self.touch(key);
            return Ok(img);
        }

        let rgba = decode_video_frame_rgba8(&self.tools, &self.info, source_t)?;
        let image = PreparedImage::from_straight_rgba8(self.info.width, self.info.height, rgba)?;
        self.insert_frame(key, image.clone());
        Ok(image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/motion.rs"]
mod tests;

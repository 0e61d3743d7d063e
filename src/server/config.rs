use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::media::MediaTools;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Default upload cap: 100 MiB per file.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Settings of the composition service.
#[derive(Clone, Debug, PartialEq, Eq, clap::Args)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "SKETCH_COMPOSER_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,
    /// Directory for incoming uploads.
    #[arg(long, env = "SKETCH_COMPOSER_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,
    /// Directory for finished artifacts, served under `/videos`.
    #[arg(long, env = "SKETCH_COMPOSER_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,
    /// Renders are written here and moved into `output_dir` once complete.
    #[arg(long, env = "SKETCH_COMPOSER_TEMP_DIR", default_value = "temp")]
    pub temp_dir: PathBuf,
    /// Per-file upload cap in bytes.
    #[arg(long, env = "SKETCH_COMPOSER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: u64,
    /// Font used by `drawtext`. Without it ffmpeg falls back to fontconfig.
    #[arg(long, env = "SKETCH_COMPOSER_FONT")]
    pub font_file: Option<PathBuf>,
    /// `ffmpeg` binary.
    #[arg(long, env = "SKETCH_COMPOSER_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    #[arg(long, env = "SKETCH_COMPOSER_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}

impl ServerConfig {
    /// Defaults with all three directories placed under `root`.
    pub fn rooted(root: &Path) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: root.join("uploads"),
            output_dir: root.join("output"),
            temp_dir: root.join("temp"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            font_file: None,
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }

    pub fn tools(&self) -> MediaTools {
        MediaTools {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }

    pub fn bind_addr(&self) -> ComposerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ComposerError::validation(format!("invalid bind address '{}': {e}", self.host))
            })
    }

    /// Create the upload, output and temp directories.
    pub fn ensure_directories(&self) -> ComposerResult<()> {
        for dir in [&self.upload_dir, &self.output_dir, &self.temp_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create directory '{}'", dir.display()))?;
        }
        Ok(())
    }
}

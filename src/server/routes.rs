use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assets::decode::load_image_file;
use crate::filtergraph::command::{
    AudioMap, ContainerFormat, InputSpec, OutputOptions, Quality, RenderRequest,
};
use crate::filtergraph::compose::{Effects, OUTPUT_PAD, build_compose_graph};
use crate::layout::engine::resolve_layout;
use crate::server::config::ServerConfig;
use crate::server::error::ApiError;
use crate::server::params::ComposeParams;
use crate::server::renderer::{ExternalRenderer, probe_blocking, render_blocking};
use crate::server::upload::{ComposeForm, read_compose_form};

const MISSING_FILES: &str = "Missing video or sketch file";
const VIDEO_NOT_FOUND: &str = "Video not found";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    renderer: Arc<dyn ExternalRenderer>,
}

impl AppState {
    pub fn new(config: ServerConfig, renderer: impl ExternalRenderer) -> Self {
        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    // Three files per request plus form overhead; the per-file cap is enforced while streaming.
    let body_limit = usize::try_from(state.config.max_upload_bytes.saturating_mul(3))
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);
    Router::new()
        .route("/api/compose-video", post(compose_video))
        .route("/api/compose-video-enhanced", post(compose_video_enhanced))
        .route("/api/convert-video/:video_id", post(convert_video))
        .route("/api/video-info/:video_id", get(video_info))
        .route("/videos/:file", get(serve_video))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Create the working directories, bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, renderer: impl ExternalRenderer) -> anyhow::Result<()> {
    config.ensure_directories()?;
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "video processing server listening");

    axum::serve(listener, router(AppState::new(config, renderer)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

/// Success body of both compose endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResponse {
    pub success: bool,
    pub video_id: String,
    pub download_url: String,
    pub file_size: u64,
    pub duration: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ComposeKind {
    Plain,
    Enhanced,
}

impl ComposeKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Plain => "composed",
            Self::Enhanced => "enhanced",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            Self::Plain => "Failed to compose video",
            Self::Enhanced => "Failed to compose enhanced video",
        }
    }
}

#[tracing::instrument(skip_all)]
async fn compose_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComposeResponse>, ApiError> {
    let form = read_compose_form(
        multipart,
        &state.config.upload_dir,
        state.config.max_upload_bytes,
    )
    .await?;
    compose(&state, form, ComposeKind::Plain).await
}

#[tracing::instrument(skip_all)]
async fn compose_video_enhanced(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ComposeResponse>, ApiError> {
    let form = read_compose_form(
        multipart,
        &state.config.upload_dir,
        state.config.max_upload_bytes,
    )
    .await?;
    compose(&state, form, ComposeKind::Enhanced).await
}

/// Shared compose flow. `form` owns the uploads and removes them when this returns.
async fn compose(
    state: &AppState,
    form: ComposeForm,
    kind: ComposeKind,
) -> Result<Json<ComposeResponse>, ApiError> {
    let (Some(video), Some(sketch)) = (&form.video, &form.sketch) else {
        return Err(ApiError::bad_request(MISSING_FILES));
    };
    let params = ComposeParams::from_fields(&form.fields)?;
    let effects = match kind {
        ComposeKind::Plain => Effects::default(),
        ComposeKind::Enhanced => params.effects,
    };

    let sketch_path = sketch.path.clone();
    tokio::task::spawn_blocking(move || load_image_file(&sketch_path))
        .await
        .map_err(|e| ApiError::internal(format!("sketch check failed: {e}")))?
        .map_err(|err| {
            tracing::warn!(error = %err, "sketch upload is not a decodable image");
            ApiError::bad_request("Invalid image file")
        })?;

    let layout = resolve_layout(&params.config);
    let graph = build_compose_graph(
        &layout,
        &params.config.label,
        effects,
        state.config.font_file.as_deref(),
    )?;

    let mut inputs = vec![
        InputSpec::looped(&video.path),
        InputSpec::file(&sketch.path),
    ];
    let audio = match (kind, &form.music) {
        (ComposeKind::Enhanced, Some(music)) => {
            inputs.push(InputSpec::file(&music.path));
            AudioMap::FromInput(inputs.len() - 1)
        }
        _ => AudioMap::FromInput(0),
    };
    let duration = params.config.duration_secs;
    let options = match kind {
        ComposeKind::Plain => OutputOptions::compose(duration),
        ComposeKind::Enhanced => OutputOptions::enhanced(duration, audio),
    };

    let id = Uuid::new_v4();
    let file_name = format!("{}-{id}.mp4", kind.prefix());
    let request = RenderRequest {
        inputs,
        graph: Some((graph, OUTPUT_PAD.to_string())),
        options,
        output: state.config.temp_dir.join(&file_name),
    };
    tracing::info!(%id, kind = ?kind, duration, "composing video");

    let file_size = render_and_publish(state, request, &file_name, kind.failure()).await?;
    drop(form);

    Ok(Json(ComposeResponse {
        success: true,
        video_id: id.to_string(),
        download_url: format!("/videos/{file_name}"),
        file_size,
        duration,
    }))
}

/// Render into the temp directory, then move the finished file into the output directory.
///
/// Partial or empty renders never appear under `/videos`. Returns the published size.
async fn render_and_publish(
    state: &AppState,
    request: RenderRequest,
    file_name: &str,
    failure: &'static str,
) -> Result<u64, ApiError> {
    let staged = request.output.clone();
    let result = async {
        let output = render_blocking(Arc::clone(&state.renderer), request)
            .await
            .map_err(|err| ApiError::from_composer(err, failure))?;
        let size = file_size(&output).await.ok_or_else(|| {
            tracing::error!(path = %output.display(), "renderer reported success but wrote nothing");
            ApiError::internal(failure)
        })?;
        let published = state.config.output_dir.join(file_name);
        publish(&output, &published).await.map_err(|e| {
            tracing::error!(error = %e, path = %published.display(), "failed to publish render");
            ApiError::internal(failure)
        })?;
        Ok(size)
    }
    .await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&staged).await;
    }
    result
}

/// Move `from` to `to`, copying when they sit on different filesystems.
async fn publish(from: &FsPath, to: &FsPath) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

async fn file_size(path: &FsPath) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .map(|m| m.len())
        .filter(|len| *len > 0)
}

/// Body of the convert endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConvertRequest {
    pub format: Option<String>,
    pub quality: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub download_url: String,
    pub file_size: u64,
}

/// Composed (or enhanced) artifact for `video_id`, if one exists.
async fn find_artifact(output_dir: &FsPath, video_id: &str) -> Option<(Uuid, PathBuf)> {
    let id = Uuid::parse_str(video_id).ok()?;
    for prefix in ["composed", "enhanced"] {
        let path = output_dir.join(format!("{prefix}-{id}.mp4"));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some((id, path));
        }
    }
    None
}

#[tracing::instrument(skip(state, body))]
async fn convert_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    body: Option<Json<ConvertRequest>>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let format = ContainerFormat::parse(body.format.as_deref().unwrap_or("mp4"))?;
    let quality = Quality::from_name(body.quality.as_deref().unwrap_or("medium"));
    let (id, input) = find_artifact(&state.config.output_dir, &video_id)
        .await
        .ok_or_else(|| ApiError::not_found(VIDEO_NOT_FOUND))?;

    let file_name = format!("converted-{id}.{}", format.extension());
    let request = RenderRequest {
        inputs: vec![InputSpec::file(input)],
        graph: None,
        options: OutputOptions::convert(format, quality),
        output: state.config.temp_dir.join(&file_name),
    };
    tracing::info!(format = format.extension(), quality = ?quality, "converting video");
    let file_size = render_and_publish(&state, request, &file_name, "Failed to convert video").await?;

    Ok(Json(ConvertResponse {
        success: true,
        download_url: format!("/videos/{file_name}"),
        file_size,
    }))
}

/// Body of the video-info endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub success: bool,
    pub file_size: u64,
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bitrate: Option<u64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[tracing::instrument(skip(state))]
async fn video_info(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoInfo>, ApiError> {
    let (_, path) = find_artifact(&state.config.output_dir, &video_id)
        .await
        .ok_or_else(|| ApiError::not_found(VIDEO_NOT_FOUND))?;
    let meta = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ApiError::not_found(VIDEO_NOT_FOUND))?;
    let probe = probe_blocking(Arc::clone(&state.renderer), path)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "probe failed");
            ApiError::not_found(VIDEO_NOT_FOUND)
        })?;

    Ok(Json(VideoInfo {
        success: true,
        file_size: meta.len(),
        duration: probe.duration_secs,
        width: probe.width,
        height: probe.height,
        bitrate: probe.bit_rate,
        created_at: meta
            .created()
            .or_else(|_| meta.modified())
            .ok()
            .map(chrono::DateTime::<chrono::Utc>::from),
    }))
}

fn media_type_for(file: &str) -> &'static str {
    match file.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

fn is_served_name(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && file
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

async fn serve_video(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_served_name(&file) {
        return Err(ApiError::not_found(VIDEO_NOT_FOUND));
    }
    let bytes = tokio::fs::read(state.config.output_dir.join(&file))
        .await
        .map_err(|_| ApiError::not_found(VIDEO_NOT_FOUND))?;
    Ok(([(header::CONTENT_TYPE, media_type_for(&file))], bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/server/routes.rs"]
mod tests;

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Rect, Rgba8Premul};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::blur::{blur_rgba8_premul, shadow_blur_params};
use crate::render::frame::FrameRGBA;
use crate::render::surface::{DrawSurface, Shadow, Shape, TextAlign, TextRun};
use crate::render::text::{TextLayoutEngine, place_line, system_font};

const IMAGE_CACHE_CAPACITY: usize = 8;

struct LoadedFont {
    engine: TextLayoutEngine,
    data: vello_cpu::peniko::FontData,
}

impl LoadedFont {
    fn new(bytes: Vec<u8>, index: u32) -> ComposerResult<Self> {
        let engine = TextLayoutEngine::new(&bytes, index)?;
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), index);
        Ok(Self { engine, data })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    top: [u8; 4],
    bottom: [u8; 4],
    w: u32,
    h: u32,
}

/// Raster [`DrawSurface`] backed by `vello_cpu`.
///
/// Drawing commands accumulate in one render context per frame; [`CpuSurface::finish_frame`]
/// rasterizes them and copies the pixels out.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    clip_depth: usize,
    font: Option<LoadedFont>,
    warned_missing_font: bool,
    image_cache: VecDeque<(Arc<Vec<u8>>, vello_cpu::Image)>,
    gradient_cache: HashMap<GradientKey, vello_cpu::Image>,
}

impl CpuSurface {
    /// Create a transparent surface. Zero or oversized dimensions are rejected.
    pub fn new(width: u32, height: u32) -> ComposerResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            clip_depth: 0,
            font: None,
            warned_missing_font: false,
            image_cache: VecDeque::new(),
            gradient_cache: HashMap::new(),
        })
    }

    /// Use `font_bytes` (TTF/OTF) for all text.
    pub fn with_font(self, font_bytes: Vec<u8>) -> ComposerResult<Self> {
        self.with_font_face(font_bytes, 0)
    }

    /// Use face `index` of a font file or collection for all text.
    pub fn with_font_face(mut self, font_bytes: Vec<u8>, index: u32) -> ComposerResult<Self> {
        self.font = Some(LoadedFont::new(font_bytes, index)?);
        Ok(self)
    }

    /// Use an installed sans-serif font, preferring `family` when it is present.
    ///
    /// Leaves the surface without a font when none is installed or the face fails to load.
    pub fn with_system_font(mut self, family: Option<&str>) -> Self {
        let Some((bytes, index)) = system_font(family) else {
            tracing::warn!("no system font found; text layers will be skipped");
            return self;
        };
        match LoadedFont::new(bytes, index) {
            Ok(font) => self.font = Some(font),
            Err(err) => tracing::warn!(error = %err, "system font could not be loaded"),
        }
        self
    }

    /// Read a font file and use it for all text.
    pub fn with_font_file(self, path: &Path) -> ComposerResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ComposerError::asset_load(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.with_font(bytes)
    }

    /// Whether a font is loaded. Without one, text operations are skipped.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rasterize everything drawn since the last clear and copy the pixels out.
    ///
    /// The returned frame owns its bytes, so the surface can be redrawn immediately.
    pub fn finish_frame(&mut self) -> ComposerResult<FrameRGBA> {
        if self.clip_depth != 0 {
            return Err(ComposerError::validation(format!(
                "frame finished with {} unbalanced clip(s)",
                self.clip_depth
            )));
        }
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn image_paint(&mut self, image: &PreparedImage) -> ComposerResult<vello_cpu::Image> {
        if let Some((_, paint)) = self
            .image_cache
            .iter()
            .find(|(bytes, _)| Arc::ptr_eq(bytes, &image.rgba8_premul))
        {
            return Ok(paint.clone());
        }
        let paint = rgba_premul_to_image(&image.rgba8_premul, image.width, image.height)?;
        self.image_cache
            .push_back((Arc::clone(&image.rgba8_premul), paint.clone()));
        while self.image_cache.len() > IMAGE_CACHE_CAPACITY {
            self.image_cache.pop_front();
        }
        Ok(paint)
    }

    fn gradient_paint(
        &mut self,
        top: Rgba8Premul,
        bottom: Rgba8Premul,
        w: u32,
        h: u32,
    ) -> ComposerResult<vello_cpu::Image> {
        let key = GradientKey {
            top: top.to_array(),
            bottom: bottom.to_array(),
            w,
            h,
        };
        if let Some(img) = self.gradient_cache.get(&key).cloned() {
            return Ok(img);
        }
        let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
        let h1 = (h.max(1) - 1) as f32;
        for (y, row) in bytes.chunks_exact_mut((w as usize) * 4).enumerate() {
            let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
            let lerp = |a: u8, b: u8| -> u8 {
                let (af, bf) = (f32::from(a), f32::from(b));
                (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
            };
            let c = [
                lerp(top.r, bottom.r),
                lerp(top.g, bottom.g),
                lerp(top.b, bottom.b),
                lerp(top.a, bottom.a),
            ];
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&c);
            }
        }
        let img = rgba_premul_to_image(&bytes, w, h)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }

    fn draw_paint_image(&mut self, paint: vello_cpu::Image, iw: u32, ih: u32, dest: Rect) {
        let sx = dest.width() / f64::from(iw);
        let sy = dest.height() / f64::from(ih);
        self.ctx.set_transform(
            vello_cpu::kurbo::Affine::translate((dest.x0, dest.y0))
                * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
        );
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(iw),
            f64::from(ih),
        ));
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Rasterize a blurred copy of the stroke into a padded region and queue it as an image.
    fn draw_stroke_shadow(&mut self, shape: Shape, width: f64, shadow: Shadow) -> ComposerResult<()> {
        let (radius, sigma) = shadow_blur_params(shadow.blur);
        let pad = f64::from(radius) + width;
        let region = shape
            .bounds()
            .with_origin(shape.bounds().origin() + shadow.offset)
            .inflate(pad, pad)
            .intersect(Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height)))
            .expand();
        if region.width() <= 0.0 || region.height() <= 0.0 {
            return Ok(());
        }
        let (rw, rh) = surface_dims(region.width() as u32, region.height() as u32)?;

        let mut ctx = vello_cpu::RenderContext::new(rw, rh);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            shadow.offset.x - region.x0,
            shadow.offset.y - region.y0,
        )));
        ctx.set_paint(color_to_cpu(shadow.color));
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        ctx.stroke_path(&bezpath_to_cpu(&shape.to_path()));
        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(rw, rh);
        ctx.render_to_pixmap(&mut layer);

        let blurred = if radius == 0 {
            layer.data_as_u8_slice().to_vec()
        } else {
            blur_rgba8_premul(
                layer.data_as_u8_slice(),
                u32::from(rw),
                u32::from(rh),
                radius,
                sigma,
            )?
        };
        let paint = rgba_premul_to_image(&blurred, u32::from(rw), u32::from(rh))?;
        self.draw_paint_image(paint, u32::from(rw), u32::from(rh), region);
        Ok(())
    }

    fn glyphs_for(
        &mut self,
        run: &TextRun<'_>,
    ) -> ComposerResult<Option<(vello_cpu::peniko::FontData, Vec<vello_cpu::Glyph>)>> {
        let Some(font) = self.font.as_mut() else {
            if !self.warned_missing_font {
                tracing::warn!("no font loaded; text layers are skipped");
                self.warned_missing_font = true;
            }
            return Ok(None);
        };
        let layout = font.engine.layout_line(run.text, run.font_px, run.bold)?;
        let placed = place_line(&layout);
        let x0 = match run.align {
            TextAlign::Left => run.origin.x,
            TextAlign::Center => run.origin.x - f64::from(placed.width) / 2.0,
        };
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x0, run.origin.y)));
        Ok(Some((font.data.clone(), placed.glyphs)))
    }
}

impl DrawSurface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn supports_round_rect(&self) -> bool {
        true
    }

    fn clear(&mut self, color: Rgba8Premul) -> ComposerResult<()> {
        self.ctx.reset();
        self.clip_depth = 0;
        if color.a > 0 {
            self.ctx.set_paint(color_to_cpu(color));
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }
        Ok(())
    }

    fn fill_shape(&mut self, shape: Shape, color: Rgba8Premul) -> ComposerResult<()> {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        match shape {
            Shape::Rect(r) => self.ctx.fill_rect(&rect_to_cpu(r)),
            Shape::RoundRect { .. } => self.ctx.fill_path(&bezpath_to_cpu(&shape.to_path())),
        }
        Ok(())
    }

    fn fill_vertical_gradient(
        &mut self,
        rect: Rect,
        top: Rgba8Premul,
        bottom: Rgba8Premul,
    ) -> ComposerResult<()> {
        let px = rect.expand();
        let (w, h) = (px.width() as u32, px.height() as u32);
        if w == 0 || h == 0 {
            return Ok(());
        }
        let paint = self.gradient_paint(top, bottom, w, h)?;
        self.draw_paint_image(paint, w, h, rect);
        Ok(())
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ComposerResult<()> {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }
        let paint = self.image_paint(image)?;
        self.draw_paint_image(paint, image.width, image.height, dest);
        Ok(())
    }

    fn push_clip(&mut self, shape: Shape) -> ComposerResult<()> {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.push_clip_layer(&bezpath_to_cpu(&shape.to_path()));
        self.clip_depth += 1;
        Ok(())
    }

    fn pop_clip(&mut self) -> ComposerResult<()> {
        if self.clip_depth == 0 {
            return Err(ComposerError::validation("pop_clip without matching push_clip"));
        }
        self.ctx.pop_layer();
        self.clip_depth -= 1;
        Ok(())
    }

    fn stroke_shape(
        &mut self,
        shape: Shape,
        color: Rgba8Premul,
        width: f64,
        shadow: Option<Shadow>,
    ) -> ComposerResult<()> {
        if let Some(shadow) = shadow {
            self.draw_stroke_shadow(shape, width, shadow)?;
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.stroke_path(&bezpath_to_cpu(&shape.to_path()));
        Ok(())
    }

    fn fill_text(&mut self, run: &TextRun<'_>, color: Rgba8Premul) -> ComposerResult<()> {
        let Some((font, glyphs)) = self.glyphs_for(run)? else {
            return Ok(());
        };
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx
            .glyph_run(&font)
            .font_size(run.font_px)
            .fill_glyphs(glyphs.into_iter());
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    fn stroke_text(
        &mut self,
        run: &TextRun<'_>,
        color: Rgba8Premul,
        width: f64,
    ) -> ComposerResult<()> {
        let Some((font, glyphs)) = self.glyphs_for(run)? else {
            return Ok(());
        };
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx
            .glyph_run(&font)
            .font_size(run.font_px)
            .stroke_glyphs(glyphs.into_iter());
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

fn surface_dims(width: u32, height: u32) -> ComposerResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(ComposerError::validation(format!(
            "surface {width}x{height} must have non-zero width and height"
        )));
    }
    let w = u16::try_from(width)
        .map_err(|_| ComposerError::validation("surface width exceeds u16"))?;
    let h = u16::try_from(height)
        .map_err(|_| ComposerError::validation("surface height exceeds u16"))?;
    Ok((w, h))
}

fn color_to_cpu(c: Rgba8Premul) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_straight();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn rgba_premul_to_image(bytes: &[u8], width: u32, height: u32) -> ComposerResult<vello_cpu::Image> {
    let (w, h) = surface_dims(width, height)?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(ComposerError::validation("pixmap byte len mismatch"));
    }
    let mut may_have_opacities = false;
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

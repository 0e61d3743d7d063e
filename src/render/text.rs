use crate::foundation::error::{ComposerError, ComposerResult};

/// Parley layout contexts bound to one registered font family.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and remember the family of face `index` for every later layout.
    pub(crate) fn new(font_bytes: &[u8], index: u32) -> ComposerResult<Self> {
        let mut font_ctx = parley::FontContext {
            collection: parley::fontique::Collection::new(parley::fontique::CollectionOptions {
                shared: false,
                system_fonts: false,
            }),
            source_cache: parley::fontique::SourceCache::default(),
        };
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| ComposerError::asset_load("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ComposerError::asset_load("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Shape one unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        bold: bool,
    ) -> ComposerResult<parley::Layout<()>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ComposerError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        if bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Locate an installed font: `family` when given and present, else the generic sans-serif.
///
/// Returns the file bytes and the face index of the best bold upright face.
pub(crate) fn system_font(family: Option<&str>) -> Option<(Vec<u8>, u32)> {
    use parley::fontique::{
        Collection, CollectionOptions, FontStyle, FontWeight, FontWidth, GenericFamily,
    };

    let mut collection = Collection::new(CollectionOptions {
        shared: false,
        system_fonts: true,
    });
    let mut candidates = Vec::new();
    if let Some(id) = family.and_then(|name| collection.family_id(name)) {
        candidates.push(id);
    }
    candidates.extend(collection.generic_families(GenericFamily::SansSerif));

    candidates.into_iter().find_map(|id| {
        let info = collection.family(id)?;
        let face = info.match_font(FontWidth::NORMAL, FontStyle::Normal, FontWeight::BOLD, false)?;
        let blob = face.load(None)?;
        tracing::debug!(family = info.name(), index = face.index(), "using system font");
        Some((blob.as_ref().to_vec(), face.index()))
    })
}

/// Glyph ids and positions of a laid-out line, relative to its first baseline.
pub(crate) struct PlacedLine {
    /// Advance width of the line.
    pub(crate) width: f32,
    /// Glyphs with `y` measured from the first baseline.
    pub(crate) glyphs: Vec<vello_cpu::Glyph>,
}

/// Flatten a single-line layout into baseline-relative glyph positions.
pub(crate) fn place_line(layout: &parley::Layout<()>) -> PlacedLine {
    let mut glyphs = Vec::new();
    let mut first_baseline = None;
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let baseline = *first_baseline.get_or_insert(run.baseline());
            for g in run.positioned_glyphs() {
                glyphs.push(vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                });
            }
        }
    }
    PlacedLine {
        width: layout.width(),
        glyphs,
    }
}

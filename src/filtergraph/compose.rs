use std::path::Path;

use crate::composition::config::{Label, validate_label};
use crate::filtergraph::escape::validate_user_text;
use crate::filtergraph::graph::{Filter, FilterChain, FilterGraph};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layout::engine::ResolvedLayout;
use crate::render::blur::shadow_blur_params;
use crate::render::compositor::{
    SHADOW_ALPHA, SHADOW_BLUR, SHADOW_OFFSET, SKETCH_BORDER_WIDTH, SKETCH_INNER_BORDER_WIDTH,
    TEXT_STROKE_WIDTH,
};

/// Input index of the background video.
pub const VIDEO_INPUT: usize = 0;
/// Input index of the sketch image.
pub const SKETCH_INPUT: usize = 1;
/// Label of the graph's final video pad.
pub const OUTPUT_PAD: &str = "final";

/// Optional effects of the enhanced compose request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Effects {
    pub rounded_corners: bool,
    pub shadow: bool,
    pub animated_text: bool,
}

/// Named graph stage. Stages always run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Border,
    RoundedCorners,
    Shadow,
    Placement,
    Text,
    Fade,
}

impl Effects {
    /// Stages enabled by these effects, in application order.
    pub fn stages(self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(6);
        stages.push(Stage::Border);
        if self.rounded_corners {
            stages.push(Stage::RoundedCorners);
        }
        if self.shadow {
            stages.push(Stage::Shadow);
        }
        stages.push(Stage::Placement);
        stages.push(Stage::Text);
        if self.animated_text {
            stages.push(Stage::Fade);
        }
        stages
    }
}

/// Build the compose graph for `layout`.
///
/// Input 0 is stretched over the canvas, input 1 is fitted onto a white card the size of the
/// sketch rectangle and framed with a white border, and the label is drawn at the layout baselines. The output pad is [`OUTPUT_PAD`],
/// padded to even dimensions in `yuv420p`.
pub fn build_compose_graph(
    layout: &ResolvedLayout,
    label: &Label,
    effects: Effects,
    font_file: Option<&Path>,
) -> ComposerResult<FilterGraph> {
    validate_label(label)?;
    validate_user_text(&label.name)?;
    let font = font_file
        .map(|p| {
            p.to_str().map(str::to_owned).ok_or_else(|| {
                ComposerError::validation(format!("font path '{}' is not UTF-8", p.display()))
            })
        })
        .transpose()?;

    let mut b = Builder {
        layout,
        graph: FilterGraph::default(),
        sketch: "sketch".to_string(),
        shadow: None,
        video: "placed".to_string(),
    };
    b.base();
    for stage in effects.stages() {
        match stage {
            Stage::Border => b.border(),
            Stage::RoundedCorners => b.rounded_corners(),
            Stage::Shadow => b.shadow(),
            Stage::Placement => b.placement(),
            Stage::Text => b.text(label, font.as_deref()),
            Stage::Fade => b.fade(),
        }
    }
    b.finish();
    Ok(b.graph)
}

struct Builder<'a> {
    layout: &'a ResolvedLayout,
    graph: FilterGraph,
    sketch: String,
    shadow: Option<(String, i64)>,
    video: String,
}

impl Builder<'_> {
    fn base(&mut self) {
        let canvas = self.layout.canvas;
        let rect = self.layout.sketch;
        self.graph.push(
            FilterChain::new(&[&format!("{VIDEO_INPUT}:v")], &["bg"])
                .then(Filter::new("scale").opt("w", canvas.width).opt("h", canvas.height))
                .then(Filter::new("setsar").opt("r", 1)),
        );
        let none: [&str; 0] = [];
        self.graph.push(
            FilterChain::new(&none, &["card"]).then(
                Filter::new("color")
                    .opt("c", "white")
                    .opt("s", format!("{}x{}", rect.width, rect.height)),
            ),
        );
        self.graph.push(
            FilterChain::new(&[&format!("{SKETCH_INPUT}:v")], &["sketch_fit"]).then(
                Filter::new("scale")
                    .opt("w", rect.width)
                    .opt("h", rect.height)
                    .opt("force_original_aspect_ratio", "decrease"),
            ),
        );
        self.graph.push(
            FilterChain::new(&["card", "sketch_fit"], &["sketch"])
                .then(
                    Filter::new("overlay")
                        .opt("x", "(W-w)/2")
                        .opt("y", "(H-h)/2")
                        .opt("shortest", 1),
                )
                .then(Filter::new("format").opt("pix_fmts", "rgba")),
        );
    }

    /// White frame drawn inside the card edge, matching the canvas border stroke.
    fn border(&mut self) {
        let outer = (SKETCH_BORDER_WIDTH / 2.0).ceil() as i64;
        let inner = outer + (SKETCH_INNER_BORDER_WIDTH / 2.0).ceil() as i64;
        self.graph.push(
            FilterChain::new(&[&self.sketch], &["sketch_bordered"])
                .then(
                    Filter::new("drawbox")
                        .opt("x", 0)
                        .opt("y", 0)
                        .opt("w", "iw")
                        .opt("h", "ih")
                        .opt("color", "white")
                        .opt("t", outer),
                )
                .then(
                    Filter::new("drawbox")
                        .opt("x", outer)
                        .opt("y", outer)
                        .opt("w", format!("iw-{}", 2 * outer))
                        .opt("h", format!("ih-{}", 2 * outer))
                        .opt("color", "white@0.8")
                        .opt("t", inner - outer),
                ),
        );
        self.sketch = "sketch_bordered".to_string();
    }

    fn rounded_corners(&mut self) {
        let r = self.layout.sketch_radius.round() as i64;
        let alpha = format!(
            "if(lte(hypot(max(max({r}-X,X-W+1+{r}),0),max(max({r}-Y,Y-H+1+{r}),0)),{r}),alpha(X,Y),0)"
        );
        self.graph.push(
            FilterChain::new(&[&self.sketch], &["sketch_rounded"]).then(
                Filter::new("geq")
                    .opt("r", "r(X,Y)")
                    .opt("g", "g(X,Y)")
                    .opt("b", "b(X,Y)")
                    .opt("a", alpha),
            ),
        );
        self.sketch = "sketch_rounded".to_string();
    }

    fn shadow(&mut self) {
        let (radius, sigma) = shadow_blur_params(SHADOW_BLUR);
        let pad = i64::from(radius);
        self.graph.push(
            FilterChain::new(&[&self.sketch], &["sketch_card", "sketch_silhouette"])
                .then(Filter::new("split")),
        );
        self.graph.push(
            FilterChain::new(&["sketch_silhouette"], &["shadow"])
                .then(
                    Filter::new("colorchannelmixer")
                        .opt("rr", 0)
                        .opt("gg", 0)
                        .opt("bb", 0)
                        .opt("aa", SHADOW_ALPHA),
                )
                .then(
                    Filter::new("pad")
                        .opt("w", format!("iw+{}", 2 * pad))
                        .opt("h", format!("ih+{}", 2 * pad))
                        .opt("x", pad)
                        .opt("y", pad)
                        .opt("color", "black@0"),
                )
                .then(Filter::new("gblur").opt("sigma", sigma)),
        );
        self.sketch = "sketch_card".to_string();
        self.shadow = Some(("shadow".to_string(), pad));
    }

    fn placement(&mut self) {
        let (x, y) = (
            i64::from(self.layout.sketch.x),
            i64::from(self.layout.sketch.y),
        );
        let mut background = "bg".to_string();
        if let Some((shadow, pad)) = self.shadow.take() {
            self.graph.push(
                FilterChain::new(&[&background, &shadow], &["bg_shadow"]).then(
                    Filter::new("overlay")
                        .opt("x", x + SHADOW_OFFSET.0 as i64 - pad)
                        .opt("y", y + SHADOW_OFFSET.1 as i64 - pad),
                ),
            );
            background = "bg_shadow".to_string();
        }
        self.graph.push(
            FilterChain::new(&[&background, &self.sketch], &["placed"])
                .then(Filter::new("overlay").opt("x", x).opt("y", y)),
        );
        self.video = "placed".to_string();
    }

    fn text(&mut self, label: &Label, font: Option<&str>) {
        let lines = [
            (
                label.name.clone(),
                self.layout.name_baseline,
                self.layout.name_font_px,
            ),
            (
                label.age_line(),
                self.layout.age_baseline,
                self.layout.age_font_px,
            ),
        ];
        let border = (TEXT_STROKE_WIDTH / 2.0).round().max(1.0) as i64;
        let mut chain = FilterChain::new(&[&self.video], &["texted"]);
        for (text, origin, font_px) in lines {
            let mut f = Filter::new("drawtext").opt("expansion", "none");
            if let Some(font) = font {
                f = f.opt("fontfile", font);
            }
            chain = chain.then(
                f.opt("text", text)
                    .opt("fontsize", font_px.round() as i64)
                    .opt("fontcolor", "white")
                    .opt("borderw", border)
                    .opt("bordercolor", "black")
                    .opt("x", origin.x.round() as i64)
                    .opt("y", format!("{}-ascent", origin.y.round() as i64)),
            );
        }
        self.graph.push(chain);
        self.video = "texted".to_string();
    }

    fn fade(&mut self) {
        for f in self.graph.filters_named_mut("drawtext") {
            f.set("alpha", "if(lt(t,1),t,1)");
        }
    }

    fn finish(&mut self) {
        self.graph.push(
            FilterChain::new(&[&self.video], &[OUTPUT_PAD])
                .then(
                    Filter::new("pad")
                        .opt("w", "ceil(iw/2)*2")
                        .opt("h", "ceil(ih/2)*2"),
                )
                .then(Filter::new("format").opt("pix_fmts", "yuv420p")),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filtergraph/compose.rs"]
mod tests;

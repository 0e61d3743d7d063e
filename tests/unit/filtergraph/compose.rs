use super::*;
use crate::composition::config::CompositionConfig;
use crate::layout::engine::resolve_layout;

fn ghost() -> (ResolvedLayout, Label) {
    let cfg = CompositionConfig::default().with_label("Ghost", 7);
    (resolve_layout(&cfg), cfg.label)
}

#[test]
fn stages_follow_fixed_order() {
    let all = Effects {
        rounded_corners: true,
        shadow: true,
        animated_text: true,
    };
    assert_eq!(
        all.stages(),
        vec![
            Stage::Border,
            Stage::RoundedCorners,
            Stage::Shadow,
            Stage::Placement,
            Stage::Text,
            Stage::Fade
        ]
    );
    assert_eq!(
        Effects::default().stages(),
        vec![Stage::Border, Stage::Placement, Stage::Text]
    );
}

#[test]
fn plain_graph_uses_layout_geometry() {
    let (layout, label) = ghost();
    let graph = build_compose_graph(&layout, &label, Effects::default(), None).unwrap();
    let text = graph.to_string();

    assert!(text.starts_with("[0:v]scale=w=405:h=720,setsar=r=1[bg];"));
    assert!(text.contains(";color=c=white:s=135x240[card];"));
    assert!(text.contains(
        "[1:v]scale=w=135:h=240:force_original_aspect_ratio=decrease[sketch_fit]"
    ));
    assert!(text.contains(
        "[card][sketch_fit]overlay=x=(W-w)/2:y=(H-h)/2:shortest=1,format=pix_fmts=rgba[sketch]"
    ));
    assert!(text.contains(
        "[sketch]drawbox=x=0:y=0:w=iw:h=ih:color=white:t=2,drawbox=x=2:y=2:w=iw-4:h=ih-4:color=white@0.8:t=1[sketch_bordered]"
    ));
    assert!(text.contains("[bg][sketch_bordered]overlay=x=50:y=560[placed]"));
    assert!(text.contains("drawtext=expansion=none:text=Ghost:fontsize=28:fontcolor=white:borderw=1:bordercolor=black:x=220:y=650-ascent"));
    assert!(text.contains(r"text=Age\\: 7:fontsize=20"));
    assert!(text.contains("y=680-ascent"));
    assert!(text.ends_with("[texted]pad=w=ceil(iw/2)*2:h=ceil(ih/2)*2,format=pix_fmts=yuv420p[final]"));
    assert!(!text.contains("geq"));
    assert!(!text.contains("gblur"));
    assert!(!text.contains("alpha=if"));
}

#[test]
fn effects_add_their_stages() {
    let (layout, label) = ghost();
    let effects = Effects {
        rounded_corners: true,
        shadow: true,
        animated_text: true,
    };
    let graph = build_compose_graph(&layout, &label, effects, None).unwrap();
    let text = graph.to_string();

    assert!(text.contains("[sketch_bordered]geq=r=r(X\\,Y)"));
    assert!(text.contains("[sketch_rounded]split[sketch_card][sketch_silhouette]"));
    assert!(text.contains("gblur=sigma=5[shadow]"));
    // Shadow pad is 15px, offset 2px.
    assert!(text.contains("[bg][shadow]overlay=x=37:y=547[bg_shadow]"));
    assert!(text.contains("[bg_shadow][sketch_card]overlay=x=50:y=560[placed]"));
    let fades = graph
        .filters()
        .filter(|f| f.get("alpha") == Some("if(lt(t,1),t,1)"))
        .count();
    assert_eq!(fades, 2);
    assert!(text.contains(r"alpha=if(lt(t\,1)\,t\,1)"));
}

#[test]
fn hostile_names_stay_inside_the_text_option() {
    let cfg = CompositionConfig::default().with_label("x':y[a];[b]", 7);
    let layout = resolve_layout(&cfg);
    let graph = build_compose_graph(&layout, &cfg.label, Effects::default(), None).unwrap();
    let chains = graph.to_string();
    let drawtext = graph
        .filters()
        .find(|f| f.name() == "drawtext")
        .unwrap();
    assert_eq!(drawtext.get("text"), Some("x':y[a];[b]"));
    assert!(chains.contains(r"text=x\\\'\\:y\[a\]\;\[b\]:fontsize=28"));
    // Only the graph's own chain separators remain unescaped; the card chain has no input pad.
    assert_eq!(
        chains.matches(";[").count() + chains.matches(";color=").count(),
        graph.chains.len() - 1
    );
}

#[test]
fn font_file_is_passed_through() {
    let (layout, label) = ghost();
    let graph = build_compose_graph(
        &layout,
        &label,
        Effects::default(),
        Some(Path::new("/fonts/Bold:1.ttf")),
    )
    .unwrap();
    assert!(graph
        .to_string()
        .contains(r"drawtext=expansion=none:fontfile=/fonts/Bold\\:1.ttf:text=Ghost"));
}

#[test]
fn invalid_labels_are_rejected() {
    let (layout, _) = ghost();
    let empty = Label {
        name: "  ".to_string(),
        age: 7,
    };
    assert!(matches!(
        build_compose_graph(&layout, &empty, Effects::default(), None),
        Err(ComposerError::Validation(_))
    ));
    let newline = Label {
        name: "a\nb".to_string(),
        age: 7,
    };
    assert!(build_compose_graph(&layout, &newline, Effects::default(), None).is_err());
}

#[test]
fn effects_deserialize_from_partial_json() {
    let e: Effects = serde_json::from_str(r#"{"shadow":true}"#).unwrap();
    assert_eq!(
        e,
        Effects {
            rounded_corners: false,
            shadow: true,
            animated_text: false
        }
    );
}

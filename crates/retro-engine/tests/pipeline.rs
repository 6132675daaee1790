//! Pipeline integration tests
//!
//! Parsed documents driven through start, mutation, navigation, preference
//! and revert paths of the engine.

use retro_color::{map_to_retro_palette, validate_wcag_aa, Tone};
use retro_dom::Document;
use retro_engine::{
    EngineConfig, HistoryHook, ManualClock, PatchPlan, Preferences, RetroEngine, ThemeMode,
};
use retro_html::{serialize, HtmlParser};

const PAGE: &str = r#"<!DOCTYPE html><html><head><title>News</title><style>p { margin: 0 }</style></head><body><h1 id="title" class="headline">Hello</h1><p id="lede" style="color: rgb(10,10,10)">Lede</p><p id="note" style="color: red !important; margin: 0">Note</p><svg id="logo"><rect></rect></svg></body></html>"#;

fn document(url: &str) -> Document {
    let mut doc = HtmlParser::new().parse_with_url(PAGE, url);
    let body = doc.body().unwrap();
    doc.tree.set_author_property(body, "background-color", "#ffffff", false);
    doc
}

fn engine(preferences: Preferences) -> RetroEngine {
    RetroEngine::new(EngineConfig::default(), preferences)
        .unwrap()
        .with_clock(ManualClock::new())
}

fn inline(doc: &Document, id: &str, property: &str) -> Option<String> {
    let el = doc.tree.get_element_by_id(id)?;
    doc.tree
        .inline_style(el)?
        .get_property_value(property)
        .map(str::to_string)
}

#[test]
fn test_theme_then_revert_is_lossless() {
    let mut doc = document("https://news.example.com/");
    let before = serialize(&doc);

    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);
    let themed = serialize(&doc);
    assert_ne!(themed, before);
    assert!(themed.contains("retro-theme-light"));
    assert!(themed.contains("!important"));

    engine.revert_all(&mut doc);
    assert_eq!(serialize(&doc), before);
    assert!(engine.applier().store().is_empty());
}

#[test]
fn test_revert_twice_matches_single_revert() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    engine.revert_all(&mut doc);
    let once = serialize(&doc);
    engine.revert_all(&mut doc);
    assert_eq!(serialize(&doc), once);
}

#[test]
fn test_round_trip_without_inline_value() {
    let mut doc = document("https://news.example.com/");
    let title = doc.tree.get_element_by_id("title").unwrap();
    let mut engine = engine(Preferences::default());

    let mapped = map_to_retro_palette("rgb(10, 10, 10)", Tone::Light, 0.8);
    engine.apply(&mut doc, vec![PatchPlan::new(title).with_style("color", &mapped)]);
    assert_eq!(inline(&doc, "title", "color"), Some(mapped));

    engine.revert_all(&mut doc);
    assert_eq!(inline(&doc, "title", "color"), None);
    assert!(!doc.tree.has_attribute(title, "style"));
}

#[test]
fn test_important_original_survives_revert() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);
    assert_ne!(inline(&doc, "note", "color").as_deref(), Some("red"));

    engine.revert_all(&mut doc);
    let note = doc.tree.get_element_by_id("note").unwrap();
    let style = doc.tree.inline_style(note).unwrap();
    assert_eq!(style.get_property_value("color"), Some("red"));
    assert!(style.get_property_priority("color"));
}

#[test]
fn test_non_visual_subtrees_untouched() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let logo = doc.tree.get_element_by_id("logo").unwrap();
    assert!(!doc.tree.has_attribute(logo, "data-retro-processed"));
    assert!(!doc.tree.has_attribute(logo, "style"));
}

#[test]
fn test_contrast_repair_meets_aa() {
    let mut doc = document("https://news.example.com/");
    let lede = doc.tree.get_element_by_id("lede").unwrap();
    doc.tree.set_style_property(lede, "color", "#fbcd43", false);

    let config = EngineConfig { repair_contrast: true, ..Default::default() };
    let mut engine = RetroEngine::new(config, Preferences::default())
        .unwrap()
        .with_clock(ManualClock::new());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let body = doc.body().unwrap();
    let bg = doc.tree.inline_style(body).unwrap().get_property_value("background-color").unwrap();
    let fg = inline(&doc, "lede", "color").unwrap();
    assert!(validate_wcag_aa(&fg, bg, false));
}

#[test]
fn test_mutations_batched_into_one_frame() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let body = doc.body().unwrap();
    let added: Vec<_> = (0..5)
        .map(|_| {
            let div = doc.tree.create_element("div");
            doc.tree.set_style_property(div, "background-color", "rgb(20, 120, 200)", false);
            doc.tree.append_child(body, div).unwrap();
            div
        })
        .collect();

    engine.tick(&mut doc);
    assert_eq!(engine.stats().mutation_frames, 1);
    for div in added {
        assert!(doc.tree.has_attribute(div, "data-retro-applied"));
    }
}

#[test]
fn test_batch_size_carries_leftovers() {
    let mut doc = document("https://news.example.com/");
    let config = EngineConfig { batch_size: 2, ..Default::default() };
    let mut engine = RetroEngine::new(config, Preferences::default())
        .unwrap()
        .with_clock(ManualClock::new());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let body = doc.body().unwrap();
    let added: Vec<_> = (0..5)
        .map(|_| {
            let div = doc.tree.create_element("div");
            doc.tree.append_child(body, div).unwrap();
            div
        })
        .collect();

    engine.tick(&mut doc);
    assert!(doc.tree.has_attribute(added[1], "data-retro-processed"));
    assert!(!doc.tree.has_attribute(added[2], "data-retro-processed"));

    engine.run_until_idle(&mut doc, 10);
    assert_eq!(engine.stats().mutation_frames, 3);
    assert!(added.iter().all(|&div| doc.tree.has_attribute(div, "data-retro-processed")));
}

#[test]
fn test_page_style_rewrite_becomes_new_original() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let lede = doc.tree.get_element_by_id("lede").unwrap();
    doc.tree.set_attribute(lede, "style", "color: rgb(200, 30, 30)");
    engine.run_until_idle(&mut doc, 10);
    assert!(doc.tree.has_attribute(lede, "data-retro-applied"));
    assert_ne!(inline(&doc, "lede", "color").as_deref(), Some("rgb(200, 30, 30)"));

    engine.revert_all(&mut doc);
    assert_eq!(inline(&doc, "lede", "color").as_deref(), Some("rgb(200, 30, 30)"));
}

#[test]
fn test_class_change_rescans_element() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let title = doc.tree.get_element_by_id("title").unwrap();
    doc.tree.set_attribute(title, "class", "headline alert");
    doc.tree.set_author_property(title, "background-color", "rgb(220, 40, 40)", false);
    engine.run_until_idle(&mut doc, 10);

    assert_eq!(engine.stats().mutation_frames, 1);
    assert!(inline(&doc, "title", "background-color").is_some());
}

#[test]
fn test_route_change_rescans_and_rechecks_site() {
    let mut doc = document("https://news.example.com/");
    let prefs = Preferences {
        site_blocklist: vec!["blocked.example.com".to_string()],
        ..Default::default()
    };
    let mut engine = engine(prefs);
    let mut history = HistoryHook::new(doc.url());
    engine.route_signal().connect(&mut history);

    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    history.push_state(None, "", "https://news.example.com/story/1");
    engine.run_until_idle(&mut doc, 10);
    assert_eq!(engine.stats().route_changes, 1);
    assert_eq!(engine.stats().full_scans_started, 2);
    assert_eq!(doc.url(), "https://news.example.com/story/1");

    history.push_state(None, "", "https://blocked.example.com/");
    engine.run_until_idle(&mut doc, 10);
    assert!(!engine.is_site_allowed());
    assert!(doc.tree.elements_with_attribute("data-retro-applied").is_empty());

    history.back();
    engine.run_until_idle(&mut doc, 10);
    assert!(engine.is_site_allowed());
    assert!(!doc.tree.elements_with_attribute("data-retro-applied").is_empty());
}

#[test]
fn test_blocked_site_is_never_touched() {
    let mut doc = document("https://ads.tracker.example/");
    let before = serialize(&doc);
    let prefs = Preferences {
        site_blocklist: vec!["tracker.example".to_string()],
        ..Default::default()
    };
    let mut engine = engine(prefs);
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    assert!(!engine.is_active());
    assert_eq!(engine.stats().full_scans_started, 0);
    assert_eq!(serialize(&doc), before);
}

#[test]
fn test_disable_mid_scan_leaves_page_clean() {
    let mut doc = document("https://news.example.com/");
    let body = doc.body().unwrap();
    for _ in 0..500 {
        let div = doc.tree.create_element("div");
        doc.tree.append_child(body, div).unwrap();
    }
    let before = serialize(&doc);

    let config = EngineConfig { scan_budget_ms: 5.0, ..Default::default() };
    let mut engine = RetroEngine::new(config, Preferences::default())
        .unwrap()
        .with_clock(retro_engine::SteppingClock::new(0.25));
    engine.start(&mut doc);
    engine.tick(&mut doc);
    assert!(engine.is_scanning());

    let off = Preferences { enabled: false, ..Default::default() };
    engine.update_preferences(&mut doc, off).unwrap();
    engine.run_until_idle(&mut doc, 100);

    assert_eq!(serialize(&doc), before);
}

#[test]
fn test_idle_fallback_to_timeouts() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default()).without_idle_callbacks();
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    assert_eq!(engine.stats().full_scans_completed, 1);
    assert!(engine.scheduler().stats().idle_fallbacks >= 1);
}

#[test]
fn test_dark_mode_darkens_background() {
    let mut doc = document("https://news.example.com/");
    let prefs = Preferences { mode: ThemeMode::Dark, intensity: 1.0, ..Default::default() };
    let mut engine = engine(prefs);
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let body = doc.body().unwrap();
    let bg = doc.tree.inline_style(body).unwrap().get_property_value("background-color").unwrap();
    let bg = retro_color::parse_color(bg).unwrap();
    assert!(retro_color::relative_luminance(bg) < retro_color::relative_luminance(retro_color::Rgba::WHITE));
}

#[test]
fn test_dispose_stops_observing() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);
    engine.dispose(&mut doc);

    let body = doc.body().unwrap();
    let div = doc.tree.create_element("div");
    doc.tree.append_child(body, div).unwrap();
    engine.run_until_idle(&mut doc, 10);
    assert!(!doc.tree.has_attribute(div, "data-retro-processed"));
}

#[test]
fn test_relative_navigation_stays_on_allowed_site() {
    let mut doc = document("https://news.example.com/");
    let prefs = Preferences {
        site_allowlist: vec!["news.example.com".to_string()],
        ..Default::default()
    };
    let mut engine = engine(prefs);
    let mut history = HistoryHook::new(doc.url());
    engine.route_signal().connect(&mut history);
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);
    let applied = doc.tree.elements_with_attribute("data-retro-applied").len();
    assert!(applied > 0);

    history.push_state(None, "", "/inbox");
    engine.run_until_idle(&mut doc, 10);
    assert!(engine.is_site_allowed());
    assert_eq!(doc.url(), "https://news.example.com/inbox");
    assert_eq!(doc.tree.elements_with_attribute("data-retro-applied").len(), applied);

    history.replace_state(None, "", "?page=2");
    engine.run_until_idle(&mut doc, 10);
    assert!(engine.is_site_allowed());
    assert_eq!(doc.url(), "https://news.example.com/inbox?page=2");

    history.push_state(None, "", "https://elsewhere.example.org/");
    engine.run_until_idle(&mut doc, 10);
    assert!(!engine.is_site_allowed());
    assert!(doc.tree.elements_with_attribute("data-retro-applied").is_empty());

    // past either end: no route change
    history.go(3);
    history.go(-3);
    engine.run_until_idle(&mut doc, 10);
    assert_eq!(engine.stats().route_changes, 3);

    history.back();
    engine.run_until_idle(&mut doc, 10);
    assert_eq!(engine.stats().route_changes, 4);
    assert_eq!(doc.url(), "https://news.example.com/inbox?page=2");
    assert!(engine.is_site_allowed());
    assert_eq!(doc.tree.elements_with_attribute("data-retro-applied").len(), applied);
}

#[test]
fn test_child_inserted_under_themed_parent_matches_parent() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);

    let lede = doc.tree.get_element_by_id("lede").unwrap();
    let themed = inline(&doc, "lede", "color").unwrap();
    let span = doc.tree.create_element("span");
    doc.tree.append_child(lede, span).unwrap();
    engine.run_until_idle(&mut doc, 10);

    assert_eq!(engine.stats().mutation_frames, 1);
    assert!(doc.tree.has_attribute(span, "data-retro-processed"));
    assert!(!doc.tree.has_attribute(span, "data-retro-applied"));
    assert_eq!(doc.tree.computed_value(span, "color"), Some(themed));

    engine.revert_all(&mut doc);
    assert_eq!(doc.tree.computed_value(span, "color").as_deref(), Some("rgb(10,10,10)"));
}

#[test]
fn test_detached_elements_release_snapshots() {
    let mut doc = document("https://news.example.com/");
    let mut engine = engine(Preferences::default());
    engine.start(&mut doc);
    engine.run_until_idle(&mut doc, 10);
    let stored = engine.applier().store().len();

    let lede = doc.tree.get_element_by_id("lede").unwrap();
    doc.tree.detach(lede);
    engine.run_until_idle(&mut doc, 10);

    assert_eq!(engine.applier().store().len(), stored - 1);
    assert_eq!(engine.stats().snapshots_pruned, 1);
    let style = doc.tree.inline_style(lede).unwrap();
    assert_eq!(style.get_property_value("color"), Some("rgb(10,10,10)"));
    assert!(!doc.tree.has_attribute(lede, "data-retro-applied"));

    // reinserted, it is themed again like any added element
    let body = doc.body().unwrap();
    doc.tree.append_child(body, lede).unwrap();
    engine.run_until_idle(&mut doc, 10);
    assert!(doc.tree.has_attribute(lede, "data-retro-applied"));
    assert_eq!(engine.applier().store().len(), stored);
}

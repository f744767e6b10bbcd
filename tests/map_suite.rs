use std::path::Path;

use maplabel::geometry::predicates::intersect_label_polygons;
use maplabel::render::{ImageMapRenderer, SvgRenderer};
use maplabel::{DrawSummary, LabelCache, LabelStatus, draw_map, load_map};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn fixture(rel: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn render_fixture(rel: &str) -> (String, DrawSummary, LabelCache) {
    let map = load_map(&fixture(rel)).expect("fixture load failed");
    let fonts = map.font_set();
    let mut cache = LabelCache::new();
    let mut svg = SvgRenderer::new(map.width, map.height).background(map.background);
    let summary = draw_map(&map, &fonts, &mut cache, &mut svg).expect("draw failed");
    (svg.finish(), summary, cache)
}

fn assert_drawn_labels_disjoint(cache: &LabelCache, fixture: &str) {
    let drawn: Vec<_> = cache.drawn().collect();
    for (i, (a_index, a)) in drawn.iter().enumerate() {
        for (b_index, b) in &drawn[i + 1..] {
            assert!(
                !intersect_label_polygons(&a.poly, &b.poly),
                "{fixture}: labels {a_index} and {b_index} overlap"
            );
        }
    }
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new documents must be added intentionally.
    let fixtures = ["towns.json", "roads.json5", "parks.json"];

    for rel in fixtures {
        assert!(fixture(rel).exists(), "fixture missing: {}", rel);
        let (svg, summary, cache) = render_fixture(rel);
        assert_valid_svg(&svg, rel);
        assert_eq!(summary.appended, cache.len(), "{rel}: appended count");
        assert_eq!(summary.drawn + summary.rejected, summary.appended, "{rel}: totals");
        assert!(
            cache.labels().iter().all(|l| l.status != LabelStatus::Pending),
            "{rel}: label left pending"
        );
        assert_drawn_labels_disjoint(&cache, rel);
    }
}

#[test]
fn towns_drop_edge_and_outside_labels() {
    let (svg, summary, cache) = render_fixture("towns.json");
    // the town outside the extent never reaches the cache
    assert_eq!(summary.appended, 4);
    assert!(!svg.contains("Nowhere"));

    // pinned to the top right corner with partials off, nothing fits
    let dunster = cache.labels().iter().find(|l| l.text == "Dunster").unwrap();
    assert_eq!(dunster.status, LabelStatus::Rejected);
    assert!(!svg.contains(">Dunster</text>"));

    for town in ["Ashby", "Brill", "Corfe"] {
        assert!(svg.contains(&format!(">{town}</text>")), "{town} not drawn");
    }
    // point layers paint their markers during the layer pass
    assert_eq!(svg.matches("<circle").count(), 4);
}

#[test]
fn roads_suppress_duplicates_and_short_lines() {
    let (svg, summary, cache) = render_fixture("roads.json5");
    assert_eq!(summary.appended, 4);
    assert_eq!(summary.drawn, 2);

    let statuses: Vec<_> = cache.labels().iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        [
            LabelStatus::Rejected,
            LabelStatus::Drawn,
            LabelStatus::Drawn,
            LabelStatus::Rejected
        ]
    );
    assert_eq!(svg.matches(">High St</text>").count(), 1);
    assert!(svg.contains(">Mill Lane</text>"));
    assert!(!svg.contains("Very Long Close Name"));

    // every road is stroked even when its label is dropped
    assert_eq!(svg.matches("<path").count(), 4);

    let mill = &cache.labels()[2];
    assert!((mill.label.angle - 90.0).abs() < 1e-9);
    assert!(svg.contains("rotate(-90.00"));
}

#[test]
fn parks_place_around_holes_and_markers() {
    let (svg, summary, cache) = render_fixture("parks.json");
    assert_eq!(summary.appended, 2);
    assert_eq!(summary.drawn, 2);
    assert_eq!(summary.immediate, 1);

    // the bounding box centre sits in the hole, so the anchor moves off it
    let common = &cache.labels()[0];
    assert!(common.point.x < 80.0 || common.point.x > 119.0);
    assert!(svg.contains("fill-rule=\"evenodd\""));

    let cafe = &cache.labels()[1];
    assert!(cafe.draw_marker);
    assert_eq!(cache.markers().len(), 1);
    assert_eq!(svg.matches("<rect x=").count(), 1);

    for text in ["Common", "Cafe", "A1"] {
        assert!(svg.contains(&format!(">{text}</text>")), "{text} not drawn");
    }
}

#[test]
fn parks_image_map_links_every_label() {
    let map = load_map(&fixture("parks.json")).unwrap();
    let mut cache = LabelCache::new();
    let mut html = ImageMapRenderer::new("parks").href("/search?q={text}");
    draw_map(&map, &map.font_set(), &mut cache, &mut html).unwrap();
    let html = html.finish();

    assert!(html.starts_with("<map name=\"parks\">"));
    assert_eq!(html.matches("shape=\"poly\"").count(), 3);
    assert_eq!(html.matches("shape=\"circle\"").count(), 1);
    assert!(html.contains("href=\"/search?q=Cafe\""));
}

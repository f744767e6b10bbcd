use maplabel::error::{CacheState, Error};
use maplabel::geometry::{
    Point, Rect, Shape, adjust_extent, clip_polygon, clip_polyline, to_map, to_pixel,
};
use maplabel::label::{
    BitmapSize, Candidate, LabelCache, LabelFont, LabelRequest, LabelStatus, LabelStyle,
    LayerType, PlacementTrace, Position, Rejection, Style, get_metrics,
};
use maplabel::render::{LabelRenderer, draw_label_cache};
use maplabel::FontSet;

const W: f64 = 600.0;
const H: f64 = 600.0;

fn tiny(position: Position) -> LabelStyle {
    LabelStyle {
        font: LabelFont::Bitmap(BitmapSize::Tiny),
        position,
        ..LabelStyle::default()
    }
}

fn marker(size: f64) -> Vec<Style> {
    vec![Style {
        size,
        ..Style::default()
    }]
}

#[derive(Default)]
struct Trace {
    visits: Vec<usize>,
    candidates: Vec<(usize, Candidate)>,
    rejections: Vec<(usize, Rejection)>,
    settled: Vec<(usize, LabelStatus)>,
}

impl Trace {
    fn candidates_for(&self, index: usize) -> Vec<Candidate> {
        self.candidates
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, c)| *c)
            .collect()
    }

    fn rejections_for(&self, index: usize) -> Vec<Rejection> {
        self.rejections
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, r)| *r)
            .collect()
    }
}

impl PlacementTrace for Trace {
    fn visit(&mut self, index: usize) {
        self.visits.push(index);
    }

    fn candidate(&mut self, index: usize, candidate: &Candidate) {
        self.candidates.push((index, *candidate));
    }

    fn rejected(&mut self, index: usize, reason: Rejection) {
        self.rejections.push((index, reason));
    }

    fn settled(&mut self, index: usize, status: LabelStatus) {
        self.settled.push((index, status));
    }
}

#[derive(Default)]
struct TextLog {
    texts: Vec<String>,
}

impl LabelRenderer for TextLog {
    fn name(&self) -> &'static str {
        "log"
    }

    fn draw_marker(&mut self, _point: &Point, _style: &Style) -> maplabel::Result<()> {
        Ok(())
    }

    fn draw_text(
        &mut self,
        _origin: &Point,
        text: &str,
        _label: &LabelStyle,
        _fonts: &FontSet,
    ) -> maplabel::Result<()> {
        self.texts.push(text.to_string());
        Ok(())
    }
}

fn process(cache: &mut LabelCache) -> Trace {
    let mut trace = Trace::default();
    cache
        .process_traced(&FontSet::new(), W, H, &mut trace)
        .unwrap();
    trace
}

fn statuses(cache: &LabelCache) -> Vec<LabelStatus> {
    cache.labels().iter().map(|e| e.status).collect()
}

// A 100x48 block of text centred on `at`, used to crowd other labels out.
fn blocker(at: Point) -> LabelRequest {
    let label = LabelStyle {
        wrap: Some('|'),
        ..tiny(Position::Cc)
    };
    let line = "X".repeat(20);
    let text = vec![line.as_str(); 6].join("|");
    LabelRequest::new(text, at, label).class(99)
}

#[test]
fn placement_runs_newest_first_and_drawing_oldest_first() {
    let mut cache = LabelCache::new();
    for i in 0..5 {
        cache
            .append(LabelRequest::new(
                format!("L{i}"),
                Point::new(50.0 + 100.0 * i as f64, 50.0),
                tiny(Position::Cc),
            ))
            .unwrap();
    }
    let trace = process(&mut cache);
    assert_eq!(trace.visits, vec![4, 3, 2, 1, 0]);

    let mut log = TextLog::default();
    assert_eq!(draw_label_cache(&cache, &FontSet::new(), &mut log).unwrap(), 5);
    assert_eq!(log.texts, vec!["L0", "L1", "L2", "L3", "L4"]);
}

#[test]
fn every_entry_settles_exactly_once() {
    let mut cache = LabelCache::new();
    for i in 0..6 {
        // pairs share an anchor, so one of each pair is rejected
        cache
            .append(LabelRequest::new(
                "same",
                Point::new(100.0 + 100.0 * (i / 2) as f64, 100.0),
                tiny(Position::Cc),
            ))
            .unwrap();
    }
    let trace = process(&mut cache);
    for i in 0..6 {
        let settled: Vec<_> = trace.settled.iter().filter(|(j, _)| *j == i).collect();
        assert_eq!(settled.len(), 1, "entry {i}");
        assert_ne!(settled[0].1, LabelStatus::Pending);
    }
    assert_eq!(
        statuses(&cache),
        vec![
            LabelStatus::Rejected,
            LabelStatus::Drawn,
            LabelStatus::Rejected,
            LabelStatus::Drawn,
            LabelStatus::Rejected,
            LabelStatus::Drawn,
        ]
    );
}

#[test]
fn label_may_overlap_its_own_marker_but_not_others() {
    let mut cache = LabelCache::new();
    // box 10..15 x 40..48 sits inside the other label's marker only
    cache
        .append(LabelRequest::new("x", Point::new(10.0, 40.0), tiny(Position::Lr)))
        .unwrap();
    cache
        .append(
            LabelRequest::new("x", Point::new(20.0, 50.0), tiny(Position::Cc))
                .layer(LayerType::Point, 1)
                .class(1)
                .markers(marker(20.0)),
        )
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Rejected, LabelStatus::Drawn]);
    assert!(trace.rejections_for(1).is_empty());
    assert_eq!(trace.rejections_for(0), vec![Rejection::Marker]);
}

#[test]
fn marker_blocks_even_when_its_label_is_rejected() {
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("x", Point::new(300.0, 330.0), tiny(Position::Lr)))
        .unwrap();
    cache
        .append(
            LabelRequest::new("pt", Point::new(310.0, 340.0), tiny(Position::Ul))
                .layer(LayerType::Point, 1)
                .class(1)
                .markers(marker(30.0)),
        )
        .unwrap();
    cache.append(blocker(Point::new(300.0, 300.0))).unwrap();
    let trace = process(&mut cache);
    assert_eq!(
        statuses(&cache),
        vec![LabelStatus::Rejected, LabelStatus::Rejected, LabelStatus::Drawn]
    );
    assert_eq!(trace.rejections_for(1), vec![Rejection::Overlap]);
    assert_eq!(trace.rejections_for(0), vec![Rejection::Marker]);
    assert!(cache.markers()[0].registered);
}

#[test]
fn image_bounds_are_checked_before_markers() {
    let label = LabelStyle {
        partials: false,
        ..tiny(Position::Cc)
    };
    let mut cache = LabelCache::new();
    // box -0.5..4.5 leaves the image and lies inside the marker below
    cache
        .append(LabelRequest::new("x", Point::new(2.0, 10.0), label))
        .unwrap();
    cache
        .append(
            LabelRequest::new("m", Point::new(10.0, 10.0), tiny(Position::Cc))
                .layer(LayerType::Point, 1)
                .class(1)
                .markers(marker(20.0)),
        )
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Rejected, LabelStatus::Drawn]);
    assert_eq!(trace.rejections_for(0), vec![Rejection::OutOfImage]);
}

#[test]
fn markers_are_checked_before_duplicates() {
    let label = LabelStyle {
        min_distance: Some(50.0),
        ..tiny(Position::Cc)
    };
    let mut cache = LabelCache::new();
    // same text and class 10px away, and inside the other entry's marker
    cache
        .append(LabelRequest::new("dup", Point::new(100.0, 110.0), label.clone()))
        .unwrap();
    cache
        .append(
            LabelRequest::new(
                "dup",
                Point::new(100.0, 100.0),
                LabelStyle {
                    position: Position::Ul,
                    ..label
                },
            )
            .layer(LayerType::Point, 1)
            .markers(marker(30.0)),
        )
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Rejected, LabelStatus::Drawn]);
    assert_eq!(trace.rejections_for(0), vec![Rejection::Marker]);
}

#[test]
fn identical_nearby_labels_are_suppressed() {
    let label = LabelStyle {
        min_distance: Some(50.0),
        ..tiny(Position::Cc)
    };
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("Main St", Point::new(100.0, 100.0), label.clone()))
        .unwrap();
    cache
        .append(LabelRequest::new("Main St", Point::new(100.0, 130.0), label.clone()))
        .unwrap();
    // different class: never a duplicate
    cache
        .append(LabelRequest::new("Main St", Point::new(100.0, 160.0), label).class(2))
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(
        statuses(&cache),
        vec![LabelStatus::Rejected, LabelStatus::Drawn, LabelStatus::Drawn]
    );
    assert_eq!(trace.rejections_for(0), vec![Rejection::Duplicate]);
}

#[test]
fn duplicate_test_is_off_without_min_distance() {
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("A", Point::new(100.0, 100.0), tiny(Position::Cc)))
        .unwrap();
    cache
        .append(LabelRequest::new("A", Point::new(100.0, 120.0), tiny(Position::Cc)))
        .unwrap();
    process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Drawn, LabelStatus::Drawn]);
}

#[test]
fn line_auto_tries_two_candidates() {
    let mut cache = LabelCache::new();
    cache
        .append(
            LabelRequest::new("road", Point::new(300.0, 300.0), tiny(Position::Auto))
                .layer(LayerType::Line, 0),
        )
        .unwrap();
    cache.append(blocker(Point::new(300.0, 300.0))).unwrap();
    let trace = process(&mut cache);
    let tried = trace.candidates_for(0);
    assert_eq!(tried.len(), 2);
    assert_eq!(tried[0].position, Position::Uc);
    assert_eq!(tried[1].position, Position::Lc);
    assert_eq!(tried[1].angle, 0.0);
    assert_eq!(cache.labels()[0].status, LabelStatus::Rejected);
}

#[test]
fn steep_line_auto_retries_upside_down() {
    let label = LabelStyle {
        angle: 85.0,
        ..tiny(Position::Auto)
    };
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("road", Point::new(300.0, 300.0), label).layer(LayerType::Line, 0))
        .unwrap();
    cache.append(blocker(Point::new(300.0, 300.0))).unwrap();
    let trace = process(&mut cache);
    let tried = trace.candidates_for(0);
    assert_eq!(tried.len(), 2);
    assert_eq!(tried[1].position, Position::Uc);
    assert_eq!(tried[1].angle, 265.0);
}

#[test]
fn line_auto_accepts_first_free_side() {
    let mut cache = LabelCache::new();
    cache
        .append(
            LabelRequest::new("road", Point::new(300.0, 300.0), tiny(Position::Auto))
                .layer(LayerType::Line, 0),
        )
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(trace.candidates_for(0).len(), 1);
    assert_eq!(cache.labels()[0].label.position, Position::Uc);
}

#[test]
fn compass_auto_stops_at_first_fit() {
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("ab", Point::new(100.0, 100.0), tiny(Position::Auto)))
        .unwrap();
    // covers the upper-left slot only
    cache
        .append(LabelRequest::new("x", Point::new(90.0, 90.0), tiny(Position::Cc)).class(1))
        .unwrap();
    let trace = process(&mut cache);
    let positions: Vec<_> = trace.candidates_for(0).iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![Position::Ul, Position::Lr]);
    assert_eq!(cache.labels()[0].status, LabelStatus::Drawn);
    assert_eq!(cache.labels()[0].label.position, Position::Lr);
}

#[test]
fn compass_auto_tries_all_eight_in_order() {
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("ab", Point::new(300.0, 300.0), tiny(Position::Auto)))
        .unwrap();
    cache.append(blocker(Point::new(300.0, 300.0))).unwrap();
    let trace = process(&mut cache);
    let positions: Vec<_> = trace.candidates_for(0).iter().map(|c| c.position).collect();
    assert_eq!(positions, Position::AUTO_ORDER.to_vec());
    assert_eq!(trace.rejections_for(0), vec![Rejection::Overlap; 8]);
    assert_eq!(cache.labels()[0].status, LabelStatus::Rejected);
}

#[test]
fn force_keeps_last_candidate() {
    let label = LabelStyle {
        force: true,
        ..tiny(Position::Auto)
    };
    let anchor = Point::new(300.0, 300.0);
    let mut cache = LabelCache::new();
    cache.append(LabelRequest::new("ab", anchor, label)).unwrap();
    cache.append(blocker(anchor)).unwrap();
    process(&mut cache);

    let entry = &cache.labels()[0];
    assert_eq!(entry.status, LabelStatus::Drawn);
    assert_eq!(entry.label.position, Position::Lc);
    let expected = get_metrics(
        &anchor,
        Position::Lc,
        &Rect::new(0.0, -8.0, 10.0, 0.0),
        (0.0, 0.0),
        0.0,
        0.0,
    );
    assert_eq!(entry.poly, expected.poly);
    assert_eq!(entry.label_point, expected.origin);
}

#[test]
fn forced_fixed_label_is_drawn_over_others() {
    let label = LabelStyle {
        force: true,
        ..tiny(Position::Cc)
    };
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("ab", Point::new(300.0, 300.0), label))
        .unwrap();
    cache.append(blocker(Point::new(300.0, 300.0))).unwrap();
    process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Drawn, LabelStatus::Drawn]);
}

#[test]
fn transform_round_trip_within_a_cell() {
    let extent = Rect::new(-120.0, 30.0, -100.0, 45.0);
    let (extent, cellsize) = adjust_extent(&extent, 800, 600).unwrap();
    let original = Shape::line(vec![
        Point::new(-119.3, 31.7),
        Point::new(-110.01, 40.2),
        Point::new(-100.5, 44.9),
    ]);
    let mut shape = original.clone();
    to_pixel(&mut shape, &extent, cellsize);
    to_map(&mut shape, &extent, cellsize);
    for (a, b) in original.vertices().zip(shape.vertices()) {
        assert!((a.x - b.x).abs() <= cellsize);
        assert!((a.y - b.y).abs() <= cellsize);
    }
}

#[test]
fn clipping_never_leaves_the_rectangle() {
    let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
    let zigzag: Vec<Point> = (0..20)
        .map(|i| Point::new(-20.0 + 7.0 * i as f64, if i % 2 == 0 { -30.0 } else { 80.0 }))
        .collect();

    let mut line = Shape::line(zigzag.clone());
    clip_polyline(&mut line, &rect);
    assert!(line.num_parts() > 1);

    let mut ring = zigzag;
    ring.push(ring[0]);
    let mut polygon = Shape::polygon(ring);
    clip_polygon(&mut polygon, &rect);

    for p in line.vertices().chain(polygon.vertices()) {
        assert!(p.x >= -1e-9 && p.x <= 50.0 + 1e-9, "{p:?}");
        assert!(p.y >= -1e-9 && p.y <= 50.0 + 1e-9, "{p:?}");
    }
    for ring in &polygon.parts {
        assert_eq!(ring.first(), ring.last());
    }
}

#[test]
fn near_duplicate_scenario() {
    let label = LabelStyle {
        min_distance: Some(5.0),
        ..tiny(Position::Ul)
    };
    let mut cache = LabelCache::new();
    let anchors = [
        Point::new(10.0, 10.0),
        Point::new(10.0, 10.25),
        Point::new(500.0, 500.0),
    ];
    let indices: Vec<_> = anchors
        .iter()
        .map(|p| cache.append(LabelRequest::new("A", *p, label.clone())).unwrap())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let trace = process(&mut cache);
    assert_eq!(
        statuses(&cache),
        vec![LabelStatus::Rejected, LabelStatus::Drawn, LabelStatus::Drawn]
    );
    assert_eq!(trace.rejections_for(0), vec![Rejection::Duplicate]);
}

#[test]
fn partial_labels_can_be_refused() {
    let label = LabelStyle {
        partials: false,
        ..tiny(Position::Ul)
    };
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("edge", Point::new(0.0, 0.0), label))
        .unwrap();
    let trace = process(&mut cache);
    assert_eq!(statuses(&cache), vec![LabelStatus::Rejected]);
    assert_eq!(trace.rejections_for(0), vec![Rejection::OutOfImage]);
}

#[test]
fn adjusted_extent_keeps_cells_square() {
    let (adjusted, cellsize) = adjust_extent(&Rect::new(0.0, 0.0, 1000.0, 100.0), 201, 201).unwrap();
    assert!((adjusted.width() - adjusted.height()).abs() < 1e-9);
    assert!((cellsize - 5.0).abs() < 1e-9);
    assert!(adjusted.miny <= 0.0 && adjusted.maxy >= 100.0);
}

#[test]
fn cache_lifecycle_violations_are_errors() {
    let fonts = FontSet::new();
    let mut cache = LabelCache::new();
    let mut log = TextLog::default();
    assert!(matches!(
        draw_label_cache(&cache, &fonts, &mut log),
        Err(Error::CacheState {
            state: CacheState::Open,
            ..
        })
    ));
    cache.process(&fonts, W, H).unwrap();
    assert!(matches!(
        cache.append(LabelRequest::new("late", Point::new(1.0, 1.0), tiny(Position::Cc))),
        Err(Error::CacheState {
            state: CacheState::Processed,
            ..
        })
    ));
}

#[test]
fn unknown_font_fails_the_whole_pass() {
    let broken = LabelStyle {
        font: LabelFont::Truetype {
            alias: "nope".to_string(),
            size: 10.0,
        },
        ..LabelStyle::default()
    };
    let mut cache = LabelCache::new();
    cache
        .append(LabelRequest::new("ok", Point::new(10.0, 10.0), tiny(Position::Cc)))
        .unwrap();
    cache
        .append(LabelRequest::new("bad", Point::new(50.0, 50.0), broken))
        .unwrap();
    let err = cache.process(&FontSet::new(), W, H).unwrap_err();
    assert!(matches!(err, Error::UnknownFont(alias) if alias == "nope"));
    assert_eq!(cache.state(), CacheState::Failed);

    cache.reset();
    assert_eq!(cache.state(), CacheState::Open);
    assert!(cache.is_empty());
}

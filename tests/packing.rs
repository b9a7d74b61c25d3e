use rect_packer::{
    Dimension, Margin, PackOptions, PackReport, PackingConfig, RectSpec, SpecMatching, pack,
    pack_async,
};

fn spec(id: &str, w: f64, h: f64) -> RectSpec {
    RectSpec::new(id, w, h).expect("valid spec")
}

fn all_ids(report: &PackReport) -> Vec<String> {
    let mut ids: Vec<String> = report
        .packed_rectangles
        .iter()
        .chain(report.unpacked_rectangles.iter())
        .map(|r| r.id.clone())
        .collect();
    ids.sort();
    ids
}

fn assert_no_overlap(report: &PackReport) {
    let rects = &report.packed_rectangles;
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            let separated =
                a.x + a.w <= b.x || b.x + b.w <= a.x || a.y + a.h <= b.y || b.y + b.h <= a.y;
            assert!(separated, "{} and {} overlap", a.id, b.id);
        }
    }
}

#[tokio::test]
async fn pack_async_completes_a_sprite_sheet() {
    let rects = vec![
        spec("hero", 4.0, 4.0),
        spec("tile-1", 2.0, 2.0),
        spec("tile-2", 2.0, 2.0),
        spec("banner", 2.0, 4.0),
        spec("icon", 2.0, 2.0),
        spec("bar", 6.0, 2.0),
    ];
    let report = pack_async(
        rects,
        Dimension::new(8.0, 6.0),
        PackOptions::default(),
        PackingConfig::default(),
    )
    .await
    .expect("packing should not fail");

    assert_eq!(
        all_ids(&report),
        vec!["banner", "bar", "hero", "icon", "tile-1", "tile-2"]
    );
    assert_no_overlap(&report);
    for rect in &report.packed_rectangles {
        assert!(rect.x >= 0.0 && rect.y >= 0.0);
        assert!(rect.x + rect.w <= 8.0 && rect.y + rect.h <= 6.0);
    }
}

#[tokio::test]
async fn pack_async_reports_pre_check_failure() {
    let report = pack_async(
        vec![spec("wide", 9.0, 1.0)],
        Dimension::new(10.0, 10.0),
        PackOptions {
            margin: Margin::uniform(1.0),
            ..PackOptions::default()
        },
        PackingConfig::default(),
    )
    .await
    .expect("rejection is data, not an error");

    assert!(report.packed_rectangles.is_empty());
    assert!(report.is_remaining);
    assert!(report.error.is_some());
}

#[test]
fn margins_keep_rectangles_inside_the_play_field() {
    let margin = Margin::new(1.0, 2.0, 1.0, 2.0);
    let report = pack(
        vec![spec("a", 3.0, 3.0), spec("b", 3.0, 3.0), spec("c", 2.0, 2.0)],
        Dimension::new(12.0, 5.0),
        PackOptions {
            margin,
            ..PackOptions::default()
        },
        PackingConfig::default(),
    )
    .expect("packing should not fail");

    assert_eq!(all_ids(&report), vec!["a", "b", "c"]);
    assert!(report.is_complete());
    assert_no_overlap(&report);
    for rect in &report.packed_rectangles {
        assert!(rect.x >= margin.left && rect.y >= margin.top, "{:?}", rect);
        assert!(rect.x + rect.w <= 12.0 - margin.right, "{:?}", rect);
        assert!(rect.y + rect.h <= 5.0 - margin.bottom, "{:?}", rect);
    }
}

#[test]
fn padding_round_trip_restores_requested_sizes() {
    let padding = 0.5;
    let requested = [(3.0, 1.0), (2.0, 2.0), (1.0, 1.0)];
    let rects = requested
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| spec(&format!("r{i}"), w, h))
        .collect();
    let report = pack(
        rects,
        Dimension::new(6.0, 4.0),
        PackOptions {
            padding,
            ..PackOptions::default()
        },
        PackingConfig::default(),
    )
    .expect("packing should not fail");

    assert!(report.is_complete());
    for rect in &report.packed_rectangles {
        let index: usize = rect.id[1..].parse().expect("numeric suffix");
        let (w, h) = requested[index];
        let (rw, rh) = if rect.rotated { (rect.h, rect.w) } else { (rect.w, rect.h) };
        assert_eq!((rw, rh), (w, h), "size of {} changed", rect.id);
    }
}

#[test]
fn duplicate_sizes_keep_ids_intact_with_identity_matching() {
    let rects = vec![spec("first", 3.0, 3.0), spec("second", 3.0, 3.0), spec("third", 3.0, 3.0)];
    let config = PackingConfig::builder()
        .spec_matching(SpecMatching::Identity)
        .build();
    let report = pack(rects, Dimension::new(6.0, 3.0), PackOptions::default(), config)
        .expect("packing should not fail");

    assert_eq!(report.packed_count(), 2);
    assert_eq!(all_ids(&report), vec!["first", "second", "third"]);
}

#[test]
fn duplicate_sizes_keep_ids_intact_with_default_matching() {
    let rects = vec![
        spec("wide", 4.0, 2.0),
        spec("tall", 2.0, 4.0),
        spec("block", 3.0, 3.0),
        spec("flat", 4.0, 2.0),
    ];
    let report = pack(
        rects,
        Dimension::new(6.0, 4.0),
        PackOptions::default(),
        PackingConfig::default(),
    )
    .expect("packing should not fail");

    assert_eq!(all_ids(&report), vec!["block", "flat", "tall", "wide"]);
    assert_no_overlap(&report);
}

#[test]
fn repeated_runs_are_deterministic() {
    let run = || {
        let rects = vec![
            spec("a", 2.0, 3.0),
            spec("b", 3.0, 1.0),
            spec("c", 1.0, 1.0),
            spec("d", 2.0, 2.0),
        ];
        pack(
            rects,
            Dimension::new(5.0, 4.0),
            PackOptions::default(),
            PackingConfig::default(),
        )
        .expect("packing should not fail")
    };
    let first = run();
    let second = run();

    assert_eq!(first.packed_rectangles, second.packed_rectangles);
    assert_eq!(first.unpacked_rectangles, second.unpacked_rectangles);
}

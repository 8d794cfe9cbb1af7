//! Engine behaviour against an in-memory provider that counts its calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::StreamExt;
use geo::{Geometry, GeometryCollection, LineString, Point, Polygon, Rect};
use panofind_core::{
    CoverageTier, Extra, GeoPoint, LocationOptions, PanningMode, PanoramaRecord, PredicateOption,
    Scalar,
};
use panofind_finder::{
    collect_locations, Finder, FinderError, LocationSource, RetryPolicy, SamplingStrategy,
};
use panofind_imagery::{ImageryError, PanoramaProvider};

type Responder =
    Box<dyn Fn(u32, GeoPoint, CoverageTier) -> Result<Option<PanoramaRecord>, ImageryError> + Send + Sync>;
type Delay = Box<dyn Fn(GeoPoint) -> Duration + Send + Sync>;

struct FakeProvider {
    respond: Responder,
    delay: Delay,
    by_id: HashMap<String, PanoramaRecord>,
    tiles: HashMap<(u32, u32), Vec<PanoramaRecord>>,
    search_calls: AtomicU32,
    official_calls: AtomicU32,
    unofficial_calls: AtomicU32,
    by_id_calls: AtomicU32,
    tile_calls: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

impl FakeProvider {
    fn new(
        respond: impl Fn(u32, GeoPoint, CoverageTier) -> Result<Option<PanoramaRecord>, ImageryError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: Box::new(|_| Duration::ZERO),
            by_id: HashMap::new(),
            tiles: HashMap::new(),
            search_calls: AtomicU32::new(0),
            official_calls: AtomicU32::new(0),
            unofficial_calls: AtomicU32::new(0),
            by_id_calls: AtomicU32::new(0),
            tile_calls: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
        }
    }

    fn with_delay(mut self, delay: impl Fn(GeoPoint) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    fn with_record(mut self, record: PanoramaRecord) -> Self {
        self.by_id.insert(record.id.clone(), record);
        self
    }

    fn with_tile(mut self, x: u32, y: u32, records: Vec<PanoramaRecord>) -> Self {
        self.tiles.insert((x, y), records);
        self
    }

    fn official(&self) -> u32 {
        self.official_calls.load(Ordering::SeqCst)
    }

    fn unofficial(&self) -> u32 {
        self.unofficial_calls.load(Ordering::SeqCst)
    }
}

impl PanoramaProvider for FakeProvider {
    async fn find_panorama(
        &self,
        point: GeoPoint,
        _radius_m: u32,
        _locale: &str,
        tier: CoverageTier,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst);
        match tier {
            CoverageTier::Official => self.official_calls.fetch_add(1, Ordering::SeqCst),
            CoverageTier::Unofficial => self.unofficial_calls.fetch_add(1, Ordering::SeqCst),
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = (self.delay)(point);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(call, point, tier)
    }

    async fn find_panorama_by_id(
        &self,
        id: &str,
        _locale: &str,
        _want_depth: bool,
    ) -> Result<Option<PanoramaRecord>, ImageryError> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_id.get(id).cloned())
    }

    async fn get_tile_coverage(
        &self,
        tile_x: u32,
        tile_y: u32,
    ) -> Result<Vec<PanoramaRecord>, ImageryError> {
        self.tile_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tiles.get(&(tile_x, tile_y)).cloned().unwrap_or_default())
    }
}

/// A search-style record: extended metadata, no places.
fn pano(id: &str, position: GeoPoint) -> PanoramaRecord {
    let mut p = PanoramaRecord::basic(id, position, 90.0);
    p.has_extended_info = true;
    p.source = Some("launch".to_owned());
    p.link_count = Some(2);
    p
}

/// Metres to degrees of latitude (and of longitude near the equator).
fn deg(metres: f64) -> f64 {
    metres / 111_195.08
}

fn square(side_m: f64) -> Geometry<f64> {
    let d = deg(side_m);
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![(0.0, 0.0), (d, 0.0), (d, d), (0.0, d), (0.0, 0.0)]),
        vec![],
    ))
}

fn point(lat: f64, lng: f64) -> Geometry<f64> {
    Geometry::Point(Point::new(lng, lat))
}

fn no_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 0,
        backoff_base_ms: 0,
    }
}

fn permissive<P: PanoramaProvider>(finder: Finder<P>) -> Finder<P> {
    finder
        .with_options(LocationOptions::permissive())
        .with_retry_policy(no_retries())
}

#[tokio::test]
async fn rejected_unofficial_means_no_secondary_call() {
    let provider = FakeProvider::new(|_, _, _| Ok(None));
    let finder = Finder::vertices(provider).with_retry_policy(no_retries());
    assert!(!finder.options().allows_unofficial());

    let found = finder.search_all(&point(10.0, 10.0), None).await;
    assert!(found.is_empty());
    assert_eq!(finder.provider().official(), 1);
    assert_eq!(finder.provider().unofficial(), 0);
}

#[tokio::test]
async fn allowed_unofficial_is_searched_after_official_misses() {
    let provider = FakeProvider::new(|_, p, tier| match tier {
        CoverageTier::Official => Ok(None),
        CoverageTier::Unofficial => {
            let mut third_party = pano("contributed", p);
            third_party.is_third_party = true;
            Ok(Some(third_party))
        }
    });
    let finder = permissive(Finder::vertices(provider));

    let found = finder.search_all(&point(10.0, 10.0), None).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].panorama.id, "contributed");
    assert_eq!(finder.provider().official(), 1);
    assert_eq!(finder.provider().unofficial(), 1);
}

#[tokio::test]
async fn unofficial_tier_is_tried_when_official_is_rejected() {
    let provider = FakeProvider::new(|_, p, tier| {
        Ok(Some(match tier {
            CoverageTier::Official => {
                let mut trekker = pano("trekker", p);
                trekker.source = Some("scout".to_owned());
                trekker
            }
            CoverageTier::Unofficial => {
                let mut third_party = pano("contributed", p);
                third_party.is_third_party = true;
                third_party
            }
        }))
    });
    let options = LocationOptions {
        trekker: PredicateOption::Reject,
        ..LocationOptions::permissive()
    };
    let finder = permissive(Finder::vertices(provider)).with_options(options);

    let found = finder.search_all(&point(1.0, 1.0), None).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].panorama.id, "contributed");
}

#[tokio::test]
async fn official_result_skips_secondary_tier() {
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano("official", p))));
    let finder = permissive(Finder::vertices(provider));

    let found = finder.search_all(&point(1.0, 1.0), None).await;
    assert_eq!(found.len(), 1);
    assert_eq!(finder.provider().unofficial(), 0);
}

#[tokio::test]
async fn buildings_reject_fails_closed_without_places() {
    let position = GeoPoint::new(5.0, 5.0);
    let mut full = pano("empty-places", position);
    full.has_places = true;
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano("empty-places", p)))).with_record(full);
    let options = LocationOptions {
        buildings: PredicateOption::Reject,
        ..LocationOptions::default()
    };
    let finder = Finder::vertices(provider)
        .with_options(options)
        .with_retry_policy(no_retries());

    let found = finder.search_all(&point(5.0, 5.0), None).await;
    assert!(found.is_empty());
    assert_eq!(finder.provider().by_id_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn point_geometry_yields_at_most_one_result() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{call}"), p))));
    let finder = permissive(Finder::random(provider, 10));

    let found = finder.search_all(&point(-41.29, 174.78), Some("stop")).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].origin, GeoPoint::new(-41.29, 174.78));
    assert_eq!(finder.provider().official(), 1);
}

#[tokio::test]
async fn random_search_stops_at_batch_budget_with_partial_result() {
    // Only two distinct panoramas exist, whichever point is asked.
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{}", call % 2), p))));
    let finder = permissive(Finder::random(provider, 5))
        .with_max_batches(Some(1))
        .with_seed(11);

    let found = finder.search_all(&square(500.0), None).await;
    assert_eq!(found.len(), 2);
    // one batch of five points
    assert_eq!(finder.provider().official(), 5);
}

#[tokio::test]
async fn zero_batch_budget_still_runs_one_batch() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{}", call % 2), p))));
    let finder = permissive(Finder::random(provider, 5))
        .with_max_batches(Some(0))
        .with_seed(11);

    let found = finder.search_all(&square(500.0), None).await;
    assert_eq!(found.len(), 2);
    assert_eq!(finder.provider().official(), 5);

    let direct = finder.search_until_n(&square(500.0), None, 3, 0).await;
    assert!(!direct.is_empty());
    assert_eq!(finder.provider().official(), 8);
}

#[tokio::test]
async fn non_finite_geometry_yields_nothing_from_search_until_n() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{call}"), p))));
    let finder = permissive(Finder::random(provider, 3)).with_seed(2);
    let broken = Geometry::Polygon(Polygon::new(
        LineString::from(vec![(f64::NAN, 0.0), (0.01, 0.0), (0.01, 0.01), (f64::NAN, 0.0)]),
        vec![],
    ));

    assert!(finder.search_until_n(&broken, None, 3, 5).await.is_empty());
    assert_eq!(finder.provider().official(), 0);
}

#[tokio::test]
async fn random_search_tops_up_shortfall_in_later_batches() {
    // Every other lookup finds nothing.
    let provider = FakeProvider::new(|call, p, _| {
        Ok((call % 2 == 0).then(|| pano(&format!("p{call}"), p)))
    });
    let finder = permissive(Finder::random(provider, 4)).with_seed(3);

    let found = finder.search_all(&square(500.0), None).await;
    assert_eq!(found.len(), 4);
    let calls = finder.provider().official();
    assert!(calls > 4, "needed more than one batch, made {calls} calls");
    // each batch asks only for the shortfall: 4, then 2, then 1, then 1
    assert!(calls <= 8, "made {calls} calls");
}

#[tokio::test]
async fn random_search_never_exceeds_n() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{call}"), p))));
    let finder = permissive(Finder::random(provider, 5)).with_seed(5);

    let found = finder.search_all(&square(300.0), None).await;
    assert_eq!(found.len(), 5);
    assert_eq!(finder.provider().official(), 5);
}

#[tokio::test]
async fn lattice_200m_square_at_50m_and_dedup() {
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano("same", p))));
    let finder = permissive(Finder::lattice(provider, 50.0));

    let found = finder.search_all(&square(200.0), None).await;
    assert_eq!(found.len(), 1, "one panorama id reachable from every point");
    let calls = finder.provider().official();
    assert!((15..=17).contains(&calls), "expected about 16 lookups, got {calls}");
}

#[tokio::test]
async fn concurrency_limit_is_respected() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{call}"), p))))
        .with_delay(|_| Duration::from_millis(20));
    let finder = permissive(Finder::lattice(provider, 50.0)).with_concurrency(3);

    let found = finder.search_all(&square(200.0), None).await;
    assert!(found.len() >= 15);
    let peak = finder.provider().max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight lookups {peak}");
    assert!(peak > 1, "lookups never overlapped");
}

#[tokio::test]
async fn results_arrive_in_completion_order() {
    let slow = GeoPoint::new(0.0, 0.0);
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano(&format!("{}", p.lng), p))))
        .with_delay(move |p| {
            if p == slow {
                Duration::from_millis(50)
            } else {
                Duration::ZERO
            }
        });
    let finder = permissive(Finder::vertices(provider)).with_concurrency(2);
    let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]));

    let found = finder.search_all(&line, None).await;
    let ids: Vec<&str> = found.iter().map(|f| f.panorama.id.as_str()).collect();
    assert_eq!(ids, ["1", "0"]);
}

#[tokio::test]
async fn transient_errors_are_retried() {
    let provider = FakeProvider::new(|call, p, _| {
        if call == 0 {
            Err(ImageryError::malformed("/panoramas/nearest", "truncated"))
        } else {
            Ok(Some(pano("after-retry", p)))
        }
    });
    let finder = Finder::vertices(provider)
        .with_options(LocationOptions::permissive())
        .with_retry_policy(RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 0,
        });

    let found = finder.search_all(&point(1.0, 1.0), None).await;
    assert_eq!(found.len(), 1);
    assert_eq!(finder.provider().official(), 2);
}

#[tokio::test]
async fn failing_points_are_skipped_not_fatal() {
    let provider = FakeProvider::new(|_, p, _| {
        if p.lng < 0.5 {
            Err(ImageryError::InvalidRequest("rejected".to_owned()))
        } else {
            Ok(Some(pano("good", p)))
        }
    });
    let finder = Finder::vertices(provider)
        .with_options(LocationOptions::permissive())
        .with_retry_policy(RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 0,
        });
    let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]));

    let found = finder.search_all(&line, None).await;
    assert_eq!(found.len(), 1);
    // permanent errors are not retried, and an erroring official tier does
    // not fall through to the unofficial one
    assert_eq!(finder.provider().official(), 2);
    assert_eq!(finder.provider().unofficial(), 0);
}

#[tokio::test]
async fn collection_parts_share_one_dedup_set() {
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano("shared", p))));
    let finder = permissive(Finder::vertices(provider));
    let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
        point(1.0, 1.0),
        point(2.0, 2.0),
        Geometry::LineString(LineString::from(vec![(3.0, 3.0), (4.0, 4.0)])),
    ]));

    let found = finder.search_all(&collection, None).await;
    assert_eq!(found.len(), 1);
    assert_eq!(finder.provider().official(), 4);
}

#[tokio::test]
async fn invalid_and_unsupported_geometries_are_skipped() {
    let provider = FakeProvider::new(|_, p, _| Ok(Some(pano("x", p))));
    let finder = permissive(Finder::lattice(provider, 50.0));

    assert!(finder.search_all(&point(123.0, 0.0), None).await.is_empty());
    let rect = Geometry::Rect(Rect::new((0.0, 0.0), (0.01, 0.01)));
    assert!(finder.search_all(&rect, Some("rect")).await.is_empty());
    assert_eq!(finder.provider().official(), 0);
}

#[tokio::test]
async fn search_stream_can_be_consumed_incrementally() {
    let provider = FakeProvider::new(|call, p, _| Ok(Some(pano(&format!("p{call}"), p))));
    let finder = permissive(Finder::lattice(provider, 50.0));
    let area = square(200.0);

    let first_two: Vec<_> = finder.search(&area, None).take(2).collect().await;
    assert_eq!(first_two.len(), 2);
    assert!(finder.provider().official() < 16);
}

#[tokio::test]
async fn tiles_keep_only_panoramas_inside_the_geometry() {
    let area = square(100.0);
    let centre = GeoPoint::new(deg(50.0), deg(50.0));
    let tile = panofind_finder::tile_at(centre, panofind_finder::COVERAGE_ZOOM);
    let inside = PanoramaRecord::basic("inside", centre, 0.0);
    let outside = PanoramaRecord::basic("outside", GeoPoint::new(deg(500.0), deg(500.0)), 0.0);
    let provider =
        FakeProvider::new(|_, _, _| Ok(None)).with_tile(tile.x, tile.y, vec![inside, outside]);
    let finder = Finder::vertices(provider).with_retry_policy(no_retries());

    let found: Vec<PanoramaRecord> = finder.panos_via_tiles(&area).collect().await;
    let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["inside"]);
    assert!(!found[0].has_extended_info);
    assert!(finder.provider().tile_calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn collect_locations_carries_attributes_and_faces_origin() {
    let provider = FakeProvider::new(|_, p, _| {
        // panorama sits 0.001° east of the point it was asked about
        Ok(Some(pano(
            &format!("{:.3}", p.lat),
            GeoPoint::new(p.lat, p.lng + 0.001),
        )))
    });
    let finder = permissive(Finder::vertices(provider));

    let mut extra = Extra::new();
    extra.insert("route".to_owned(), Scalar::from(7_i64));
    let sources = vec![
        LocationSource::new(point(0.0, 0.0), Some("stop A".to_owned()), extra).unwrap(),
        LocationSource::new(point(0.0, 0.0), Some("stop A again".to_owned()), Extra::new())
            .unwrap(),
    ];

    let coordinates = collect_locations(&finder, sources, None, false).await;
    // dedup is per source, so the same panorama appears once per source
    assert_eq!(coordinates.len(), 2);
    let first = &coordinates[0];
    assert_eq!(first.pano_id.as_deref(), Some("0.000"));
    assert_eq!(first.extra.get("route"), Some(&Scalar::Int(7)));
    let heading = first.heading.unwrap();
    assert!((heading - 270.0).abs() < 0.01, "should face west, got {heading}");

    let fixed = collect_locations(
        &finder,
        vec![LocationSource::new(point(0.0, 0.0), None, Extra::new()).unwrap()],
        Some(PanningMode::Fixed(12.5)),
        true,
    )
    .await;
    assert_eq!(fixed[0].heading, Some(12.5));
    assert_eq!((fixed[0].lat, fixed[0].lng), (0.0, 0.0));
}

#[test]
fn location_source_rejects_bad_coordinates() {
    let err = LocationSource::new(point(0.0, 200.0), Some("bad".to_owned()), Extra::new())
        .unwrap_err();
    assert!(matches!(err, FinderError::InvalidCoordinates { .. }));
}

#[test]
fn strategy_from_config_uses_search_radius() {
    let config = panofind_core::load_finder_config_from_env()
        .expect("test environment carries no invalid PANOFIND_* values");
    assert_eq!(
        SamplingStrategy::lattice_for(&config),
        SamplingStrategy::Lattice {
            spacing_m: f64::from(config.search_radius_m)
        }
    );
}

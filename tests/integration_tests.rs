use async_trait::async_trait;
use locmap::constants::{FILL_LAYER_ID, LINE_LAYER_ID, SOURCE_ID};
use locmap::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

const URL: &str = "http://localhost:8000/api/geodata";

/// One company site: a square around (5, 53)
fn acme_site() -> FeatureCollection {
    FeatureCollection::new(vec![Feature::new(Geometry::polygon(&[
        [4.0, 52.0],
        [4.0, 54.0],
        [6.0, 54.0],
        [6.0, 52.0],
        [4.0, 52.0],
    ]))
    .with_property("company_name", "Acme")
    .with_property("entity_type", "Factory")
    .with_property("address", "Netherlands")])
}

fn named(name: &str, lng: f64) -> FeatureCollection {
    FeatureCollection::new(vec![
        Feature::new(Geometry::point(lng, 40.0)).with_property("company_name", name)
    ])
}

fn static_fetcher(collection: &FeatureCollection) -> Arc<StaticFetcher> {
    Arc::new(StaticFetcher::new().with_collection(URL, collection).unwrap())
}

/// Serves a collection per url; urls with a gate wait for it to open
#[derive(Default)]
struct RoutedFetcher {
    routes: Mutex<HashMap<String, (Option<Arc<Notify>>, FeatureCollection)>>,
}

impl RoutedFetcher {
    fn route(self, url: &str, collection: FeatureCollection) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (None, collection));
        self
    }

    fn gated_route(self, url: &str, collection: FeatureCollection) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (Some(gate.clone()), collection));
        (self, gate)
    }
}

#[async_trait]
impl GeoFetcher for RoutedFetcher {
    async fn fetch(&self, url: &str) -> locmap::Result<FeatureCollection> {
        let route = self.routes.lock().unwrap().get(url).cloned();
        let Some((gate, collection)) = route else {
            return Err(MapError::HttpStatus {
                url: url.to_string(),
                status: 404,
            });
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(collection)
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.data.url = URL.to_string();
    config
}

#[tokio::test]
async fn test_company_site_end_to_end() {
    let factory = HeadlessFactory::new();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));

    app.mount().unwrap();
    app.settle().await.unwrap();

    let probe = factory.probe("map").unwrap();
    let markers = probe.markers();
    assert_eq!(markers.len(), 1);
    assert!(markers[0]
        .position()
        .approx_eq(&LatLng::from_lng_lat(5.0, 53.0), 1e-9));
    let popup = markers[0].popup().unwrap();
    assert!(popup.html.contains("Acme"));
    assert!(popup.html.contains("Factory"));

    assert_eq!(probe.source_ids(), vec![SOURCE_ID]);
    assert_eq!(probe.layer_ids(), vec![LINE_LAYER_ID, FILL_LAYER_ID]);

    let entries = app.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].country, "Netherlands");

    let data = app.data().unwrap();
    app.sidebar().select(&data.features[0]).unwrap();

    let target = probe.last_camera_command().unwrap();
    assert!(target.center.approx_eq(&LatLng::from_lng_lat(5.0, 53.0), 1e-9));
    assert_eq!(target.zoom, 15.0);
    assert_eq!(target.duration, Duration::from_millis(1500));

    let arrived = probe.camera_at(Instant::now() + Duration::from_secs(2));
    assert!(arrived.center.approx_eq(&target.center, 1e-9));
    assert_eq!(arrived.zoom, 15.0);
}

#[tokio::test]
async fn test_repeated_passes_add_nothing() {
    let factory = HeadlessFactory::new();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));
    app.mount().unwrap();
    app.settle().await.unwrap();

    for _ in 0..5 {
        assert!(app.pump().unwrap().is_empty());
    }

    let probe = factory.probe("map").unwrap();
    assert_eq!(probe.source_ids().len(), 1);
    assert_eq!(probe.layer_ids().len(), 2);
    assert_eq!(probe.marker_count(), 1);
}

#[tokio::test]
async fn test_at_most_one_engine_per_container() {
    let factory = HeadlessFactory::new();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));

    app.mount().unwrap();
    app.mount().unwrap();
    assert_eq!(factory.live_count("map"), 1);

    app.set_map_options(MapOptions::new("map").with_style("https://example.com/dark.json"))
        .unwrap();
    assert_eq!(factory.live_count("map"), 1);
    assert_eq!(factory.created_count(), 2);

    app.set_map_options(MapOptions::new("detail")).unwrap();
    assert_eq!(factory.live_count("map"), 0);
    assert_eq!(factory.live_count("detail"), 1);

    app.settle().await.unwrap();
    assert_eq!(factory.probe("detail").unwrap().marker_count(), 1);

    drop(app);
    assert_eq!(factory.live_count("detail"), 0);
}

#[tokio::test]
async fn test_second_owner_of_container_is_refused() {
    let factory = HeadlessFactory::new();
    let mut first = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));
    let mut second = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));

    first.mount().unwrap();
    assert!(matches!(second.mount(), Err(MapError::Configuration(_))));
    assert_eq!(second.state(), LifecycleState::Unmounted);
    assert_eq!(factory.live_count("map"), 1);
    assert_eq!(factory.created_count(), 1);

    // Moving onto a claimed container is refused the same way
    let mut detail_config = config();
    detail_config.map = MapOptions::new("detail");
    let mut detail = MapApp::new(detail_config, Arc::new(factory.clone()), static_fetcher(&acme_site()));
    detail.mount().unwrap();
    assert!(detail.set_map_options(MapOptions::new("map")).is_err());
    assert_eq!(detail.state(), LifecycleState::Unmounted);
    assert_eq!(factory.live_count("map"), 1);
    assert_eq!(factory.live_count("detail"), 0);

    drop(first);
    second.mount().unwrap();
    second.settle().await.unwrap();
    assert_eq!(factory.live_count("map"), 1);
    assert_eq!(factory.probe("map").unwrap().marker_count(), 1);
}

#[tokio::test]
async fn test_ready_is_reported_once() {
    let factory = HeadlessFactory::new().manual_load();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));
    let ready = Arc::new(AtomicUsize::new(0));
    let counter = ready.clone();
    app.on("ready", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    app.mount().unwrap();
    app.settle().await.unwrap();
    assert_eq!(app.state(), LifecycleState::Created);

    let probe = factory.probe("map").unwrap();
    probe.emit_load();
    app.pump().unwrap();
    assert_eq!(app.state(), LifecycleState::Ready);

    probe.emit_load();
    app.pump().unwrap();
    assert_eq!(app.state(), LifecycleState::Ready);
    assert_eq!(ready.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_layers_wait_for_load_by_default() {
    let factory = HeadlessFactory::new().manual_load();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));
    app.mount().unwrap();
    app.settle().await.unwrap();

    let probe = factory.probe("map").unwrap();
    assert!(app.data().is_some());
    assert!(probe.source_ids().is_empty());
    assert_eq!(probe.marker_count(), 0);

    probe.emit_load();
    let events = app.pump().unwrap();
    assert!(events.iter().any(|e| matches!(e, MapEvent::Ready { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, MapEvent::LayersSynced { source_added: true, layers_added: 2, .. })));
    assert_eq!(probe.source_ids(), vec![SOURCE_ID]);
}

#[tokio::test]
async fn test_created_gate_syncs_before_load() {
    let factory = HeadlessFactory::new().manual_load();
    let mut config = config();
    config.sync.gate = SyncGate::Created;
    let mut app = MapApp::new(config, Arc::new(factory.clone()), static_fetcher(&acme_site()));

    app.mount().unwrap();
    app.settle().await.unwrap();

    assert_eq!(app.state(), LifecycleState::Created);
    assert_eq!(factory.probe("map").unwrap().source_ids(), vec![SOURCE_ID]);
}

#[tokio::test]
async fn test_focus_without_map_is_noop() {
    let factory = HeadlessFactory::new().with_targets(["sidebar-only"]);
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));

    app.mount().unwrap();
    app.settle().await.unwrap();
    assert_eq!(app.state(), LifecycleState::Unmounted);

    let data = app.data().unwrap();
    assert!(app.sidebar().select(&data.features[0]).is_ok());
    assert_eq!(factory.created_count(), 0);
}

#[tokio::test]
async fn test_response_after_unmount_is_dropped() {
    let (fetcher, gate) = RoutedFetcher::default().gated_route(URL, acme_site());
    let factory = HeadlessFactory::new();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), Arc::new(fetcher));

    app.mount().unwrap();
    let probe = factory.probe("map").unwrap();
    app.unmount();

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let events = app.pump().unwrap();

    assert!(!events.iter().any(|e| matches!(e, MapEvent::DataLoaded { .. })));
    assert!(app.data().is_none());
    assert!(probe.is_removed());
    assert!(probe.source_ids().is_empty());
    assert_eq!(probe.marker_count(), 0);
}

#[tokio::test]
async fn test_latest_url_wins() {
    let (fetcher, slow_gate) = RoutedFetcher::default()
        .route("http://localhost/fast", named("Globex", 2.0))
        .gated_route("http://localhost/slow", named("Acme", 1.0));
    let factory = HeadlessFactory::new();
    let mut config = config();
    config.data.url = "http://localhost/slow".to_string();
    let mut app = MapApp::new(config, Arc::new(factory.clone()), Arc::new(fetcher));

    app.mount().unwrap();
    assert!(app.set_data_url("http://localhost/fast").unwrap());
    slow_gate.notify_one();
    let events = app.settle().await.unwrap();

    let loaded: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            MapEvent::DataLoaded { url, .. } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(loaded, vec!["http://localhost/fast"]);
    assert_eq!(app.entries()[0].name, "Globex");

    let markers = factory.probe("map").unwrap().markers();
    assert_eq!(markers.len(), 1);
    assert!(markers[0]
        .popup()
        .unwrap()
        .html
        .contains("Globex"));
}

#[tokio::test]
async fn test_refresh_replaces_source_data_and_markers() {
    let fetcher = Arc::new(RoutedFetcher::default().route(URL, named("Acme", 1.0)));
    let factory = HeadlessFactory::new();
    let mut app = MapApp::new(config(), Arc::new(factory.clone()), fetcher.clone());
    app.mount().unwrap();
    app.settle().await.unwrap();

    fetcher
        .routes
        .lock()
        .unwrap()
        .insert(URL.to_string(), (None, named("Initech", 3.0)));
    app.refresh().unwrap();
    let events = app.settle().await.unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        MapEvent::LayersSynced {
            markers_added: 1,
            markers_removed: 1,
            source_added: false,
            layers_added: 0,
            ..
        }
    )));
    let probe = factory.probe("map").unwrap();
    assert_eq!(probe.marker_count(), 1);
    assert_eq!(
        probe.source_data(SOURCE_ID).unwrap().features[0].company_name(),
        "Initech"
    );
    assert_eq!(probe.layer_ids().len(), 2);
}

#[tokio::test]
async fn test_context_after_app_dropped_is_usage_error() {
    let factory = HeadlessFactory::new();
    let sidebar = {
        let mut app = MapApp::new(config(), Arc::new(factory.clone()), static_fetcher(&acme_site()));
        app.mount().unwrap();
        app.sidebar()
    };

    let data = acme_site();
    assert!(matches!(
        sidebar.select(&data.features[0]),
        Err(MapError::Usage(_))
    ));
}

#[test]
fn test_config_file_overrides() {
    let config = AppConfig::from_json_str(
        r#"{
            "map": { "container": "locations", "zoom": 0 },
            "data": { "url": "https://example.com/sites.geojson" },
            "sync": { "gate": "created", "reconcile_markers": false }
        }"#,
    )
    .unwrap();

    assert_eq!(config.map.container, "locations");
    assert_eq!(config.map.resolve().zoom, 0.0);
    assert_eq!(config.data.url, "https://example.com/sites.geojson");
    assert_eq!(config.focus, FocusOptions::default());
    assert_eq!(config.sync.gate, SyncGate::Created);
    assert!(!config.sync.reconcile_markers);
}

// Map surface: the page that hosts the provider-rendered map and traffic layer.
//
// Rendering happens in the browser through the Maps JavaScript API. The server
// only decides between the real page (credential configured) and the loading
// placeholder, and hands the page its center, zoom and key.

use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("../static/traffic-watch.html");
const LOADING_HTML: &str = include_str!("../static/loading.html");
const BOOTSTRAP_MARKER: &str = "/*__TRAFFIC_WATCH_BOOTSTRAP__*/";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Harare CBD.
    pub const HARARE_CBD: LatLng = LatLng {
        lat: -17.8252,
        lng: 31.0335,
    };

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::HARARE_CBD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapLoad {
    Loading,
    Loaded,
}

/// What the browser needs to draw the map. Never carries the key.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub state: MapLoad,
}

#[derive(Debug, Serialize)]
struct Bootstrap<'a> {
    api_key: &'a str,
    center: LatLng,
    zoom: u8,
}

#[derive(Debug, Clone)]
pub struct MapSurface {
    api_key: Option<String>,
    center: LatLng,
    zoom: u8,
}

impl MapSurface {
    pub fn new(api_key: Option<String>, center: LatLng, zoom: u8) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        MapSurface {
            api_key,
            center,
            zoom,
        }
    }

    pub fn load_state(&self) -> MapLoad {
        if self.api_key.is_some() {
            MapLoad::Loaded
        } else {
            MapLoad::Loading
        }
    }

    pub fn view(&self) -> MapView {
        MapView {
            center: self.center,
            zoom: self.zoom,
            state: self.load_state(),
        }
    }

    /// Full HTML for `/`, or the placeholder when there is no credential.
    pub fn render_page(&self) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return LOADING_HTML.to_string();
        };

        let bootstrap = Bootstrap {
            api_key,
            center: self.center,
            zoom: self.zoom,
        };
        // serde_json only fails on non-string map keys
        let json = serde_json::to_string(&bootstrap)
            .unwrap_or_else(|_| "{}".to_string())
            .replace("</", "<\\/");

        INDEX_HTML.replace(
            BOOTSTRAP_MARKER,
            &format!("window.TRAFFIC_WATCH = {};", json),
        )
    }
}

use std::path::Path;

use itertools::Itertools;

use crate::error::{Error, ErrorKind, Result};
use crate::tree_record::TreeRecord;
use crate::util::{escape_html, format_decimal};

/// Url prefix under which stored media is served
pub const MEDIA_URL_PREFIX: &str = "/uploads";

pub const DEFAULT_CENTER: [f64; 2] = [19.7515, 75.7139];
pub const DEFAULT_ZOOM: u8 = 7;
pub const DEFAULT_TILE_URL: &str =
    "https://tiles.stadiamaps.com/tiles/stamen_terrain/{z}/{x}/{y}{r}.png";

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct BaseLayer {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

impl Default for BaseLayer {
    fn default() -> Self {
        BaseLayer {
            name: "Stamen.Terrain".to_owned(),
            url: DEFAULT_TILE_URL.to_owned(),
            attribution: "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors"
                .to_owned(),
        }
    }
}

/**
  Where a new map starts out and what it is drawn on top of
 */
#[derive(Clone, PartialEq, Debug)]
pub struct MapConfig {
    pub center: [f64; 2],
    pub zoom: u8,
    pub base_layer: BaseLayer,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            base_layer: BaseLayer::default(),
        }
    }
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Marker {
    pub tree_id: i32,
    /// `[latitude, longitude]`
    pub location: [f64; 2],
    /// HTML shown when the marker is clicked
    pub popup: String,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Map {
    pub center: [f64; 2],
    pub zoom: u8,
    pub base_layer: BaseLayer,
    pub markers: Vec<Marker>,
}

impl Map {
    pub fn new(config: &MapConfig) -> Map {
        Map {
            center: config.center,
            zoom: config.zoom,
            base_layer: config.base_layer.clone(),
            markers: vec![],
        }
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
}

/**
  A map together with the markers that could not be placed on it
 */
#[derive(Debug)]
pub struct RenderedMap {
    pub map: Map,
    pub errors: Vec<Error>,
}

impl RenderedMap {
    /**
      A single message describing everything that went wrong while the map
      was built, if anything did
     */
    pub fn error_notice(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }

        Some(map_error_notice(self.errors.iter().map(Error::user_message).join("; ")))
    }
}

pub fn map_error_notice(reason: String) -> String {
    format!("Error in loading map data: {}", reason)
}

/**
  Builds a map with one marker for every record that has a location, in the
  order of `records`. A record whose marker can not be built is skipped and its
  error is kept in the result, the rest of the map is unaffected.
 */
pub fn render(config: &MapConfig, records: &[TreeRecord]) -> RenderedMap {
    let mut map = Map::new(config);
    let mut errors = vec![];

    for record in records {
        let location = match record_location(record) {
            Some(location) => location,
            None => continue,
        };

        match marker_for(record, location) {
            Ok(marker) => map.add_marker(marker),
            Err(e) => errors.push(e),
        }
    }

    RenderedMap { map, errors }
}

/**
  The location of a record if it has one. Both coordinates must be present,
  and `(0.0, 0.0)` is what the form submits when the location is left alone so
  it counts as unset.
 */
pub fn record_location(record: &TreeRecord) -> Option<(f64, f64)> {
    match (record.latitude, record.longitude) {
        (Some(latitude), Some(longitude)) if latitude != 0.0 || longitude != 0.0 => {
            Some((latitude, longitude))
        }
        _ => None,
    }
}

pub fn marker_for(record: &TreeRecord, (latitude, longitude): (f64, f64)) -> Result<Marker> {
    if !latitude.is_finite() || !longitude.is_finite() {
        bail!(ErrorKind::MarkerFailed(
            record.id,
            format!("malformed coordinate ({}, {})", latitude, longitude)
        ));
    }

    Ok(Marker {
        tree_id: record.id,
        location: [latitude, longitude],
        popup: popup_message(record),
    })
}

pub fn popup_message(record: &TreeRecord) -> String {
    let mut lines = vec![
        format!("ID: {}", record.id),
        format!("Species: {}", escape_html(&record.species)),
        format!("Height: {} meters", format_decimal(record.height)),
        format!("Diameter: {} cm", format_decimal(record.diameter)),
        format!("Health Status: {}", record.health_status),
        format!("Date Planted: {}", record.date_planted),
        format!("Latitude: {}", optional_decimal(record.latitude)),
        format!("Longitude: {}", optional_decimal(record.longitude)),
    ];

    if let Some(ref path) = record.photo_path {
        lines.push(format!("Photo: {}", media_link(path)));
    }
    if let Some(ref path) = record.video_path {
        lines.push(format!("Video: {}", media_link(path)));
    }

    lines.join("<br>")
}

/**
  The url a stored media file is served from. Stored files always sit directly
  in the upload folder so the file name is enough.
 */
pub fn media_url(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("{}/{}", MEDIA_URL_PREFIX, name)
}

fn media_link(path: &str) -> String {
    format!("<a href='{}' target='_blank'>View</a>", escape_html(&media_url(path)))
}

fn optional_decimal(value: Option<f64>) -> String {
    value.map(format_decimal).unwrap_or_else(|| "None".to_owned())
}

use chrono::NaiveDate;
use itertools::Itertools;

use crate::error::Result;
use crate::form_controller::{PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::map_renderer::{media_url, Map};
use crate::tree_record::{HealthStatus, TreeRecord};
use crate::util::{escape_html, format_decimal};

pub const TITLE: &str = "🌳 INDICES GEOSPATIAL TREE CENSUS APP 🌳";
pub const MAP_HEADING: &str = "📍 Tree Locations on Map";
pub const NO_TREES_NOTICE: &str = "No trees found.";

const LEAFLET_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css";
const LEAFLET_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js";

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: String) -> Notice {
        Notice { kind: NoticeKind::Success, message }
    }

    pub fn error(message: String) -> Notice {
        Notice { kind: NoticeKind::Error, message }
    }
}

/**
  Everything shown on one render of the page
 */
pub struct Page<'a> {
    pub notices: Vec<Notice>,
    /// Rows for the records table, `None` when the table was not asked for
    pub records: Option<&'a [TreeRecord]>,
    pub map: &'a Map,
    /// Default for the date field
    pub today: NaiveDate,
}

pub fn render_page(page: &Page) -> Result<String> {
    let notices = page.notices.iter().map(render_notice).join("\n");
    let records = page.records.map(render_records_table).unwrap_or_default();

    Ok(format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Tree Census App</title>
  <link rel="stylesheet" href="{leaflet_css}" crossorigin="anonymous" />
  <script src="{leaflet_js}" crossorigin="anonymous"></script>
</head>
<body>
  <h1>{title}</h1>
{notices}
{form}
  <form action="/trees" method="get">
    <button type="submit">View Trees</button>
  </form>
{records}
  <h2>{map_heading}</h2>
{map}
</body>
</html>
"#,
        leaflet_css = LEAFLET_CSS,
        leaflet_js = LEAFLET_JS,
        title = TITLE,
        notices = notices,
        form = render_form(page.today),
        records = records,
        map_heading = MAP_HEADING,
        map = render_map(page.map)?,
    ))
}

fn render_notice(notice: &Notice) -> String {
    let class = match notice.kind {
        NoticeKind::Success => "notice success",
        NoticeKind::Error => "notice error",
    };

    format!("  <div class=\"{}\">{}</div>", class, escape_html(&notice.message))
}

fn render_form(today: NaiveDate) -> String {
    let status_options = HealthStatus::ALL.iter()
        .map(|status| format!("<option>{}</option>", status))
        .join("");

    format!(
        r#"  <form action="/trees" method="post" enctype="multipart/form-data">
    <label>Tree ID <input type="number" name="id" step="1" value="0" /></label>
    <label>Species <input type="text" name="species" /></label>
    <label>Height (in meters) <input type="number" name="height" step="0.1" value="0.0" /></label>
    <label>Diameter (in cm) <input type="number" name="diameter" step="0.1" value="0.0" /></label>
    <label>Health Status <select name="health_status">{status_options}</select></label>
    <label>Date Planted <input type="date" name="date_planted" value="{today}" /></label>
    <label>Latitude <input type="number" name="latitude" step="any" value="0.0" /></label>
    <label>Longitude <input type="number" name="longitude" step="any" value="0.0" /></label>
    <label>Upload Tree Photo <input type="file" name="photo" accept="{photo_accept}" /></label>
    <label>Upload Tree Video <input type="file" name="video" accept="{video_accept}" /></label>
    <button type="submit">Add Tree</button>
  </form>"#,
        status_options = status_options,
        today = today.format("%Y-%m-%d"),
        photo_accept = accept_hint(&PHOTO_EXTENSIONS),
        video_accept = accept_hint(&VIDEO_EXTENSIONS),
    )
}

fn accept_hint(extensions: &[&str]) -> String {
    extensions.iter().map(|extension| format!(".{}", extension)).join(",")
}

fn render_records_table(records: &[TreeRecord]) -> String {
    let header = [
        "id", "species", "height", "diameter", "health_status", "date_planted",
        "latitude", "longitude", "photo_path", "video_path",
    ].iter()
        .map(|name| format!("<th>{}</th>", name))
        .join("");

    let rows = records.iter()
        .map(|record| {
            let cells = vec![
                record.id.to_string(),
                escape_html(&record.species),
                format_decimal(record.height),
                format_decimal(record.diameter),
                record.health_status.to_string(),
                record.date_planted.to_string(),
                record.latitude.map(format_decimal).unwrap_or_default(),
                record.longitude.map(format_decimal).unwrap_or_default(),
                media_cell(&record.photo_path),
                media_cell(&record.video_path),
            ];

            format!(
                "      <tr>{}</tr>",
                cells.iter().map(|cell| format!("<td>{}</td>", cell)).join("")
            )
        })
        .join("\n");

    format!(
        "  <table>\n    <thead><tr>{}</tr></thead>\n    <tbody>\n{}\n    </tbody>\n  </table>",
        header,
        rows
    )
}

fn media_cell(path: &Option<String>) -> String {
    match *path {
        Some(ref path) => format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(&media_url(path)),
            escape_html(path)
        ),
        None => String::new(),
    }
}

/**
  The map container and the script that draws `map` into it with Leaflet
 */
fn render_map(map: &Map) -> Result<String> {
    Ok(format!(
        r#"  <div id="map" style="height: 700px;"></div>
  <script>
    var treeMap = {map_json};
    var map = L.map('map').setView(treeMap.center, treeMap.zoom);
    L.tileLayer(treeMap.base_layer.url, {{ attribution: treeMap.base_layer.attribution }}).addTo(map);
    treeMap.markers.forEach(function (marker) {{
      L.marker(marker.location).bindPopup(marker.popup).addTo(map);
    }});
  </script>"#,
        map_json = script_json(map)?,
    ))
}

/**
  Serializes `value` for embedding in a `<script>` element. `</` would end the
  element early so it is escaped, which JSON allows.
 */
fn script_json<T: ::serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

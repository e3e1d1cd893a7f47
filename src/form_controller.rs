use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{Error, ErrorKind, Result};
use crate::file_store::{FileStore, Upload};
use crate::record_store::RecordStore;
use crate::tree_record::{HealthStatus, TreeRecord};

/// Accept hints for the upload fields. Only the browser looks at them.
pub const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

/**
  The raw content of a submitted form, text fields and files by field name
 */
#[derive(Default, Debug)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl FormData {
    /// Returns the trimmed value of a field, `None` if it is missing or blank
    fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn parse_or<T: FromStr>(&self, name: &str, expected: &str, default: T) -> Result<T> {
        self.parse_optional(name, expected)
            .map(|value| value.unwrap_or(default))
    }

    fn parse_optional<T: FromStr>(&self, name: &str, expected: &str) -> Result<Option<T>> {
        match self.value(name) {
            Some(value) => value.parse::<T>()
                .map(Some)
                .map_err(|_| err_invalid_field(name, expected)),
            None => Ok(None),
        }
    }

    /// Like `parse_optional`, but `NaN` is not accepted as a number
    fn parse_number(&self, name: &str) -> Result<Option<f64>> {
        match self.parse_optional::<f64>(name, "a number")? {
            Some(value) if value.is_nan() => Err(err_invalid_field(name, "a number")),
            value => Ok(value),
        }
    }
}

/**
  Convenience function for creating `ErrorKind::InvalidField` errors
*/
pub fn err_invalid_field(name: &str, expected: &str) -> Error {
    ErrorKind::InvalidField(name.to_owned(), expected.to_owned()).into()
}

/**
  One filled in tree form
 */
#[derive(Clone, PartialEq, Debug)]
pub struct TreeForm {
    pub id: i32,
    pub species: String,
    pub height: f64,
    pub diameter: f64,
    pub health_status: HealthStatus,
    pub date_planted: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<Upload>,
    pub video: Option<Upload>,
}

impl TreeForm {
    /**
      Reads the form fields. Blank numbers fall back to zero, a blank date to
      `today` and a blank health status to the first status. Blank coordinates
      stay absent.
     */
    pub fn from_form_data(mut data: FormData, today: NaiveDate) -> Result<TreeForm> {
        let health_status = match data.value("health_status") {
            Some(value) => value.parse::<HealthStatus>()?,
            None => HealthStatus::default(),
        };

        let date_planted = match data.value("date_planted") {
            Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| err_invalid_field("date_planted", "a date (YYYY-MM-DD)"))?,
            None => today,
        };

        Ok(TreeForm {
            id: data.parse_or("id", "an integer", 0)?,
            species: data.value("species").unwrap_or("").to_owned(),
            height: data.parse_number("height")?.unwrap_or(0.0),
            diameter: data.parse_number("diameter")?.unwrap_or(0.0),
            health_status,
            date_planted,
            latitude: data.parse_number("latitude")?,
            longitude: data.parse_number("longitude")?,
            photo: data.files.remove("photo"),
            video: data.files.remove("video"),
        })
    }

    fn to_record(&self, photo_path: Option<String>, video_path: Option<String>) -> TreeRecord {
        TreeRecord {
            id: self.id,
            species: self.species.clone(),
            height: self.height,
            diameter: self.diameter,
            health_status: self.health_status,
            date_planted: self.date_planted,
            latitude: self.latitude,
            longitude: self.longitude,
            photo_path,
            video_path,
        }
    }
}

/**
  The outcome of a successful submission
 */
#[derive(Clone, PartialEq, Debug)]
pub struct Submission {
    pub record: TreeRecord,
}

impl Submission {
    pub fn notice(&self) -> String {
        format!(
            "Tree with ID {} added. Photo saved to {}, video saved to {}.",
            self.record.id,
            self.record.photo_path.as_ref().map(String::as_str).unwrap_or("none"),
            self.record.video_path.as_ref().map(String::as_str).unwrap_or("none"),
        )
    }
}

/**
  Stores the uploads of `form` and then appends the resulting record.

  Any failure stops the submission. Since the files are stored before the
  record is appended, a failed upload never leaves a record behind.
*/
pub fn submit(form: &TreeForm, files: &FileStore, store: &mut RecordStore) -> Result<Submission> {
    let photo_path = files.store(form.photo.as_ref())?;
    let video_path = files.store(form.video.as_ref())?;

    let record = form.to_record(photo_path, video_path);
    store.append(&record)?;

    info!("Added tree {} ({})", record.id, record.species);
    Ok(Submission { record })
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use crate::map_renderer::{render, MapConfig};
    use crate::record_store::store_test_helpers::{neem, new_store};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    fn form_data(fields: &[(&str, &str)]) -> FormData {
        FormData {
            fields: fields.iter()
                .map(|&(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
            files: HashMap::new(),
        }
    }

    fn neem_form() -> TreeForm {
        TreeForm {
            id: 1,
            species: "Neem".to_owned(),
            height: 3.5,
            diameter: 12.0,
            health_status: HealthStatus::Healthy,
            date_planted: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            latitude: Some(19.75),
            longitude: Some(75.71),
            photo: None,
            video: None,
        }
    }

    #[test]
    fn fields_are_parsed() {
        let data = form_data(&[
            ("id", "1"),
            ("species", "Neem"),
            ("height", "3.5"),
            ("diameter", "12.0"),
            ("health_status", "Healthy"),
            ("date_planted", "2023-05-01"),
            ("latitude", "19.75"),
            ("longitude", " 75.71 "),
        ]);

        assert_eq!(TreeForm::from_form_data(data, today()).unwrap(), neem_form());
    }

    #[test]
    fn blank_fields_use_defaults() {
        let data = form_data(&[("species", ""), ("latitude", ""), ("height", "  ")]);

        let form = TreeForm::from_form_data(data, today()).unwrap();

        assert_eq!(form, TreeForm {
            id: 0,
            species: "".to_owned(),
            height: 0.0,
            diameter: 0.0,
            health_status: HealthStatus::Healthy,
            date_planted: today(),
            latitude: None,
            longitude: None,
            photo: None,
            video: None,
        });
    }

    #[test]
    fn uploads_are_taken_from_files() {
        let mut data = form_data(&[("id", "4")]);
        data.files.insert("photo".to_owned(), Upload::new("a.jpg", vec![1]));
        data.files.insert("video".to_owned(), Upload::new("a.mp4", vec![2]));

        let form = TreeForm::from_form_data(data, today()).unwrap();

        assert_eq!(form.photo, Some(Upload::new("a.jpg", vec![1])));
        assert_eq!(form.video, Some(Upload::new("a.mp4", vec![2])));
    }

    #[test]
    fn malformed_fields_are_named() {
        let cases = vec![
            ("id", "1.5"),
            ("height", "tall"),
            ("latitude", "north"),
            ("date_planted", "yesterday"),
        ];

        for (name, value) in cases {
            let result = TreeForm::from_form_data(form_data(&[(name, value)]), today());

            assert_matches!(
                result,
                Err(Error(ErrorKind::InvalidField(ref field, _), _)) if field == name
            );
        }

        assert_matches!(
            TreeForm::from_form_data(form_data(&[("health_status", "Dead")]), today()),
            Err(Error(ErrorKind::UnknownHealthStatus(_), _))
        );
    }

    #[test]
    fn nan_is_not_a_number() {
        for name in &["height", "diameter", "latitude", "longitude"] {
            for value in &["NaN", "nan", "-NaN"] {
                let data = form_data(&[("id", "1"), (name, value)]);

                assert_matches!(
                    TreeForm::from_form_data(data, today()),
                    Err(Error(ErrorKind::InvalidField(ref field, _), _)) if field == name
                );
            }
        }
    }

    #[test]
    fn nan_height_leaves_the_table_readable() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path().join("uploads"));
        let mut store = new_store();

        let data = form_data(&[("id", "1"), ("height", "NaN")]);
        if let Ok(form) = TreeForm::from_form_data(data, today()) {
            let _ = submit(&form, &files, &mut store);
        }

        assert_eq!(store.count().unwrap(), 0);
        assert!(store.scan_all().unwrap().is_empty());
    }

    #[test]
    fn infinite_values_are_kept() {
        let data = form_data(&[("height", "inf"), ("latitude", "-inf")]);

        let form = TreeForm::from_form_data(data, today()).unwrap();

        assert_eq!(form.height, f64::INFINITY);
        assert_eq!(form.latitude, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn submission_without_media() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path().join("uploads"));
        let mut store = new_store();

        let submission = submit(&neem_form(), &files, &mut store).unwrap();

        assert_eq!(submission.record, neem());
        assert_eq!(store.scan_all().unwrap(), vec![neem()]);
        assert_eq!(
            submission.notice(),
            "Tree with ID 1 added. Photo saved to none, video saved to none."
        );

        let rendered = render(&MapConfig::default(), &store.scan_all().unwrap());
        assert_eq!(rendered.map.markers.len(), 1);
        assert_eq!(rendered.map.markers[0].location, [19.75, 75.71]);
        assert!(!rendered.map.markers[0].popup.contains("Photo:"));
        assert!(!rendered.map.markers[0].popup.contains("Video:"));
    }

    #[test]
    fn submission_without_location_is_stored_but_not_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path().join("uploads"));
        let mut store = new_store();

        let unset = TreeForm { latitude: Some(0.0), longitude: Some(0.0), ..neem_form() };
        let blank = TreeForm { id: 2, latitude: None, longitude: None, ..neem_form() };
        submit(&unset, &files, &mut store).unwrap();
        submit(&blank, &files, &mut store).unwrap();

        let records = store.scan_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(render(&MapConfig::default(), &records).map.markers.is_empty());
    }

    #[test]
    fn media_paths_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("uploads");
        let files = FileStore::new(folder.clone());
        let mut store = new_store();

        let form = TreeForm {
            photo: Some(Upload::new("neem.jpg", vec![1, 2])),
            video: Some(Upload::new("neem.mp4", vec![3])),
            ..neem_form()
        };
        let submission = submit(&form, &files, &mut store).unwrap();

        let photo_path = folder.join("neem.jpg").to_string_lossy().into_owned();
        let video_path = folder.join("neem.mp4").to_string_lossy().into_owned();
        assert_eq!(submission.record.photo_path, Some(photo_path.clone()));
        assert_eq!(submission.record.video_path, Some(video_path.clone()));
        assert_eq!(
            submission.notice(),
            format!(
                "Tree with ID 1 added. Photo saved to {}, video saved to {}.",
                photo_path, video_path
            )
        );
        assert_eq!(store.scan_all().unwrap(), vec![submission.record]);
    }

    #[test]
    fn same_name_uploads_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path().join("uploads"));
        let mut store = new_store();

        let first = TreeForm { photo: Some(Upload::new("tree.jpg", b"first".to_vec())), ..neem_form() };
        let second = TreeForm {
            id: 2,
            photo: Some(Upload::new("tree.jpg", b"second".to_vec())),
            ..neem_form()
        };
        submit(&first, &files, &mut store).unwrap();
        submit(&second, &files, &mut store).unwrap();

        let records = store.scan_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].photo_path, records[1].photo_path);

        let path = records[0].photo_path.clone().unwrap();
        assert_eq!(fs::read(path).unwrap(), b"second".to_vec());
    }

    #[test]
    fn failed_upload_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("uploads");
        fs::write(&blocker, b"not a folder").unwrap();
        let files = FileStore::new(blocker);
        let mut store = new_store();

        let form = TreeForm { video: Some(Upload::new("neem.mp4", vec![1])), ..neem_form() };
        let result = submit(&form, &files, &mut store);

        assert_matches!(result, Err(Error(ErrorKind::UploadFailed(_), _)));
        assert_eq!(store.count().unwrap(), 0);
    }
}

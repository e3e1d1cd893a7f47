use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use diesel::prelude::*;

use crate::error::{Error, ErrorKind, Result};
use crate::schema::trees;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum HealthStatus {
    Healthy,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Unhealthy,
}

impl HealthStatus {
    /// Every status in the order the form offers them
    pub const ALL: [HealthStatus; 3] = [
        HealthStatus::Healthy,
        HealthStatus::NeedsAttention,
        HealthStatus::Unhealthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::NeedsAttention => "Needs Attention",
            HealthStatus::Unhealthy => "Unhealthy",
        }
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        HealthStatus::Healthy
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<HealthStatus> {
        HealthStatus::ALL
            .iter()
            .find(|status| status.as_str() == value)
            .cloned()
            .ok_or_else(|| ErrorKind::UnknownHealthStatus(value.to_owned()).into())
    }
}

/**
  One tree census entry.

  Nothing beyond the column types is enforced: ids may repeat, the species may
  be empty and coordinates are not range checked.
*/
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct TreeRecord {
    pub id: i32,
    pub species: String,
    /// Meters
    pub height: f64,
    /// Centimeters
    pub diameter: f64,
    pub health_status: HealthStatus,
    pub date_planted: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_path: Option<String>,
    pub video_path: Option<String>,
}

impl TreeRecord {
    /// The measurements and whichever coordinates are present
    pub fn numbers(&self) -> impl Iterator<Item = f64> {
        vec![Some(self.height), Some(self.diameter), self.latitude, self.longitude]
            .into_iter()
            .flatten()
    }
}

#[derive(Insertable)]
#[diesel(table_name = trees)]
pub struct NewTree<'a> {
    id: i32,
    species: &'a str,
    height: f64,
    diameter: f64,
    health_status: &'a str,
    date_planted: NaiveDate,
    latitude: Option<f64>,
    longitude: Option<f64>,
    photo_path: Option<&'a str>,
    video_path: Option<&'a str>,
}

impl<'a> NewTree<'a> {
    pub fn from_record(record: &'a TreeRecord) -> NewTree<'a> {
        NewTree {
            id: record.id,
            species: &record.species,
            height: record.height,
            diameter: record.diameter,
            health_status: record.health_status.as_str(),
            date_planted: record.date_planted,
            latitude: record.latitude,
            longitude: record.longitude,
            photo_path: record.photo_path.as_ref().map(String::as_str),
            video_path: record.video_path.as_ref().map(String::as_str),
        }
    }
}

/**
  A row as it is read back from the `trees` table
 */
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = trees)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TreeRow {
    id: i32,
    species: String,
    height: f64,
    diameter: f64,
    health_status: String,
    date_planted: NaiveDate,
    latitude: Option<f64>,
    longitude: Option<f64>,
    photo_path: Option<String>,
    video_path: Option<String>,
}

impl TryFrom<TreeRow> for TreeRecord {
    type Error = Error;

    fn try_from(row: TreeRow) -> Result<TreeRecord> {
        Ok(TreeRecord {
            id: row.id,
            species: row.species,
            height: row.height,
            diameter: row.diameter,
            health_status: row.health_status.parse()?,
            date_planted: row.date_planted,
            latitude: row.latitude,
            longitude: row.longitude,
            photo_path: row.photo_path,
            video_path: row.video_path,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn health_status_names() {
        for status in HealthStatus::ALL.iter() {
            assert_eq!(status.as_str().parse::<HealthStatus>().unwrap(), *status);
        }

        assert_eq!(HealthStatus::NeedsAttention.to_string(), "Needs Attention");
        assert_matches!(
            "Dead".parse::<HealthStatus>(),
            Err(Error(ErrorKind::UnknownHealthStatus(ref value), _)) if value == "Dead"
        );
    }

    #[test]
    fn health_status_serializes_as_display_name() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::NeedsAttention).unwrap(),
            "\"Needs Attention\""
        );
    }

    #[test]
    fn rows_with_unknown_status_are_rejected() {
        let row = TreeRow {
            id: 3,
            species: "Teak".to_owned(),
            height: 1.0,
            diameter: 2.0,
            health_status: "Sleeping".to_owned(),
            date_planted: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            latitude: None,
            longitude: None,
            photo_path: None,
            video_path: None,
        };

        assert_matches!(TreeRecord::try_from(row), Err(Error(ErrorKind::UnknownHealthStatus(_), _)));
    }
}

use std::convert::TryFrom;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use iron::typemap::Key;

use crate::error::{ErrorKind, Result, ResultExt};
use crate::schema::trees;
use crate::tree_record::{NewTree, TreeRecord, TreeRow};

const CREATE_TREES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS trees (
        id INTEGER,
        species VARCHAR,
        height DOUBLE,
        diameter DOUBLE,
        health_status VARCHAR,
        date_planted DATE,
        latitude DOUBLE,
        longitude DOUBLE,
        photo_path VARCHAR,
        video_path VARCHAR
    )
";

/**
  The tree table of one session. It lives in an in-memory SQLite database
  which disappears together with the store.
 */
pub struct RecordStore {
    connection: SqliteConnection,
}
impl Key for RecordStore {
    type Value = RecordStore;
}

impl RecordStore {
    pub fn in_memory() -> Result<RecordStore> {
        let mut connection = SqliteConnection::establish(":memory:")?;

        diesel::sql_query(CREATE_TREES_TABLE).execute(&mut connection)?;

        Ok(RecordStore { connection })
    }

    /**
      Adds a row for `record` after all existing rows. Duplicate ids and out of
      range coordinates are accepted. `NaN` is refused since SQLite would store
      it as NULL.
     */
    pub fn append(&mut self, record: &TreeRecord) -> Result<()> {
        if record.numbers().any(f64::is_nan) {
            bail!(ErrorKind::RecordAppendFailed(record.id));
        }

        diesel::insert_into(trees::table)
            .values(&NewTree::from_record(record))
            .execute(&mut self.connection)
            .chain_err(|| ErrorKind::RecordAppendFailed(record.id))?;

        Ok(())
    }

    /**
      Returns every stored record in insertion order
     */
    pub fn scan_all(&mut self) -> Result<Vec<TreeRecord>> {
        let rows = trees::table
            .order(trees::rowid.asc())
            .select(TreeRow::as_select())
            .load::<TreeRow>(&mut self.connection)
            .chain_err(|| ErrorKind::RecordScanFailed)?;

        rows.into_iter()
            .map(TreeRecord::try_from)
            .collect::<Result<Vec<_>>>()
            .chain_err(|| ErrorKind::RecordScanFailed)
    }

    pub fn count(&mut self) -> Result<i64> {
        Ok(trees::table.count().get_result::<i64>(&mut self.connection)?)
    }
}

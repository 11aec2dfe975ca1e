use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;



/// Timestamps are stored as milliseconds since the unix epoch.
pub fn to_millis( instant: &DateTime<Utc> ) -> i64 {
	instant.timestamp_millis()
}

/// Reads a millisecond timestamp from column `index` of `row`.
pub fn timestamp( row: &Row<'_>, index: usize ) -> rusqlite::Result<DateTime<Utc>> {
	let millis: i64 = row.get( index )?;

	DateTime::from_timestamp_millis( millis )
		.ok_or( rusqlite::Error::IntegralValueOutOfRange( index, millis ) )
}

pub fn new_id() -> String {
	Uuid::new_v4().to_string()
}

//! The grow timeline: mapping the posts of a report onto calendar days.
//!
//! Everything in here is a pure function of a report snapshot and the local timezone.
//! Calendar days are always derived in the timezone that is passed in, never in the
//! timezone of the machine the server happens to run on.

use std::collections::BTreeSet;

use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};

use crate::model::{Post, Report};

pub mod calendar;
pub mod columns;
pub mod selection;



pub const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;



/// The days of a report on which something was posted.
#[derive(Clone, Debug, Default)]
pub struct DateIndex {
	timestamps: BTreeSet<i64>,
	days: BTreeSet<NaiveDate>
}

/// The inclusive range of dates that can be navigated to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineBounds {
	pub germination: DateTime<Utc>,
	/// The date of the newest post, or the unix epoch if the report has no posts.
	/// Use `upper_bound` to tell those apart.
	pub newest_post: DateTime<Utc>,
	has_posts: bool
}



impl DateIndex {

	pub fn build<Tz: TimeZone>( posts: &[Post], tz: &Tz ) -> Self {
		let mut index = Self::default();

		for post in posts {
			index.timestamps.insert( post.date.timestamp_millis() );
			index.days.insert( calendar_day( &post.date, tz ) );
		}

		index
	}

	/// The exact post timestamps in milliseconds.
	pub fn timestamps( &self ) -> &BTreeSet<i64> {
		&self.timestamps
	}

	pub fn days( &self ) -> &BTreeSet<NaiveDate> {
		&self.days
	}

	pub fn has_post_on( &self, day: NaiveDate ) -> bool {
		self.days.contains( &day )
	}

	pub fn is_empty( &self ) -> bool {
		self.timestamps.is_empty()
	}
}

impl TimelineBounds {

	pub fn compute( report: &Report ) -> Self {
		let newest = report.posts.iter().map(|p| p.date).max();

		Self {
			germination: report.created_at,
			newest_post: newest.unwrap_or_default(),
			has_posts: newest.is_some()
		}
	}

	/// The newest post date, or `None` when there is nothing to bound the timeline by.
	pub fn upper_bound( &self ) -> Option<DateTime<Utc>> {
		if self.has_posts { Some( self.newest_post ) } else { None }
	}

	pub fn first_day<Tz: TimeZone>( &self, tz: &Tz ) -> NaiveDate {
		calendar_day( &self.germination, tz )
	}

	pub fn last_day<Tz: TimeZone>( &self, tz: &Tz ) -> Option<NaiveDate> {
		self.upper_bound().map(|d| calendar_day( &d, tz ))
	}

	/// Whether `day` may be selected.
	pub fn contains<Tz: TimeZone>( &self, day: NaiveDate, tz: &Tz ) -> bool {
		if day < self.first_day( tz ) {
			return false;
		}
		match self.last_day( tz ) {
			None => true,
			Some(last) => day <= last
		}
	}
}



/// The calendar day that `instant` falls on in `tz`.
pub fn calendar_day<Tz: TimeZone>( instant: &DateTime<Utc>, tz: &Tz ) -> NaiveDate {
	instant.with_timezone( tz ).date_naive()
}

/// The instant at which `day` starts in `tz`.
///
/// If midnight does not exist on that day (a transition skips it), the day is taken to
/// start at midnight UTC.
pub fn local_midnight<Tz: TimeZone>( day: NaiveDate, tz: &Tz ) -> DateTime<Utc> {
	let naive = day.and_time( chrono::NaiveTime::MIN );

	match tz.from_local_datetime( &naive ) {
		LocalResult::Single(dt) => dt.with_timezone( &Utc ),
		LocalResult::Ambiguous(earliest, _) => earliest.with_timezone( &Utc ),
		LocalResult::None => Utc.from_utc_datetime( &naive )
	}
}

/// Finds the post that was made on the given calendar day.
///
/// Both sides are compared as local calendar days, so the time of day of a post never
/// matters. If several posts share a day, the first one in `posts` wins.
pub fn find_post_on_day<'a, Tz: TimeZone>( posts: &'a [Post], day: NaiveDate, tz: &Tz ) -> Option<&'a Post> {
	posts.iter().find(|post| calendar_day( &post.date, tz ) == day)
}

/// The number of whole days between germination and `date`, both taken at local midnight.
///
/// This is not clamped: a post dated before germination yields a negative number.
pub fn growth_day<Tz: TimeZone>( date: &DateTime<Utc>, germination: &DateTime<Utc>, tz: &Tz ) -> i64 {
	let post_midnight = local_midnight( calendar_day( date, tz ), tz );
	let germination_midnight = local_midnight( calendar_day( germination, tz ), tz );

	let difference = post_midnight.timestamp_millis() - germination_midnight.timestamp_millis();
	difference.div_euclid( MILLIS_PER_DAY )
}

/// The date the report was last updated at: its newest post, or its germination if there are none.
pub fn last_activity( report: &Report ) -> DateTime<Utc> {
	TimelineBounds::compute( report ).upper_bound()
		.map_or( report.created_at, |newest| newest.max( report.created_at ) )
}

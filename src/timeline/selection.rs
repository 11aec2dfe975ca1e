//! Picking a day on the date picker of a report.
//!
//! A pick either lands on a post, which then becomes the displayed post and the target of a
//! shallow navigation, or it lands on a day without a post, in which case the user is told
//! so and nothing else changes.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::model::{Post, Report};
use crate::timeline::{find_post_on_day, growth_day};



/// What is currently selected on a report page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
	pub date: Option<DateTime<Utc>>,
	pub post_id: Option<String>
}

/// A request to change the location without reloading the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Navigation {
	pub path: String,
	pub shallow: bool,
	pub scroll: bool
}

/// A message for the user that does not interrupt anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
	pub title: &'static str,
	pub message: &'static str,
	pub color: &'static str
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
	/// Nothing was picked.
	Ignored,
	Matched {
		post: &'a Post,
		growth_day: i64,
		navigation: Navigation
	},
	NoPost( Notice )
}



impl Selection {

	/// The selection of a page that displays `post`.
	pub fn showing( post: &Post ) -> Self {
		Self {
			date: Some( post.date ),
			post_id: Some( post.id.clone() )
		}
	}

	/// Handles the user picking `day` (or clearing the picker) on the page of `report`.
	pub fn pick<'a, Tz: TimeZone>( &mut self, report: &'a Report, day: Option<NaiveDate>, tz: &Tz ) -> Outcome<'a> {
		let day = match day {
			None => return Outcome::Ignored,
			Some(d) => d
		};

		match find_post_on_day( &report.posts, day, tz ) {
			None => {
				tracing::debug!(report = %report.id, %day, "no post on picked day");
				Outcome::NoPost( Notice::NO_POST_AT_THIS_DAY )
			},
			Some(post) => {
				self.date = Some( post.date );
				self.post_id = Some( post.id.clone() );

				Outcome::Matched {
					post,
					growth_day: growth_day( &post.date, &report.created_at, tz ),
					navigation: Navigation::shallow( post_path( &report.id, &post.id ) )
				}
			}
		}
	}
}

impl Navigation {
	pub fn shallow( path: String ) -> Self {
		Self { path, shallow: true, scroll: false }
	}
}

impl Notice {
	pub const NO_POST_AT_THIS_DAY: Self = Self {
		title: "Error",
		message: "Sorry... no update for this day!",
		color: "red"
	};
}

impl<'a> Outcome<'a> {
	pub fn notice( &self ) -> Option<&Notice> {
		match self {
			Self::NoPost(notice) => Some(notice),
			_ => None
		}
	}
}



pub fn report_path( report_id: &str ) -> String {
	format!("/grow/{}", report_id)
}

pub fn post_path( report_id: &str, post_id: &str ) -> String {
	format!("/grow/{}/update/{}", report_id, post_id)
}

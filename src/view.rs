//! Report snapshots prepared for display: growth days computed, images in display order
//! and dates reduced to the calendar days of the configured timezone.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::{
	model::*,
	timeline::{self, selection::{post_path, report_path}}
};



#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
	pub id: String,
	pub path: String,
	pub title: String,
	/// Rich text, cleaned of anything but harmless markup.
	pub content: String,
	pub date: DateTime<Utc>,
	pub day: NaiveDate,
	pub grow_day: i64,
	pub stage: &'static str,
	pub light_watts: Option<i64>,
	pub author: Author,
	pub images: Vec<Image>,
	pub comments: Vec<Comment>,
	pub like_count: usize
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
	pub id: String,
	pub path: String,
	pub title: String,
	pub description: String,
	pub author: Author,
	pub environment: &'static str,
	pub image: Option<Image>,
	pub created_at: DateTime<Utc>,
	pub germination_day: NaiveDate,
	pub last_activity: DateTime<Utc>,
	pub last_activity_day: NaiveDate,
	pub strains: Vec<Strain>,
	pub like_count: usize,
	pub posts: Vec<PostView>
}



impl PostView {

	pub fn build<Tz: TimeZone>( report: &Report, post: &Post, tz: &Tz ) -> Self {
		let grow_day = timeline::growth_day( &post.date, &report.created_at, tz );
		if grow_day < 0 {
			tracing::warn!(report = %report.id, post = %post.id, grow_day, "post is dated before germination");
		}

		let mut images = post.images.clone();
		images.sort_by_key( Image::display_order );

		Self {
			id: post.id.clone(),
			path: post_path( &report.id, &post.id ),
			title: post.title.clone(),
			content: ammonia::clean( &post.content ),
			date: post.date,
			day: timeline::calendar_day( &post.date, tz ),
			grow_day,
			stage: post.stage.label(),
			light_watts: post.light_watts,
			author: post.author.clone(),
			images,
			comments: post.comments.clone(),
			like_count: post.likes.len()
		}
	}
}

impl ReportView {

	pub fn build<Tz: TimeZone>( report: &Report, tz: &Tz ) -> Self {
		let last_activity = timeline::last_activity( report );

		Self {
			id: report.id.clone(),
			path: report_path( &report.id ),
			title: report.title.clone(),
			description: report.description.clone(),
			author: report.author.clone(),
			environment: report.environment.label(),
			image: report.image.clone(),
			created_at: report.created_at,
			germination_day: timeline::calendar_day( &report.created_at, tz ),
			last_activity,
			last_activity_day: timeline::calendar_day( &last_activity, tz ),
			strains: report.strains.clone(),
			like_count: report.likes.len(),
			posts: report.posts.iter().map(|p| PostView::build( report, p, tz )).collect()
		}
	}

	pub fn post( &self, post_id: &str ) -> Option<&PostView> {
		self.posts.iter().find(|p| p.id == post_id)
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	use crate::timeline::tests::*;

	#[test]
	fn views_carry_growth_days() {
		let view = ReportView::build( &january_report(), &Utc );

		let days: Vec<(&str, i64)> = view.posts.iter().map(|p| (p.id.as_str(), p.grow_day)).collect();
		assert_eq!( days, vec![("p1", 0), ("p2", 14)] );
		assert_eq!( view.last_activity_day, day(2024, 1, 15) );
		assert_eq!( view.post("p2").map(|p| p.path.as_str()), Some("/grow/r1/update/p2") );
	}

	#[test]
	fn content_keeps_markup_but_loses_scripts() {
		let mut report = january_report();
		report.posts[0].content = "<p>first <b>leaves</b></p><script>alert(1)</script><img src=x onerror=alert(2)>".into();

		let view = ReportView::build( &report, &Utc );
		let content = &view.posts[0].content;
		assert!( content.starts_with("<p>first <b>leaves</b></p>") );
		assert!( !content.contains("script") );
		assert!( !content.contains("onerror") );
	}

	#[test]
	fn images_are_put_in_display_order() {
		let mut report = january_report();
		report.posts[0].images = ["b", "a", "c"].iter().zip([Some(3), None, Some(1)].iter())
			.map(|(id, order)| Image {
				id: id.to_string(),
				cloud_url: format!("https://img.example/{}.jpg", id),
				public_id: id.to_string(),
				post_order: *order
			})
			.collect();

		let view = ReportView::build( &report, &Utc );
		let order: Vec<&str> = view.posts[0].images.iter().map(|i| i.id.as_str()).collect();
		assert_eq!( order, vec!["a", "c", "b"] );
	}
}

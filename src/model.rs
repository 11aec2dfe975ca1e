//! The snapshot types that the data-access layer hands out.
//!
//! All of them serialize with camelCase field names, which is also the shape of the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};



#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Author {
	pub id: String,
	pub name: String,
	pub image: Option<String>
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
	pub id: String,
	pub cloud_url: String,
	/// The identifier the image host knows this image by.
	pub public_id: String,
	pub post_order: Option<i64>
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	pub id: String,
	pub post_id: String,
	pub author: Author,
	pub content: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
	pub id: String,
	pub user_id: String,
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Strain {
	pub id: String,
	pub name: String,
	pub description: String,
	pub effects: String,
	pub flavors: String,
	#[serde(rename = "type")]
	pub strain_type: String
}

crate::int_enum! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
	pub enum Environment {
		Indoor = 0,
		Outdoor = 1
	}
}

crate::int_enum! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
	pub enum GrowStage {
		Preparation = 0,
		Germination = 1,
		Seedling = 2,
		Vegetative = 3,
		Flowering = 4,
		Harvest = 5,
		Curing = 6
	}
}

/// A single dated update of a report.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	pub id: String,
	pub report_id: String,
	pub author: Author,
	/// Only the calendar day of this timestamp is meaningful.
	pub date: DateTime<Utc>,
	pub title: String,
	pub content: String,
	pub stage: GrowStage,
	pub light_watts: Option<i64>,
	pub images: Vec<Image>,
	pub comments: Vec<Comment>,
	pub likes: Vec<Like>
}

/// A grow report together with its whole timeline.
///
/// `created_at` is the germination date: no post of the report may be dated before it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
	pub id: String,
	pub title: String,
	pub description: String,
	pub author: Author,
	pub environment: Environment,
	pub image: Option<Image>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Ordered by date, oldest first.
	pub posts: Vec<Post>,
	pub strains: Vec<Strain>,
	pub likes: Vec<Like>
}

/// What report listings show, without the timeline.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
	pub id: String,
	pub title: String,
	pub description: String,
	pub author: Author,
	pub image: Option<Image>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>
}



impl Image {
	/// The position of the image within its post. Images without one sort as 0.
	pub fn display_order( &self ) -> i64 {
		self.post_order.unwrap_or(0)
	}
}

impl Environment {
	pub fn label( self ) -> &'static str {
		match self {
			Self::Indoor => "Indoor",
			Self::Outdoor => "Outdoor"
		}
	}
}

impl Default for Environment {
	fn default() -> Self { Self::Indoor }
}

impl GrowStage {
	pub fn label( self ) -> &'static str {
		match self {
			Self::Preparation => "Preparation",
			Self::Germination => "Germination",
			Self::Seedling => "Seedling",
			Self::Vegetative => "Vegetative",
			Self::Flowering => "Flowering",
			Self::Harvest => "Harvest",
			Self::Curing => "Curing"
		}
	}
}

impl Default for GrowStage {
	fn default() -> Self { Self::Germination }
}

impl Report {
	pub fn find_post( &self, post_id: &str ) -> Option<&Post> {
		self.posts.iter().find(|p| p.id == post_id)
	}
}

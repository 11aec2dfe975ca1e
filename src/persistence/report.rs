//! Reports and their timelines.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Deserialize;

use crate::{
	common::*,
	model::*,
	persistence::{
		self,
		post::{self, NewImage, NewPost},
		Connection,
		Error,
		LikeTarget,
		Result
	},
	timeline
};



const SUMMARY_SELECT: &str = "SELECT r.id, r.title, r.description, u.id, u.name, u.image,
		i.id, i.cloud_url, i.public_id, i.post_order, r.created_at, r.updated_at, r.environment
	FROM reports r
	JOIN users u ON u.id = r.author_id
	LEFT JOIN images i ON i.id = r.image_id";



#[derive(Clone)]
pub struct Handle {
	pub base: persistence::Handle,
	pub id: String
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub environment: Environment,
	pub image: Option<NewImage>,
	/// The germination date. Defaults to now.
	pub created_at: Option<DateTime<Utc>>
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportChanges {
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub environment: Environment
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportOrder {
	CreatedAt,
	UpdatedAt,
	Title
}



impl Default for ReportOrder {
	fn default() -> Self { Self::CreatedAt }
}

impl ReportOrder {
	fn sql( self, desc: bool ) -> &'static str {
		match (self, desc) {
			(Self::CreatedAt, false) => "ORDER BY r.created_at ASC",
			(Self::CreatedAt, true) => "ORDER BY r.created_at DESC",
			(Self::UpdatedAt, false) => "ORDER BY r.updated_at ASC",
			(Self::UpdatedAt, true) => "ORDER BY r.updated_at DESC",
			(Self::Title, false) => "ORDER BY r.title ASC",
			(Self::Title, true) => "ORDER BY r.title DESC"
		}
	}
}

fn summary_from_row( row: &Row<'_> ) -> rusqlite::Result<(ReportSummary, Environment)> {
	let image_id: Option<String> = row.get(6)?;
	let image = match image_id {
		None => None,
		Some(id) => Some( Image {
			id,
			cloud_url: row.get(7)?,
			public_id: row.get(8)?,
			post_order: row.get(9)?
		})
	};

	let summary = ReportSummary {
		id: row.get(0)?,
		title: row.get(1)?,
		description: row.get(2)?,
		author: Author {
			id: row.get(3)?,
			name: row.get(4)?,
			image: row.get(5)?
		},
		image,
		created_at: timestamp( row, 10 )?,
		updated_at: timestamp( row, 11 )?
	};
	Ok(( summary, row.get(12)? ))
}

pub(crate) fn insert_image( con: &rusqlite::Connection, image: &NewImage, post_id: Option<&str> ) -> rusqlite::Result<Image> {
	let id = new_id();
	con.execute("INSERT INTO images (id, public_id, cloud_url, post_id, post_order) VALUES (?,?,?,?,?)",
		params![id, image.public_id, image.cloud_url, post_id, image.post_order]
	)?;

	Ok( Image {
		id,
		cloud_url: image.cloud_url.clone(),
		public_id: image.public_id.clone(),
		post_order: image.post_order
	})
}



impl persistence::Handle {

	/// All reports, newest first.
	pub async fn list_reports( &self ) -> Result<Vec<ReportSummary>> {
		let sql = format!("{} {}", SUMMARY_SELECT, ReportOrder::CreatedAt.sql( true ));

		Ok( self.with(|con| con.query_all( &sql, params![], |row| Ok( summary_from_row( row )?.0 ) )).await? )
	}

	/// The reports written by `author_id`.
	pub async fn list_own_reports( &self, author_id: &str, order: ReportOrder, desc: bool ) -> Result<Vec<ReportSummary>> {
		let sql = format!("{} WHERE r.author_id = ? {}", SUMMARY_SELECT, order.sql( desc ));

		Ok( self.with(|con| con.query_all( &sql, params![author_id], |row| Ok( summary_from_row( row )?.0 ) )).await? )
	}

	pub async fn create_report( &self, author: &Author, report: NewReport ) -> Result<Handle> {
		if report.title.trim().is_empty() {
			return Err( Error::Invalid( "a report needs a title".into() ) );
		}
		self.ensure_user( author ).await?;

		let id = new_id();
		let now = Utc::now();
		let created_at = report.created_at.unwrap_or( now );

		self.with(|con| {
			let tx = con.transaction()?;
			let image_id = match &report.image {
				None => None,
				Some(image) => Some( insert_image( &tx, image, None )?.id )
			};
			tx.execute("INSERT INTO reports (id, title, description, author_id, image_id, environment, created_at, updated_at) VALUES (?,?,?,?,?,?,?,?)",
				params![id, report.title, report.description, author.id, image_id, report.environment, to_millis( &created_at ), to_millis( &now )]
			)?;
			tx.commit()
		}).await?;

		tracing::info!(report = %id, author = %author.id, "report created");
		Ok( self.report( id ) )
	}

	/// Updates the report with the given id if `author` wrote it, or creates it if it does not exist.
	pub async fn save_own_report( &self, author: &Author, id: &str, changes: ReportChanges ) -> Result<Handle> {
		if changes.title.trim().is_empty() {
			return Err( Error::Invalid( "a report needs a title".into() ) );
		}
		self.ensure_user( author ).await?;

		let report_id = id.to_owned();
		let author_id = author.id.clone();
		let saved = self.with(move |con| {
			let tx = con.transaction()?;
			let owner: Option<String> = tx.query_row("SELECT author_id FROM reports WHERE id = ?", params![report_id],
				|row| row.get(0)
			).optional()?;

			let now = to_millis( &Utc::now() );
			match owner {
				Some(owner) if owner != author_id => return Ok( false ),
				Some(_) => {
					tx.execute("UPDATE reports SET title = ?, description = ?, environment = ?, updated_at = ? WHERE id = ?",
						params![changes.title, changes.description, changes.environment, now, report_id]
					)?;
				},
				None => {
					tx.execute("INSERT INTO reports (id, title, description, author_id, environment, created_at, updated_at) VALUES (?,?,?,?,?,?,?)",
						params![report_id, changes.title, changes.description, author_id, changes.environment, now, now]
					)?;
				}
			}
			tx.commit()?;
			Ok( true )
		}).await?;

		if !saved {
			return Err( Error::Forbidden( "you are not authorized to edit this report" ) );
		}
		Ok( self.report( id.to_owned() ) )
	}
}

impl Handle {

	/// Loads the whole report: its posts with their images, comments and likes, its strains and its likes.
	pub async fn load( &self ) -> Result<Report> {
		let id = self.id.clone();
		let sql = format!("{} WHERE r.id = ?", SUMMARY_SELECT);

		let report = self.base.with(|con| {
			let summary = con.query( &sql, params![id], |mut rows| match rows.next()? {
				None => Ok( None ),
				Some(row) => summary_from_row( row ).map( Some )
			})?;
			let (summary, environment) = match summary {
				None => return Ok( None ),
				Some(s) => s
			};

			Ok( Some( Report {
				posts: post::load_posts( con, &summary.id )?,
				strains: load_strains( con, &summary.id )?,
				likes: con.load_likes( LikeTarget::Report, &summary.id )?,
				id: summary.id,
				title: summary.title,
				description: summary.description,
				author: summary.author,
				environment,
				image: summary.image,
				created_at: summary.created_at,
				updated_at: summary.updated_at
			}))
		}).await?;

		report.ok_or_else(|| Error::NotFound( "report", self.id.clone() ))
	}

	pub(crate) async fn load_owner( &self ) -> Result<(String, DateTime<Utc>)> {
		let owner = self.base.query_one("SELECT author_id, created_at FROM reports WHERE id = ?", params![self.id],
			|_, row| Ok(( row.get(0)?, timestamp( row, 1 )? ))
		).await?;

		owner.ok_or_else(|| Error::NotFound( "report", self.id.clone() ))
	}

	/// Deletes the report with everything in it, if `user_id` wrote it.
	pub async fn delete_as( &self, user_id: &str ) -> Result<()> {
		let (author_id, _) = self.load_owner().await?;
		if author_id != user_id {
			return Err( Error::Forbidden( "you are not authorized to delete this report" ) );
		}

		let id = self.id.clone();
		self.base.with(|con| {
			let tx = con.transaction()?;
			tx.execute("DELETE FROM likes WHERE item_type = 'post' AND item_id IN (SELECT id FROM posts WHERE report_id = ?1)", params![id])?;
			tx.execute("DELETE FROM likes WHERE item_type = 'report' AND item_id = ?1", params![id])?;
			tx.execute("DELETE FROM images WHERE id IN (SELECT image_id FROM reports WHERE id = ?1)", params![id])?;
			tx.execute("DELETE FROM reports WHERE id = ?1", params![id])?;
			tx.commit()
		}).await?;

		tracing::info!(report = %self.id, "report deleted");
		Ok(())
	}

	/// Adds an update to the timeline. Only the author of the report may post, and not before germination.
	pub async fn create_post<Tz: TimeZone>( &self, author: &Author, new_post: NewPost, tz: &Tz ) -> Result<post::Handle> {
		let (author_id, germination) = self.load_owner().await?;
		if author_id != author.id {
			return Err( Error::Forbidden( "only the author of a report can post updates to it" ) );
		}
		if timeline::growth_day( &new_post.date, &germination, tz ) < 0 {
			return Err( Error::Invalid( format!(
				"an update can not be dated {} because the grow started on {}",
				timeline::calendar_day( &new_post.date, tz ), timeline::calendar_day( &germination, tz )
			)));
		}
		if new_post.title.trim().is_empty() {
			return Err( Error::Invalid( "an update needs a title".into() ) );
		}

		let post_id = new_id();
		let report_id = self.id.clone();
		let now = to_millis( &Utc::now() );

		self.base.with(|con| {
			let tx = con.transaction()?;
			tx.execute("INSERT INTO posts (id, report_id, author_id, date, title, content, stage, light_watts, created_at) VALUES (?,?,?,?,?,?,?,?,?)",
				params![post_id, report_id, author.id, to_millis( &new_post.date ), new_post.title, new_post.content, new_post.stage, new_post.light_watts, now]
			)?;
			for image in &new_post.images {
				insert_image( &tx, image, Some( &post_id ) )?;
			}
			tx.execute("UPDATE reports SET updated_at = ? WHERE id = ?", params![now, report_id])?;
			tx.commit()
		}).await?;

		tracing::debug!(report = %self.id, post = %post_id, "update posted");
		Ok( self.clone().into_post( post_id ) )
	}

	/// Lists `strain_id` among the strains grown in the report. Only the author of the report may do so.
	pub async fn add_strain( &self, author: &Author, strain_id: &str ) -> Result<()> {
		let (author_id, _) = self.load_owner().await?;
		if author_id != author.id {
			return Err( Error::Forbidden( "only the author of a report can change its strains" ) );
		}
		let strain = self.base.query_one("SELECT 1 FROM strains WHERE id = ?", params![strain_id], |_, _| Ok(()) ).await?;
		if strain.is_none() {
			return Err( Error::NotFound( "strain", strain_id.to_owned() ) );
		}

		self.base.execute("INSERT OR IGNORE INTO report_strains (report_id, strain_id) VALUES (?,?)",
			params![self.id, strain_id]
		).await?;

		Ok(())
	}

	pub fn into_post( self, post_id: String ) -> post::Handle {
		post::Handle {
			report: self,
			id: post_id
		}
	}
}

fn load_strains( con: &Connection, report_id: &str ) -> rusqlite::Result<Vec<Strain>> {
	con.query_all("SELECT s.id, s.name, s.description, s.effects, s.flavors, s.type FROM strains s
		JOIN report_strains rs ON rs.strain_id = s.id WHERE rs.report_id = ? ORDER BY s.name",
		params![report_id],
		persistence::strain::strain_from_row
	)
}



#[cfg(test)]
mod tests {
	use super::*;
	use chrono::FixedOffset;
	use pretty_assertions::assert_eq;

	use crate::persistence::tests::*;

	fn new_report( title: &str ) -> NewReport {
		NewReport {
			title: title.into(),
			description: "balcony grow".into(),
			environment: Environment::Outdoor,
			image: Some( NewImage {
				cloud_url: "https://img.example/cover.jpg".into(),
				public_id: "growagram/cover".into(),
				post_order: None
			}),
			created_at: Some( at(2024, 1, 1, 9) )
		}
	}

	fn new_post( title: &str, date: DateTime<Utc> ) -> NewPost {
		NewPost {
			date,
			title: title.into(),
			content: "<p>looking good</p>".into(),
			stage: GrowStage::Seedling,
			light_watts: Some(150),
			images: Vec::new()
		}
	}

	#[actix_rt::test]
	async fn report_loads_with_its_timeline_in_date_order() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Northern Lights") ).await.unwrap();

		report.create_post( &mary(), new_post( "two weeks", at(2024, 1, 15, 7) ), &Utc ).await.unwrap();
		report.create_post( &mary(), new_post( "sprouted", at(2024, 1, 1, 18) ), &Utc ).await.unwrap();

		let loaded = report.load().await.unwrap();
		assert_eq!( loaded.title, "Northern Lights" );
		assert_eq!( loaded.environment, Environment::Outdoor );
		assert_eq!( loaded.author, mary() );
		assert_eq!( loaded.created_at, at(2024, 1, 1, 9) );
		assert_eq!( loaded.image.as_ref().map(|i| i.public_id.as_str()), Some("growagram/cover") );

		let titles: Vec<&str> = loaded.posts.iter().map(|p| p.title.as_str()).collect();
		assert_eq!( titles, vec!["sprouted", "two weeks"] );
		assert_eq!( loaded.posts[1].light_watts, Some(150) );
	}

	#[actix_rt::test]
	async fn posts_before_germination_are_rejected() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Skunk") ).await.unwrap();

		match report.create_post( &mary(), new_post( "too early", at(2023, 12, 31, 12) ), &Utc ).await {
			Err(Error::Invalid(_)) => {},
			Err(e) => panic!("unexpected error: {}", e),
			Ok(_) => panic!("post before germination was accepted")
		}

		// Earlier on the same day is still growth day 0.
		report.create_post( &mary(), new_post( "same day", at(2024, 1, 1, 1) ), &Utc ).await.unwrap();
	}

	#[actix_rt::test]
	async fn germination_day_follows_the_given_timezone() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Skunk") ).await.unwrap();
		let new_york = FixedOffset::west_opt( 5 * 3600 ).unwrap();

		// 03:00 UTC on the 1st is still the 31st in New York.
		assert!( report.create_post( &mary(), new_post( "late night", at(2024, 1, 1, 3) ), &new_york ).await.is_err() );
	}

	#[actix_rt::test]
	async fn only_the_author_may_post_or_delete() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Gelato") ).await.unwrap();

		assert!( matches!( report.create_post( &joe(), new_post( "hi", at(2024, 1, 2, 0) ), &Utc ).await, Err(Error::Forbidden(_)) ) );
		assert!( matches!( report.delete_as( "u-joe" ).await, Err(Error::Forbidden(_)) ) );

		report.delete_as( "u-mary" ).await.unwrap();
		assert!( matches!( report.delete_as( "u-mary" ).await, Err(Error::NotFound("report", _)) ) );
		assert!( db.get_report( &report.id ).await.unwrap().is_none() );
	}

	#[actix_rt::test]
	async fn deleting_a_report_removes_its_posts_and_likes() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Gelato") ).await.unwrap();
		let post = report.create_post( &mary(), new_post( "day one", at(2024, 1, 1, 12) ), &Utc ).await.unwrap();
		db.like( &joe(), LikeTarget::Post, &post.id ).await.unwrap();
		db.like( &joe(), LikeTarget::Report, &report.id ).await.unwrap();

		report.delete_as( "u-mary" ).await.unwrap();

		let (posts, likes, images): (i64, i64, i64) = db.query_one(
			"SELECT (SELECT COUNT(*) FROM posts), (SELECT COUNT(*) FROM likes), (SELECT COUNT(*) FROM images)",
			params![], |_, row| Ok(( row.get(0)?, row.get(1)?, row.get(2)? ))
		).await.unwrap().unwrap();
		assert_eq!( (posts, likes, images), (0, 0, 0) );
	}

	#[actix_rt::test]
	async fn saving_updates_own_reports_and_creates_missing_ones() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		let report = db.create_report( &mary(), new_report("Gelato") ).await.unwrap();
		let changes = ReportChanges {
			title: "Gelato #41".into(),
			description: "moved indoors".into(),
			environment: Environment::Indoor
		};

		assert!( matches!( db.save_own_report( &joe(), &report.id, changes.clone() ).await, Err(Error::Forbidden(_)) ) );

		db.save_own_report( &mary(), &report.id, changes.clone() ).await.unwrap();
		let loaded = report.load().await.unwrap();
		assert_eq!( (loaded.title.as_str(), loaded.environment), ("Gelato #41", Environment::Indoor) );

		let created = db.save_own_report( &joe(), "fresh-id", changes ).await.unwrap();
		assert_eq!( created.load().await.unwrap().author, joe() );
	}

	#[actix_rt::test]
	async fn own_reports_are_sorted_as_requested() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		for title in &["Banana Kush", "Amnesia", "Critical"] {
			db.create_report( &mary(), new_report( title ) ).await.unwrap();
		}
		db.create_report( &joe(), new_report("Zkittlez") ).await.unwrap();

		let titles = |reports: Vec<ReportSummary>| reports.into_iter().map(|r| r.title).collect::<Vec<_>>();

		assert_eq!( titles( db.list_own_reports( "u-mary", ReportOrder::Title, false ).await.unwrap() ),
			vec!["Amnesia", "Banana Kush", "Critical"] );
		assert_eq!( titles( db.list_own_reports( "u-mary", ReportOrder::Title, true ).await.unwrap() ),
			vec!["Critical", "Banana Kush", "Amnesia"] );
		assert_eq!( db.list_reports().await.unwrap().len(), 4 );
	}

	#[actix_rt::test]
	async fn reports_need_a_title() {
		let db = persistence::Handle::open_in_memory().await.unwrap();
		assert!( matches!( db.create_report( &mary(), new_report("  ") ).await, Err(Error::Invalid(_)) ) );

		let report = db.create_report( &mary(), new_report("Gelato") ).await.unwrap();
		let blank = ReportChanges {
			title: " ".into(),
			description: String::new(),
			environment: Environment::Indoor
		};
		assert!( matches!( db.save_own_report( &mary(), &report.id, blank.clone() ).await, Err(Error::Invalid(_)) ) );
		assert!( matches!( db.save_own_report( &mary(), "fresh-id", blank ).await, Err(Error::Invalid(_)) ) );
		assert_eq!( report.load().await.unwrap().title, "Gelato" );
		assert!( db.get_report("fresh-id").await.unwrap().is_none() );
	}

	#[test]
	fn concurrent_saves_of_a_new_report_store_it_once() {
		let db = actix_rt::Runtime::new().unwrap().block_on( persistence::Handle::open_in_memory() ).unwrap();

		std::thread::scope(|scope| {
			let saves: Vec<_> = (0..8).map(|i| {
				let db = db.clone();
				scope.spawn(move || {
					let changes = ReportChanges {
						title: format!("Gelato #{}", i),
						description: String::new(),
						environment: Environment::Indoor
					};
					actix_rt::Runtime::new().unwrap().block_on( db.save_own_report( &mary(), "shared-id", changes ) ).map(|_| ())
				})
			}).collect();

			for save in saves {
				assert!( save.join().unwrap().is_ok() );
			}
		});

		let own = actix_rt::Runtime::new().unwrap().block_on( db.list_own_reports( "u-mary", ReportOrder::CreatedAt, false ) ).unwrap();
		assert_eq!( own.len(), 1 );
		assert_eq!( own[0].id, "shared-id" );
	}
}

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Deserialize;

use crate::{
	common::*,
	model::*,
	persistence::{
		report::{self, insert_image},
		Connection,
		Error,
		LikeTarget,
		Result
	}
};



#[derive(Clone)]
pub struct Handle {
	pub report: report::Handle,
	pub id: String
}

/// An image that was already uploaded to the image host.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
	pub cloud_url: String,
	pub public_id: String,
	pub post_order: Option<i64>
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
	pub date: DateTime<Utc>,
	pub title: String,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub stage: GrowStage,
	pub light_watts: Option<i64>,
	#[serde(default)]
	pub images: Vec<NewImage>
}



impl Handle {

	pub async fn load( &self ) -> Result<Post> {
		let id = self.id.clone();
		let post = self.report.base.with(|con| {
			let mut posts = load_posts_where( con, "p.id = ?", &id )?;
			Ok( posts.pop() )
		}).await?;

		post.ok_or_else(|| Error::NotFound( "post", self.id.clone() ))
	}

	pub async fn add_comment( &self, author: &Author, content: &str ) -> Result<Comment> {
		let content = content.trim();
		if content.is_empty() {
			return Err( Error::Invalid( "a comment can not be empty".into() ) );
		}
		self.report.base.ensure_user( author ).await?;

		let now = Utc::now();
		let comment = Comment {
			id: new_id(),
			post_id: self.id.clone(),
			author: author.clone(),
			content: content.to_owned(),
			created_at: now,
			updated_at: now
		};
		self.report.base.execute("INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at) VALUES (?,?,?,?,?,?)",
			params![comment.id, comment.post_id, author.id, comment.content, to_millis( &now ), to_millis( &now )]
		).await?;

		Ok( comment )
	}

	/// Attaches an already uploaded image to the update. Only the author of the report may do so.
	pub async fn add_image( &self, author: &Author, image: NewImage ) -> Result<Image> {
		let (author_id, _) = self.report.load_owner().await?;
		if author_id != author.id {
			return Err( Error::Forbidden( "only the author of a report can add images to its updates" ) );
		}

		let id = self.id.clone();
		Ok( self.report.base.with(|con| insert_image( con, &image, Some( &id ) )).await? )
	}
}



/// The posts of a report, oldest first. Posts on the same date stay in the order they were stored in.
pub(crate) fn load_posts( con: &Connection, report_id: &str ) -> rusqlite::Result<Vec<Post>> {
	load_posts_where( con, "p.report_id = ?", report_id )
}

fn load_posts_where( con: &Connection, condition: &str, value: &str ) -> rusqlite::Result<Vec<Post>> {
	let sql = format!("SELECT p.id, p.report_id, u.id, u.name, u.image, p.date, p.title, p.content, p.stage, p.light_watts
		FROM posts p JOIN users u ON u.id = p.author_id
		WHERE {} ORDER BY p.date, p.rowid", condition);

	let mut posts = con.query_all( &sql, params![value], |row| Ok( Post {
		id: row.get(0)?,
		report_id: row.get(1)?,
		author: Author {
			id: row.get(2)?,
			name: row.get(3)?,
			image: row.get(4)?
		},
		date: timestamp( row, 5 )?,
		title: row.get(6)?,
		content: row.get(7)?,
		stage: row.get(8)?,
		light_watts: row.get(9)?,
		images: Vec::new(),
		comments: Vec::new(),
		likes: Vec::new()
	}))?;

	for post in &mut posts {
		post.images = load_images( con, &post.id )?;
		post.comments = load_comments( con, &post.id )?;
		post.likes = con.load_likes( LikeTarget::Post, &post.id )?;
	}

	Ok( posts )
}

fn load_images( con: &Connection, post_id: &str ) -> rusqlite::Result<Vec<Image>> {
	con.query_all("SELECT id, cloud_url, public_id, post_order FROM images WHERE post_id = ? ORDER BY COALESCE(post_order, 0), rowid",
		params![post_id],
		|row| Ok( Image {
			id: row.get(0)?,
			cloud_url: row.get(1)?,
			public_id: row.get(2)?,
			post_order: row.get(3)?
		})
	)
}

fn load_comments( con: &Connection, post_id: &str ) -> rusqlite::Result<Vec<Comment>> {
	con.query_all("SELECT c.id, c.post_id, u.id, u.name, u.image, c.content, c.created_at, c.updated_at
		FROM comments c JOIN users u ON u.id = c.author_id WHERE c.post_id = ? ORDER BY c.created_at, c.rowid",
		params![post_id],
		|row| Ok( Comment {
			id: row.get(0)?,
			post_id: row.get(1)?,
			author: Author {
				id: row.get(2)?,
				name: row.get(3)?,
				image: row.get(4)?
			},
			content: row.get(5)?,
			created_at: timestamp( row, 6 )?,
			updated_at: timestamp( row, 7 )?
		})
	)
}

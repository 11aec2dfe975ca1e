use std::{
	ops::{Deref, DerefMut},
	path::Path,
	sync::{Arc, Mutex, PoisonError}
};

use fallible_iterator::FallibleIterator;
use rusqlite::{self, params, Params, Row};
use thiserror::Error;

use crate::{
	common::*,
	model::*,
	runtime
};

pub mod post;
pub mod report;
pub mod strain;



const SCHEMA: &str = "
	PRAGMA foreign_keys = ON;

	CREATE TABLE IF NOT EXISTS users (
		id TEXT PRIMARY KEY,
		name TEXT NOT NULL,
		image TEXT
	);
	CREATE TABLE IF NOT EXISTS images (
		id TEXT PRIMARY KEY,
		public_id TEXT NOT NULL,
		cloud_url TEXT NOT NULL,
		post_id TEXT REFERENCES posts(id) ON DELETE CASCADE,
		post_order INTEGER
	);
	CREATE TABLE IF NOT EXISTS reports (
		id TEXT PRIMARY KEY,
		title TEXT NOT NULL,
		description TEXT NOT NULL,
		author_id TEXT NOT NULL REFERENCES users(id),
		image_id TEXT REFERENCES images(id) ON DELETE SET NULL,
		environment INTEGER NOT NULL DEFAULT 0,
		created_at INTEGER NOT NULL,
		updated_at INTEGER NOT NULL
	);
	CREATE TABLE IF NOT EXISTS posts (
		id TEXT PRIMARY KEY,
		report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
		author_id TEXT NOT NULL REFERENCES users(id),
		date INTEGER NOT NULL,
		title TEXT NOT NULL,
		content TEXT NOT NULL,
		stage INTEGER NOT NULL,
		light_watts INTEGER,
		created_at INTEGER NOT NULL
	);
	CREATE INDEX IF NOT EXISTS posts_by_report ON posts (report_id, date);
	CREATE TABLE IF NOT EXISTS comments (
		id TEXT PRIMARY KEY,
		post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
		author_id TEXT NOT NULL REFERENCES users(id),
		content TEXT NOT NULL,
		created_at INTEGER NOT NULL,
		updated_at INTEGER NOT NULL
	);
	CREATE TABLE IF NOT EXISTS likes (
		id TEXT PRIMARY KEY,
		user_id TEXT NOT NULL REFERENCES users(id),
		item_type TEXT NOT NULL,
		item_id TEXT NOT NULL,
		created_at INTEGER NOT NULL,
		updated_at INTEGER NOT NULL,
		UNIQUE (user_id, item_type, item_id)
	);
	CREATE TABLE IF NOT EXISTS strains (
		id TEXT PRIMARY KEY,
		name TEXT NOT NULL,
		description TEXT NOT NULL,
		effects TEXT NOT NULL,
		flavors TEXT NOT NULL,
		type TEXT NOT NULL
	);
	CREATE TABLE IF NOT EXISTS report_strains (
		report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
		strain_id TEXT NOT NULL REFERENCES strains(id) ON DELETE CASCADE,
		PRIMARY KEY (report_id, strain_id)
	);
";



pub struct Connection ( rusqlite::Connection );

#[derive(Clone)]
pub struct Handle {
	db: Arc<Mutex<Connection>>
}

/// The errors of the data-access layer.
#[derive(Debug, Error)]
pub enum Error {
	#[error("{0} {1} not found")]
	NotFound( &'static str, String ),
	/// The caller is not allowed to touch the entry.
	#[error("forbidden: {0}")]
	Forbidden( &'static str ),
	/// The given data would break an invariant of the model.
	#[error("invalid: {0}")]
	Invalid( String ),
	#[error("database error: {0}")]
	Database( #[from] rusqlite::Error )
}

pub type Result<T> = std::result::Result<T, Error>;

/// Something a like can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LikeTarget {
	Report,
	Post
}



impl Connection {
	pub fn query<P, F, R>( &self, sql: &str, params: P, on_result: F ) -> rusqlite::Result<R> where
		P: Params,
		F: FnOnce(rusqlite::Rows) -> rusqlite::Result<R>
	{
		let mut statement = self.0.prepare_cached( sql )?;
		let result = statement.query( params )?;

		on_result( result )
	}

	/// Collects every row of the query into a vector.
	pub fn query_all<P, F, R>( &self, sql: &str, params: P, on_row: F ) -> rusqlite::Result<Vec<R>> where
		P: Params,
		F: FnMut(&Row<'_>) -> rusqlite::Result<R>
	{
		self.query( sql, params, |rows| rows.map( on_row ).collect() )
	}

	pub fn load_likes( &self, target: LikeTarget, item_id: &str ) -> rusqlite::Result<Vec<Like>> {
		self.query_all("SELECT l.id, l.user_id, u.name, l.created_at, l.updated_at FROM likes l JOIN users u ON u.id = l.user_id
			WHERE l.item_type = ? AND l.item_id = ? ORDER BY l.created_at",
			params![target.as_str(), item_id],
			|row| Ok( Like {
				id: row.get(0)?,
				user_id: row.get(1)?,
				name: row.get(2)?,
				created_at: timestamp( row, 3 )?,
				updated_at: timestamp( row, 4 )?
			})
		)
	}
}

impl Handle {

	pub async fn open( path: &Path ) -> Result<Self> {
		let path = path.to_owned();
		let connection = runtime::block_on(move || rusqlite::Connection::open( path )).await?;

		Self::with_connection( connection ).await
	}

	pub async fn open_in_memory() -> Result<Self> {
		Self::with_connection( rusqlite::Connection::open_in_memory()? ).await
	}

	async fn with_connection( connection: rusqlite::Connection ) -> Result<Self> {
		runtime::block_on(|| connection.execute_batch( SCHEMA )).await?;

		Ok( Self {
			db: Arc::new( Mutex::new( Connection( connection ) ) )
		})
	}

	/// Runs `func` with exclusive access to the connection.
	pub async fn with<F, R>( &self, func: F ) -> rusqlite::Result<R> where
		F: FnOnce(&mut Connection) -> rusqlite::Result<R>
	{
		let db = self.db.clone();

		runtime::block_on(move || {
			// A panic while holding the lock does not leave the connection itself in a bad state.
			let mut guard = db.lock().unwrap_or_else( PoisonError::into_inner );
			func( &mut *guard )
		}).await
	}

	pub async fn execute<P>( &self, sql: &str, params: P ) -> rusqlite::Result<usize> where
		P: Params
	{
		self.with(|con| con.execute( sql, params )).await
	}

	pub async fn query<P, F, R>( &self, sql: &str, params: P, on_result: F ) -> rusqlite::Result<R> where
		P: Params,
		F: FnOnce(&Connection, rusqlite::Rows) -> rusqlite::Result<R>
	{
		self.with(|con| {
			let con = &*con;
			con.query( sql, params, |rows| on_result( con, rows ) )
		}).await
	}

	/// Queries one row.
	pub async fn query_one<P, F, R>( &self, sql: &str, params: P, on_result: F ) -> rusqlite::Result<Option<R>> where
		P: Params,
		F: FnOnce(&Connection, &Row<'_>) -> rusqlite::Result<R>
	{
		self.query( sql, params, |con, mut rows| {
			let result = match rows.next()? {
				None => None,
				Some(row) => Some( on_result( con, row )? )
			};
			Ok( result )
		}).await
	}

	/// Makes sure the user exists, and keeps their display name and avatar current.
	pub async fn ensure_user( &self, author: &Author ) -> Result<()> {
		self.execute("INSERT INTO users (id, name, image) VALUES (?1, ?2, ?3)
			ON CONFLICT (id) DO UPDATE SET name = excluded.name, image = COALESCE(excluded.image, users.image)",
			params![author.id, author.name, author.image]
		).await?;

		Ok(())
	}

	pub fn report( &self, id: String ) -> report::Handle {
		report::Handle {
			base: self.clone(),
			id
		}
	}

	/// Returns the report with the given id, if it exists.
	pub async fn get_report( &self, id: &str ) -> Result<Option<report::Handle>> {
		let found = self.query_one("SELECT id FROM reports WHERE id = ?", params![id],
			|_, row| row.get::<_, String>(0)
		).await?;

		Ok( found.map(|id| self.report( id )) )
	}

	/// Finds a post by its id alone.
	pub async fn get_post( &self, id: &str ) -> Result<Option<post::Handle>> {
		let found = self.query_one("SELECT report_id FROM posts WHERE id = ?", params![id],
			|_, row| row.get::<_, String>(0)
		).await?;

		Ok( found.map(|report_id| self.report( report_id ).into_post( id.to_owned() )) )
	}

	/// Likes a report or post. Liking the same thing twice has no further effect.
	/// Returns whether a new like was stored.
	pub async fn like( &self, user: &Author, target: LikeTarget, item_id: &str ) -> Result<bool> {
		self.ensure_user( user ).await?;
		self.require_target( target, item_id ).await?;

		let now = to_millis( &chrono::Utc::now() );
		let affected = self.execute("INSERT OR IGNORE INTO likes (id, user_id, item_type, item_id, created_at, updated_at) VALUES (?,?,?,?,?,?)",
			params![new_id(), user.id, target.as_str(), item_id, now, now]
		).await?;

		Ok( affected == 1 )
	}

	/// Returns whether there was a like to remove.
	pub async fn unlike( &self, user_id: &str, target: LikeTarget, item_id: &str ) -> Result<bool> {
		let affected = self.execute("DELETE FROM likes WHERE user_id = ? AND item_type = ? AND item_id = ?",
			params![user_id, target.as_str(), item_id]
		).await?;

		Ok( affected > 0 )
	}

	async fn require_target( &self, target: LikeTarget, item_id: &str ) -> Result<()> {
		let sql = match target {
			LikeTarget::Report => "SELECT 1 FROM reports WHERE id = ?",
			LikeTarget::Post => "SELECT 1 FROM posts WHERE id = ?"
		};
		let exists = self.query_one( sql, params![item_id], |_, _| Ok(()) ).await?;

		exists.ok_or_else(|| Error::NotFound( target.as_str(), item_id.to_owned() ))
	}
}

impl LikeTarget {
	pub fn as_str( self ) -> &'static str {
		match self {
			Self::Report => "report",
			Self::Post => "post"
		}
	}
}



impl Deref for Connection {
	type Target = rusqlite::Connection;

	fn deref( &self ) -> &Self::Target {
		&self.0
	}
}

impl DerefMut for Connection {
	fn deref_mut( &mut self ) -> &mut Self::Target {
		&mut self.0
	}
}

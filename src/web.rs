use std::future::{ready, Ready};

use actix_web::{
	dev::Payload,
	error::ResponseError,
	get,
	http::{header, StatusCode},
	web,
	FromRequest,
	HttpRequest,
	HttpResponse
};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::{
	config::Config,
	model::{Author, Report},
	persistence,
	timeline::{
		self,
		calendar::DatePicker,
		columns::column_count,
		selection::{Notice, Outcome, Selection}
	},
	view::ReportView
};

pub mod api;



pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_IMAGE_HEADER: &str = "x-user-image";



pub struct Globals {
	pub db: persistence::Handle,
	pub tera: tera::Tera,
	pub config: Config
}

#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	NotFound( String ),
	#[error("{0}")]
	Unauthorized( &'static str ),
	#[error("{0}")]
	Forbidden( String ),
	#[error("{0}")]
	BadRequest( String ),
	#[error("template error: {0}")]
	Template( #[from] tera::Error ),
	#[error("internal server error")]
	Internal
}

/// The caller, as identified by the proxy in front of us.
#[derive(Clone, Debug)]
pub struct Viewer( pub Author );

#[derive(Deserialize)]
pub struct TimelineQuery {
	/// The day picked on the date picker.
	pub date: Option<NaiveDate>,
	/// The viewport width in pixels.
	pub width: Option<u32>
}



pub fn configure( cfg: &mut web::ServiceConfig ) {
	cfg.service( homepage )
		.service( report_page )
		.service( post_page )
		.service( api::list_reports )
		.service( api::list_own_reports )
		.service( api::create_report )
		.service( api::get_report )
		.service( api::save_report )
		.service( api::delete_report )
		.service( api::select_date )
		.service( api::create_post )
		.service( api::create_comment )
		.service( api::add_image )
		.service( api::like )
		.service( api::unlike )
		.service( api::list_strains )
		.service( api::create_strain )
		.service( api::add_strain );
}



#[get("/")]
pub async fn homepage( g: web::Data<Globals> ) -> Result<HttpResponse, AppError> {
	let reports = g.db.list_reports().await?;

	let mut context = tera::Context::new();
	context.insert("reports", &reports);

	render( &g, "index.html", &context )
}

#[get("/grow/{report_id}")]
pub async fn report_page( g: web::Data<Globals>, path: web::Path<String>, q: web::Query<TimelineQuery> ) -> Result<HttpResponse, AppError> {
	let report = load_report( &g, &path ).await?;
	let tz = g.config.timezone;

	let mut selection = Selection::default();
	match selection.pick( &report, q.date, &tz ) {
		Outcome::Matched { navigation, .. } => Ok( redirect( &navigation.path, q.width ) ),
		outcome => render_timeline( &g, &report, None, &selection, outcome.notice(), q.width )
	}
}

#[get("/grow/{report_id}/update/{post_id}")]
pub async fn post_page( g: web::Data<Globals>, path: web::Path<(String, String)>, q: web::Query<TimelineQuery> ) -> Result<HttpResponse, AppError> {
	let (report_id, post_id) = path.into_inner();
	let report = load_report( &g, &report_id ).await?;
	let tz = g.config.timezone;

	let post = report.find_post( &post_id )
		.ok_or_else(|| AppError::NotFound( format!("update {} could not be found", post_id) ))?;

	let mut selection = Selection::showing( post );
	match selection.pick( &report, q.date, &tz ) {
		Outcome::Matched { post: matched, navigation, .. } if matched.id != post.id => {
			Ok( redirect( &navigation.path, q.width ) )
		},
		outcome => render_timeline( &g, &report, Some( &post.id ), &selection, outcome.notice(), q.width )
	}
}



async fn load_report( g: &Globals, report_id: &str ) -> Result<Report, AppError> {
	match g.db.get_report( report_id ).await? {
		None => Err( AppError::NotFound( format!("grow {} could not be found", report_id) ) ),
		Some(handle) => Ok( handle.load().await? )
	}
}

/// The number of months the date picker shows for a viewport `width` pixels wide.
pub fn columns_for( config: &Config, width: Option<u32> ) -> u32 {
	column_count( width.unwrap_or( config.default_viewport_width ), &config.breakpoints )
}

fn render_timeline( g: &Globals, report: &Report, current: Option<&str>, selection: &Selection, notice: Option<&Notice>, width: Option<u32> ) -> Result<HttpResponse, AppError> {
	let tz = g.config.timezone;
	let view = ReportView::build( report, &tz );
	let selected_day = selection.date.map(|d| timeline::calendar_day( &d, &tz ));
	let picker = DatePicker::build( report, selected_day, columns_for( &g.config, width ), &tz );

	let mut context = tera::Context::new();
	context.insert("current", &current.and_then(|id| view.post( id )));
	context.insert("report", &view);
	context.insert("picker", &picker);
	context.insert("notice", &notice);
	context.insert("width", &width);

	render( g, "report.html", &context )
}

fn render( g: &Globals, template: &str, context: &tera::Context ) -> Result<HttpResponse, AppError> {
	let html = g.tera.render( template, context ).map_err(|e| {
		tracing::error!(template, error = ?e, "template error");
		AppError::from(e)
	})?;

	Ok( HttpResponse::Ok().content_type("text/html; charset=utf-8").body( html ) )
}

fn redirect( path: &str, width: Option<u32> ) -> HttpResponse {
	let location = match width {
		None => path.to_owned(),
		Some(w) => format!("{}?width={}", path, w)
	};

	HttpResponse::SeeOther().append_header(( header::LOCATION, location )).finish()
}



impl ResponseError for AppError {
	fn status_code( &self ) -> StatusCode {
		match self {
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			Self::Forbidden(_) => StatusCode::FORBIDDEN,
			Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			Self::Template(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR
		}
	}

	fn error_response( &self ) -> HttpResponse {
		let status = self.status_code();

		HttpResponse::build( status ).json( serde_json::json!({
			"error": self.to_string(),
			"status": status.as_u16()
		}))
	}
}

impl From<persistence::Error> for AppError {
	fn from( other: persistence::Error ) -> Self {
		match other {
			persistence::Error::NotFound( kind, id ) => Self::NotFound( format!("{} {} could not be found", kind, id) ),
			persistence::Error::Forbidden( reason ) => Self::Forbidden( reason.to_owned() ),
			persistence::Error::Invalid( reason ) => Self::BadRequest( reason ),
			persistence::Error::Database( e ) => {
				tracing::error!(error = %e, "persistence error");
				Self::Internal
			}
		}
	}
}

impl FromRequest for Viewer {
	type Error = AppError;
	type Future = Ready<Result<Self, Self::Error>>;

	fn from_request( req: &HttpRequest, _: &mut Payload ) -> Self::Future {
		ready( viewer_from_request( req ) )
	}
}

fn viewer_from_request( req: &HttpRequest ) -> Result<Viewer, AppError> {
	let header = |name: &str| req.headers().get( name )
		.and_then(|v| v.to_str().ok())
		.map(|v| v.trim().to_owned())
		.filter(|v| !v.is_empty());

	let id = header( USER_ID_HEADER ).ok_or( AppError::Unauthorized( "you need to be signed in to do that" ) )?;

	Ok( Viewer( Author {
		name: header( USER_NAME_HEADER ).unwrap_or_else(|| id.clone()),
		image: header( USER_IMAGE_HEADER ),
		id
	}))
}

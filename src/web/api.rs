//! The JSON API. Mutations need a `Viewer`.

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
	persistence::{
		post::{NewImage, NewPost},
		report::{NewReport, ReportChanges, ReportOrder},
		strain::NewStrain,
		LikeTarget
	},
	timeline::{
		self,
		calendar::DatePicker,
		selection::{Navigation, Notice, Outcome, Selection}
	},
	view::ReportView,
	web::{columns_for, load_report, AppError, Globals, Viewer}
};



#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnReportsQuery {
	#[serde(default)]
	order_by: ReportOrder,
	#[serde(default)]
	desc: bool
}

#[derive(Deserialize)]
pub struct SelectQuery {
	date: Option<NaiveDate>,
	width: Option<u32>,
	/// The post that is displayed before the pick.
	current: Option<String>
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
	matched: bool,
	selection: Selection,
	grow_day: Option<i64>,
	navigation: Option<Navigation>,
	notice: Option<Notice>,
	picker: DatePicker
}

#[derive(Deserialize)]
pub struct CommentRequest {
	content: String
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrainRequest {
	strain_id: String
}

#[derive(Deserialize)]
pub struct LikeRequest {
	target: LikeTarget,
	id: String
}



#[get("/api/reports")]
pub async fn list_reports( g: web::Data<Globals> ) -> Result<HttpResponse, AppError> {
	Ok( HttpResponse::Ok().json( g.db.list_reports().await? ) )
}

#[get("/api/reports/own")]
pub async fn list_own_reports( g: web::Data<Globals>, viewer: Viewer, q: web::Query<OwnReportsQuery> ) -> Result<HttpResponse, AppError> {
	let reports = g.db.list_own_reports( &viewer.0.id, q.order_by, q.desc ).await?;

	Ok( HttpResponse::Ok().json( reports ) )
}

#[get("/api/reports/{id}")]
pub async fn get_report( g: web::Data<Globals>, path: web::Path<String> ) -> Result<HttpResponse, AppError> {
	let report = load_report( &g, &path ).await?;

	Ok( HttpResponse::Ok().json( ReportView::build( &report, &g.config.timezone ) ) )
}

#[post("/api/reports")]
pub async fn create_report( g: web::Data<Globals>, viewer: Viewer, body: web::Json<NewReport> ) -> Result<HttpResponse, AppError> {
	let report = g.db.create_report( &viewer.0, body.into_inner() ).await?.load().await?;

	Ok( HttpResponse::Created().json( ReportView::build( &report, &g.config.timezone ) ) )
}

#[put("/api/reports/{id}")]
pub async fn save_report( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String>, body: web::Json<ReportChanges> ) -> Result<HttpResponse, AppError> {
	let report = g.db.save_own_report( &viewer.0, &path, body.into_inner() ).await?.load().await?;

	Ok( HttpResponse::Ok().json( ReportView::build( &report, &g.config.timezone ) ) )
}

#[delete("/api/reports/{id}")]
pub async fn delete_report( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String> ) -> Result<HttpResponse, AppError> {
	g.db.report( path.into_inner() ).delete_as( &viewer.0.id ).await?;

	Ok( HttpResponse::Ok().json( serde_json::json!({ "success": true }) ) )
}

/// Runs a date pick against the report, the way the date picker of a report page does.
#[get("/api/reports/{id}/select")]
pub async fn select_date( g: web::Data<Globals>, path: web::Path<String>, q: web::Query<SelectQuery> ) -> Result<HttpResponse, AppError> {
	let report = load_report( &g, &path ).await?;
	let tz = g.config.timezone;

	let mut selection = match q.current.as_deref().and_then(|id| report.find_post( id )) {
		None => Selection::default(),
		Some(post) => Selection::showing( post )
	};

	let (grow_day, navigation, notice) = match selection.pick( &report, q.date, &tz ) {
		Outcome::Ignored => (None, None, None),
		Outcome::Matched { growth_day, navigation, .. } => (Some( growth_day ), Some( navigation ), None),
		Outcome::NoPost( notice ) => (None, None, Some( notice ))
	};

	let selected_day = selection.date.map(|d| timeline::calendar_day( &d, &tz ));
	let picker = DatePicker::build( &report, selected_day, columns_for( &g.config, q.width ), &tz );

	Ok( HttpResponse::Ok().json( SelectResponse {
		matched: navigation.is_some(),
		selection,
		grow_day,
		navigation,
		notice,
		picker
	}))
}

#[post("/api/reports/{id}/posts")]
pub async fn create_post( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String>, body: web::Json<NewPost> ) -> Result<HttpResponse, AppError> {
	let tz = g.config.timezone;
	let report = match g.db.get_report( &path ).await? {
		None => return Err( AppError::NotFound( format!("grow {} could not be found", path) ) ),
		Some(r) => r
	};

	let post = report.create_post( &viewer.0, body.into_inner(), &tz ).await?;
	let view = ReportView::build( &report.load().await?, &tz );

	match view.post( &post.id ) {
		Some(created) => Ok( HttpResponse::Created().json( created ) ),
		None => Err( AppError::Internal )
	}
}

#[post("/api/posts/{id}/comments")]
pub async fn create_comment( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String>, body: web::Json<CommentRequest> ) -> Result<HttpResponse, AppError> {
	let post = match g.db.get_post( &path ).await? {
		None => return Err( AppError::NotFound( format!("update {} could not be found", path) ) ),
		Some(p) => p
	};

	let comment = post.add_comment( &viewer.0, &body.content ).await?;
	Ok( HttpResponse::Created().json( comment ) )
}

/// Attaches an image, already uploaded to the image host, to an update.
#[post("/api/posts/{id}/images")]
pub async fn add_image( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String>, body: web::Json<NewImage> ) -> Result<HttpResponse, AppError> {
	let post = match g.db.get_post( &path ).await? {
		None => return Err( AppError::NotFound( format!("update {} could not be found", path) ) ),
		Some(p) => p
	};

	let image = post.add_image( &viewer.0, body.into_inner() ).await?;
	Ok( HttpResponse::Created().json( image ) )
}

#[post("/api/likes")]
pub async fn like( g: web::Data<Globals>, viewer: Viewer, body: web::Json<LikeRequest> ) -> Result<HttpResponse, AppError> {
	let liked = g.db.like( &viewer.0, body.target, &body.id ).await?;

	Ok( HttpResponse::Ok().json( serde_json::json!({ "liked": liked }) ) )
}

#[delete("/api/likes")]
pub async fn unlike( g: web::Data<Globals>, viewer: Viewer, body: web::Json<LikeRequest> ) -> Result<HttpResponse, AppError> {
	let removed = g.db.unlike( &viewer.0.id, body.target, &body.id ).await?;

	Ok( HttpResponse::Ok().json( serde_json::json!({ "removed": removed }) ) )
}

#[get("/api/strains")]
pub async fn list_strains( g: web::Data<Globals> ) -> Result<HttpResponse, AppError> {
	Ok( HttpResponse::Ok().json( g.db.list_strains().await? ) )
}

#[post("/api/strains")]
pub async fn create_strain( g: web::Data<Globals>, _viewer: Viewer, body: web::Json<NewStrain> ) -> Result<HttpResponse, AppError> {
	Ok( HttpResponse::Created().json( g.db.create_strain( body.into_inner() ).await? ) )
}

#[post("/api/reports/{id}/strains")]
pub async fn add_strain( g: web::Data<Globals>, viewer: Viewer, path: web::Path<String>, body: web::Json<StrainRequest> ) -> Result<HttpResponse, AppError> {
	let report = match g.db.get_report( &path ).await? {
		None => return Err( AppError::NotFound( format!("grow {} could not be found", path) ) ),
		Some(r) => r
	};

	report.add_strain( &viewer.0, &body.strain_id ).await?;
	Ok( HttpResponse::Ok().json( ReportView::build( &report.load().await?, &g.config.timezone ) ) )
}



#[cfg(test)]
mod tests {
	use actix_web::{http::StatusCode, test, App};
	use serde_json::{json, Value};

	use crate::web::{configure, tests::*, USER_ID_HEADER, USER_NAME_HEADER};

	#[actix_rt::test]
	async fn selecting_a_post_day_returns_the_navigation() {
		let g = globals().await;
		let (report, _, two_weeks) = january_grow( &g ).await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::get().uri( &format!("/api/reports/{}/select?date=2024-01-15&width=1000", report) ).to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;

		assert_eq!( body["matched"], json!(true) );
		assert_eq!( body["growDay"], json!(14) );
		assert_eq!( body["selection"]["postId"], json!(two_weeks) );
		assert_eq!( body["navigation"], json!({
			"path": format!("/grow/{}/update/{}", report, two_weeks),
			"shallow": true,
			"scroll": false
		}));
		assert_eq!( body["picker"]["columns"], json!(3) );
		assert_eq!( body["notice"], Value::Null );
	}

	#[actix_rt::test]
	async fn selecting_an_empty_day_keeps_the_current_post() {
		let g = globals().await;
		let (report, sprouted, _) = january_grow( &g ).await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::get()
			.uri( &format!("/api/reports/{}/select?date=2024-01-10&current={}", report, sprouted) )
			.to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;

		assert_eq!( body["matched"], json!(false) );
		assert_eq!( body["navigation"], Value::Null );
		assert_eq!( body["notice"]["message"], json!("Sorry... no update for this day!") );
		assert_eq!( body["selection"]["postId"], json!(sprouted) );
	}

	#[actix_rt::test]
	async fn report_json_has_growth_days() {
		let g = globals().await;
		let (report, _, _) = january_grow( &g ).await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::get().uri( &format!("/api/reports/{}", report) ).to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;

		let days: Vec<i64> = body["posts"].as_array().unwrap().iter().map(|p| p["growDay"].as_i64().unwrap()).collect();
		assert_eq!( days, vec![0, 14] );
		assert_eq!( body["germinationDay"], json!("2024-01-01") );
	}

	#[actix_rt::test]
	async fn mutations_need_a_viewer() {
		let g = globals().await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::post().uri("/api/reports")
			.set_json( json!({ "title": "Runtz", "description": "" }) )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::UNAUTHORIZED );
	}

	#[actix_rt::test]
	async fn reports_can_be_created_posted_to_and_deleted() {
		let g = globals().await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::post().uri("/api/reports")
			.insert_header(( USER_ID_HEADER, "u-kim" ))
			.insert_header(( USER_NAME_HEADER, "Kim" ))
			.set_json( json!({ "title": "Runtz", "description": "tent", "createdAt": "2024-03-01T10:00:00Z" }) )
			.to_request();
		let res = test::call_service( &app, req ).await;
		assert_eq!( res.status(), StatusCode::CREATED );
		let created: Value = test::read_body_json( res ).await;
		let id = created["id"].as_str().unwrap().to_owned();
		assert_eq!( created["author"]["name"], json!("Kim") );

		let req = test::TestRequest::post().uri( &format!("/api/reports/{}/posts", id) )
			.insert_header(( USER_ID_HEADER, "u-kim" ))
			.set_json( json!({ "date": "2024-03-11T08:00:00Z", "title": "day ten", "stage": "Vegetative" }) )
			.to_request();
		let res = test::call_service( &app, req ).await;
		assert_eq!( res.status(), StatusCode::CREATED );
		let post: Value = test::read_body_json( res ).await;
		assert_eq!( post["growDay"], json!(10) );
		assert_eq!( post["stage"], json!("Vegetative") );

		let req = test::TestRequest::post().uri( &format!("/api/reports/{}/posts", id) )
			.insert_header(( USER_ID_HEADER, "u-kim" ))
			.set_json( json!({ "date": "2024-02-11T08:00:00Z", "title": "before germination" }) )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::BAD_REQUEST );

		let req = test::TestRequest::delete().uri( &format!("/api/reports/{}", id) )
			.insert_header(( USER_ID_HEADER, "u-someone-else" ))
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::FORBIDDEN );

		let req = test::TestRequest::delete().uri( &format!("/api/reports/{}", id) )
			.insert_header(( USER_ID_HEADER, "u-kim" ))
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::OK );

		let req = test::TestRequest::get().uri( &format!("/api/reports/{}", id) ).to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::NOT_FOUND );
	}

	#[actix_rt::test]
	async fn authors_add_images_and_strains() {
		let g = globals().await;
		let (report, sprouted, _) = january_grow( &g ).await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let image = json!({ "cloudUrl": "https://img.example/sprout.jpg", "publicId": "growagram/sprout", "postOrder": 1 });
		let req = test::TestRequest::post().uri( &format!("/api/posts/{}/images", sprouted) )
			.insert_header(( USER_ID_HEADER, "u-joe" ))
			.set_json( image.clone() )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::FORBIDDEN );

		let req = test::TestRequest::post().uri( &format!("/api/posts/{}/images", sprouted) )
			.insert_header(( USER_ID_HEADER, "u-mary" ))
			.set_json( image )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::CREATED );

		let req = test::TestRequest::post().uri("/api/strains")
			.insert_header(( USER_ID_HEADER, "u-joe" ))
			.set_json( json!({ "name": "Northern Lights", "type": "indica" }) )
			.to_request();
		let res = test::call_service( &app, req ).await;
		assert_eq!( res.status(), StatusCode::CREATED );
		let strain: Value = test::read_body_json( res ).await;
		let strain_id = strain["id"].as_str().unwrap().to_owned();

		let req = test::TestRequest::post().uri( &format!("/api/reports/{}/strains", report) )
			.insert_header(( USER_ID_HEADER, "u-joe" ))
			.set_json( json!({ "strainId": strain_id }) )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::FORBIDDEN );

		let req = test::TestRequest::post().uri( &format!("/api/reports/{}/strains", report) )
			.insert_header(( USER_ID_HEADER, "u-mary" ))
			.set_json( json!({ "strainId": strain_id }) )
			.to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;
		assert_eq!( body["strains"][0]["name"], json!("Northern Lights") );
		assert_eq!( body["posts"][0]["images"][0]["publicId"], json!("growagram/sprout") );
	}

	#[actix_rt::test]
	async fn comments_and_likes() {
		let g = globals().await;
		let (report, sprouted, _) = january_grow( &g ).await;
		let app = test::init_service( App::new().app_data( g.clone() ).configure( configure ) ).await;

		let req = test::TestRequest::post().uri( &format!("/api/posts/{}/comments", sprouted) )
			.insert_header(( USER_ID_HEADER, "u-joe" ))
			.set_json( json!({ "content": "nice!" }) )
			.to_request();
		assert_eq!( test::call_service( &app, req ).await.status(), StatusCode::CREATED );

		for expected in &[true, false] {
			let req = test::TestRequest::post().uri("/api/likes")
				.insert_header(( USER_ID_HEADER, "u-joe" ))
				.set_json( json!({ "target": "report", "id": report }) )
				.to_request();
			let body: Value = test::call_and_read_body_json( &app, req ).await;
			assert_eq!( body["liked"], json!(expected) );
		}

		let req = test::TestRequest::get().uri( &format!("/api/reports/{}", report) ).to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;
		assert_eq!( body["likeCount"], json!(1) );
		assert_eq!( body["posts"][0]["comments"][0]["content"], json!("nice!") );

		let req = test::TestRequest::delete().uri("/api/likes")
			.insert_header(( USER_ID_HEADER, "u-joe" ))
			.set_json( json!({ "target": "report", "id": report }) )
			.to_request();
		let body: Value = test::call_and_read_body_json( &app, req ).await;
		assert_eq!( body["removed"], json!(true) );
	}
}

use actix_web::{web::Data, App, HttpServer};
use tera::Tera;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use growagram::{
	persistence,
	web::{self, Globals},
	Config
};



pub const RETURN_CODE_OK: i32 = 0;
pub const RETURN_CODE_UNEXPECTED: i32 = 1;



#[actix_web::main]
async fn main() {
	std::process::exit( run().await );
}

async fn run() -> i32 {
	// A missing .env file is fine.
	let _ = dotenvy::dotenv();

	tracing_subscriber::registry()
		.with( EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,actix_web=info".into()) )
		.with( tracing_subscriber::fmt::layer() )
		.init();

	let config = match Config::from_env() {
		Err(e) => { tracing::error!("Invalid configuration: {}", e); return RETURN_CODE_UNEXPECTED },
		Ok(c) => c
	};

	if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
		if let Err(e) = std::fs::create_dir_all( dir ) {
			tracing::error!("Unable to create database directory {}: {}", dir.display(), e);
			return RETURN_CODE_UNEXPECTED
		}
	}
	let db = match persistence::Handle::open( &config.database_path ).await {
		Err(e) => { tracing::error!("Unable to open database {}: {}", config.database_path.display(), e); return RETURN_CODE_UNEXPECTED },
		Ok(db) => db
	};
	let tera = match Tera::new( &config.templates ) {
		Err(e) => { tracing::error!("Unable to load templates: {}", e); return RETURN_CODE_UNEXPECTED },
		Ok(t) => t
	};

	let address = (config.host.clone(), config.port);
	let globals = Data::new( Globals {
		db,
		tera,
		config
	});

	let server = match HttpServer::new(move || {

		App::new()
			.wrap( TracingLogger::default() )
			.app_data( globals.clone() )
			.configure( web::configure )
	}).bind( address.clone() ) {
		Err(e) => { tracing::error!("Unable to start HTTP server: {}", e); return RETURN_CODE_UNEXPECTED },
		Ok(server) => server
	};
	tracing::info!("HTTP server starting on {}:{}...", address.0, address.1);

	match server.run().await {
		Err(e) => { tracing::error!("HTTP server error: {}", e); return RETURN_CODE_UNEXPECTED },
		Ok(()) => {}
	}

	tracing::info!("HTTP server stopped.");
	RETURN_CODE_OK
}

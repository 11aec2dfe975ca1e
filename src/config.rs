//! Configuration, read from `GROWAGRAM_*` environment variables.
//!
//! A `.env` file in the working directory is honored by the binary. Every setting has a
//! default, so an empty environment yields a working development setup.

use std::{
	path::PathBuf,
	str::FromStr
};

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use crate::timeline::columns::Breakpoints;



pub const DEFAULT_TEMPLATES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*");



#[derive(Clone, Debug)]
pub struct Config {
	pub host: String,
	pub port: u16,
	pub database_path: PathBuf,
	/// Glob of the templates to load.
	pub templates: String,
	/// The timezone calendar days are taken in.
	pub timezone: FixedOffset,
	pub breakpoints: Breakpoints,
	/// The width assumed when a request does not tell the viewport width.
	pub default_viewport_width: u32
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{key} has an invalid value {value:?}")]
	Invalid { key: &'static str, value: String },
	#[error("breakpoints must be ordered from smallest to largest, got {0:?}")]
	UnorderedBreakpoints( Breakpoints )
}



impl Default for Config {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".into(),
			port: 7777,
			database_path: PathBuf::from("growagram.sqlite"),
			templates: DEFAULT_TEMPLATES.into(),
			timezone: Utc.fix(),
			breakpoints: Breakpoints::default(),
			default_viewport_width: 1280
		}
	}
}

impl Config {

	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var( key ).ok())
	}

	/// Builds the configuration from whatever `lookup` returns for each variable.
	pub fn from_lookup<F>( lookup: F ) -> Result<Self, ConfigError> where
		F: Fn(&str) -> Option<String>
	{
		let defaults = Self::default();

		let offset_minutes: i32 = parse( &lookup, "GROWAGRAM_UTC_OFFSET_MINUTES", 0 )?;
		let timezone = offset_minutes.checked_mul(60).and_then( FixedOffset::east_opt ).ok_or_else(|| ConfigError::Invalid {
			key: "GROWAGRAM_UTC_OFFSET_MINUTES",
			value: offset_minutes.to_string()
		})?;

		let bp = defaults.breakpoints;
		let breakpoints = Breakpoints {
			xs: parse( &lookup, "GROWAGRAM_BREAKPOINT_XS", bp.xs )?,
			sm: parse( &lookup, "GROWAGRAM_BREAKPOINT_SM", bp.sm )?,
			md: parse( &lookup, "GROWAGRAM_BREAKPOINT_MD", bp.md )?,
			lg: parse( &lookup, "GROWAGRAM_BREAKPOINT_LG", bp.lg )?,
			xl: parse( &lookup, "GROWAGRAM_BREAKPOINT_XL", bp.xl )?
		};
		if !breakpoints.is_ordered() {
			return Err( ConfigError::UnorderedBreakpoints( breakpoints ) );
		}

		Ok( Self {
			host: lookup("GROWAGRAM_HOST").unwrap_or( defaults.host ),
			port: parse( &lookup, "GROWAGRAM_PORT", defaults.port )?,
			database_path: lookup("GROWAGRAM_DATABASE").map( PathBuf::from ).unwrap_or( defaults.database_path ),
			templates: lookup("GROWAGRAM_TEMPLATES").unwrap_or( defaults.templates ),
			timezone,
			breakpoints,
			default_viewport_width: parse( &lookup, "GROWAGRAM_DEFAULT_VIEWPORT_WIDTH", defaults.default_viewport_width )?
		})
	}
}

fn parse<F, T>( lookup: &F, key: &'static str, default: T ) -> Result<T, ConfigError> where
	F: Fn(&str) -> Option<String>,
	T: FromStr
{
	match lookup( key ) {
		None => Ok( default ),
		Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
	}
}

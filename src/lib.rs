//! GrowAGram: grow reports made of dated updates, browsed through a date-indexed timeline.

mod r#macro;

pub mod common;
pub mod config;
pub mod model;
pub mod persistence;
pub mod runtime;
pub mod timeline;
pub mod view;
pub mod web;

pub use config::Config;

//! Lays out the months of the date picker.

use chrono::{Datelike, Months, NaiveDate, TimeZone};
use serde::Serialize;

use crate::model::Report;
use crate::timeline::{DateIndex, TimelineBounds};



#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
	pub date: NaiveDate,
	pub day: u32,
	pub has_post: bool,
	/// Outside of the navigable range.
	pub disabled: bool,
	pub selected: bool
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
	pub year: i32,
	pub month: u32,
	pub title: String,
	/// Monday-first weeks. Cells outside of the month are `None`.
	pub weeks: Vec<Vec<Option<CalendarDay>>>
}

/// Everything the date picker of a report needs to render.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePicker {
	pub columns: u32,
	pub first_day: NaiveDate,
	pub last_day: Option<NaiveDate>,
	pub selected: Option<NaiveDate>,
	pub months: Vec<CalendarMonth>
}



impl DatePicker {

	pub fn build<Tz: TimeZone>( report: &Report, selected: Option<NaiveDate>, columns: u32, tz: &Tz ) -> Self {
		let columns = columns.max(1);
		let index = DateIndex::build( &report.posts, tz );
		let bounds = TimelineBounds::compute( report );
		let first_day = bounds.first_day( tz );

		let start = first_visible_month( selected, columns, first_day );
		let months = (0..columns)
			.filter_map(|i| start.checked_add_months( Months::new(i) ))
			.map(|month| layout_month( month, &index, &bounds, selected, tz ))
			.collect();

		Self {
			columns,
			first_day,
			last_day: bounds.last_day( tz ),
			selected,
			months
		}
	}
}



fn first_of_month( day: NaiveDate ) -> NaiveDate {
	day.with_day(1).unwrap_or(day)
}

/// The first month shown when `columns` months are shown at once.
///
/// The selected month is the last column, unless that would start the picker before the
/// month of germination.
pub fn first_visible_month( selected: Option<NaiveDate>, columns: u32, germination: NaiveDate ) -> NaiveDate {
	let germination_month = first_of_month( germination );

	let selected = match selected {
		None => return germination_month,
		Some(s) => s
	};

	first_of_month( selected )
		.checked_sub_months( Months::new( columns.saturating_sub(1) ) )
		.map_or( germination_month, |start| start.max( germination_month ) )
}

fn layout_month<Tz: TimeZone>( month: NaiveDate, index: &DateIndex, bounds: &TimelineBounds, selected: Option<NaiveDate>, tz: &Tz ) -> CalendarMonth {
	let first = first_of_month( month );
	let offset = first.weekday().num_days_from_monday() as usize;

	let mut cells: Vec<Option<CalendarDay>> = vec![None; offset];
	let mut date = first;
	while date.month() == first.month() {
		cells.push( Some( CalendarDay {
			date,
			day: date.day(),
			has_post: index.has_post_on( date ),
			disabled: !bounds.contains( date, tz ),
			selected: selected == Some(date)
		}));

		date = match date.succ_opt() {
			Some(next) => next,
			None => break
		};
	}
	while cells.len() % 7 != 0 {
		cells.push( None );
	}

	CalendarMonth {
		year: first.year(),
		month: first.month(),
		title: first.format("%B %Y").to_string(),
		weeks: cells.chunks(7).map(|week| week.to_vec()).collect()
	}
}

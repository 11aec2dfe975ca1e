//! How many calendar months the date picker shows side by side.



/// Viewport widths in pixels, from smallest to largest.
/// A width belongs to the first breakpoint it does not exceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Breakpoints {
	pub xs: u32,
	pub sm: u32,
	pub md: u32,
	pub lg: u32,
	pub xl: u32
}



impl Default for Breakpoints {
	fn default() -> Self {
		Self {
			xs: 576,
			sm: 768,
			md: 992,
			lg: 1200,
			xl: 1408
		}
	}
}

impl Breakpoints {

	/// Whether the widths are ordered from smallest to largest.
	pub fn is_ordered( &self ) -> bool {
		self.xs <= self.sm && self.sm <= self.md && self.md <= self.lg && self.lg <= self.xl
	}
}



pub fn column_count( width: u32, breakpoints: &Breakpoints ) -> u32 {
	if width <= breakpoints.xs { 1 }
	else if width <= breakpoints.sm { 1 }
	else if width <= breakpoints.md { 2 }
	else if width <= breakpoints.lg { 3 }
	else if width <= breakpoints.xl { 4 }
	else { 5 }
}

/// This macro allows you to create an enum that is stored as an integer column.
/// It implements `TryFrom<i64>`, `Into<i64>` and the rusqlite conversion traits for it.
///
/// The enum needs to be `Copy`.
#[macro_export]
macro_rules! int_enum {
	($(#[$meta:meta])* $vis:vis enum $name:ident {
		$($(#[$vmeta:meta])* $vname:ident = $val:expr),*
	}) => {
		$(#[$meta])*
		$vis enum $name {
			$($(#[$vmeta])* $vname = $val,)*
		}

		impl std::convert::TryFrom<i64> for $name {
			type Error = i64;

			fn try_from( v: i64 ) -> Result<Self, Self::Error> {
				match v {
					$(x if x == Self::$vname as i64 => Ok(Self::$vname),)*
					other => Err(other),
				}
			}
		}

		impl From<$name> for i64 {
			fn from( value: $name ) -> i64 {
				value as i64
			}
		}

		impl rusqlite::types::ToSql for $name {
			fn to_sql( &self ) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
				Ok( rusqlite::types::ToSqlOutput::from( *self as i64 ) )
			}
		}

		impl rusqlite::types::FromSql for $name {
			fn column_result( value: rusqlite::types::ValueRef<'_> ) -> rusqlite::types::FromSqlResult<Self> {
				let raw = value.as_i64()?;
				<Self as std::convert::TryFrom<i64>>::try_from( raw )
					.map_err( rusqlite::types::FromSqlError::OutOfRange )
			}
		}
	}
}

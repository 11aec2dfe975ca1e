use rusqlite::{params, Row};
use serde::Deserialize;

use crate::{
	common::new_id,
	model::Strain,
	persistence::{self, Error, Result}
};



#[derive(Clone, Debug, Deserialize)]
pub struct NewStrain {
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub effects: String,
	#[serde(default)]
	pub flavors: String,
	#[serde(rename = "type", default)]
	pub strain_type: String
}



pub(crate) fn strain_from_row( row: &Row<'_> ) -> rusqlite::Result<Strain> {
	Ok( Strain {
		id: row.get(0)?,
		name: row.get(1)?,
		description: row.get(2)?,
		effects: row.get(3)?,
		flavors: row.get(4)?,
		strain_type: row.get(5)?
	})
}

impl persistence::Handle {

	/// All known strains, by name.
	pub async fn list_strains( &self ) -> Result<Vec<Strain>> {
		Ok( self.with(|con| con.query_all(
			"SELECT id, name, description, effects, flavors, type FROM strains ORDER BY name ASC",
			params![],
			strain_from_row
		)).await? )
	}

	pub async fn create_strain( &self, strain: NewStrain ) -> Result<Strain> {
		if strain.name.trim().is_empty() {
			return Err( Error::Invalid( "a strain needs a name".into() ) );
		}

		let created = Strain {
			id: new_id(),
			name: strain.name,
			description: strain.description,
			effects: strain.effects,
			flavors: strain.flavors,
			strain_type: strain.strain_type
		};
		self.execute("INSERT INTO strains (id, name, description, effects, flavors, type) VALUES (?,?,?,?,?,?)",
			params![created.id, created.name, created.description, created.effects, created.flavors, created.strain_type]
		).await?;

		Ok( created )
	}
}

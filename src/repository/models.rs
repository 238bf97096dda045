//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub id: String,
    pub url: String,
    pub status: String,
    pub document_type: Option<String>,
    pub extracted_data: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub url: &'a str,
    pub status: &'a str,
    pub document_type: Option<&'a str>,
    pub extracted_data: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub translator: Option<String>,
    pub description: Option<String>,
    pub pdf_loc: Option<String>,
    pub cover_img_loc: Option<String>,
    // ISO calendar date (%Y-%m-%d)
    pub published_on: Option<String>,
    pub genre: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reading_progress::Entity")]
    ReadingProgress,
}

impl Related<super::reading_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadingProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A book record as parsed from an ingestion upload, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub translator: Option<String>,
    pub description: Option<String>,
    pub pdf_loc: Option<String>,
    pub cover_img_loc: Option<String>,
    pub published_on: Option<String>,
    pub genre: Option<String>,
}

use crate::auth::hash_password;
use crate::models::{book, user};
use sea_orm::*;

/// Idempotent demo data: an admin, a plain user, and the three classic
/// books that used to be hard-coded in the original catalog.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Accounts
    let admin_password = hash_password("admin").map_err(DbErr::Custom)?;
    let user_password = hash_password("reader").map_err(DbErr::Custom)?;

    let admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        password_hash: Set(admin_password),
        role: Set("admin".to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    let reader = user::ActiveModel {
        username: Set("reader".to_owned()),
        password_hash: Set(user_password),
        role: Set("user".to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    user::Entity::insert(admin)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    user::Entity::insert(reader)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    // 2. Catalog
    let classics = [
        (
            "Moby Dick; Or, The Whale",
            "Herman Melville",
            "A tale of the whale hunt and revenge.",
            "1851-10-18",
            "Fiction",
        ),
        (
            "Pride and Prejudice",
            "Jane Austen",
            "A classic romance novel.",
            "1813-01-28",
            "Romance",
        ),
        (
            "Romeo and Juliet",
            "William Shakespeare",
            "A timeless tragedy of star-crossed lovers.",
            "1597-01-01",
            "Drama",
        ),
    ];

    for (title, author, description, published_on, genre) in classics {
        let record = book::ActiveModel {
            title: Set(title.to_owned()),
            author: Set(author.to_owned()),
            description: Set(Some(description.to_owned())),
            pdf_loc: Set(Some(format!("/static/pdfs/{}.pdf", title))),
            cover_img_loc: Set(Some(format!("/static/images/{}.png", title))),
            published_on: Set(Some(published_on.to_owned())),
            genre: Set(Some(genre.to_owned())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        book::Entity::insert(record)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(book::Column::Title)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    Ok(())
}

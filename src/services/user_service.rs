use chrono::Utc;
use sea_orm::{ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};

use crate::{
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
};

/// Insert the mirror row for an identity subject if it is not there yet.
///
/// A known username is refreshed on every call; an unknown one leaves the row untouched.
pub async fn ensure_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    username: Option<&str>,
) -> AppResult<UserModel> {
    let now = Utc::now();
    let on_conflict = match username {
        Some(_) => OnConflict::column(UserCol::Id)
            .update_columns([UserCol::Username, UserCol::UpdatedAt])
            .to_owned(),
        None => OnConflict::column(UserCol::Id).do_nothing().to_owned(),
    };

    Users::insert(UserActive {
        id: Set(user_id.to_string()),
        username: Set(username.map(str::to_string)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .on_conflict(on_conflict)
    .exec_without_returning(db)
    .await?;

    Users::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {user_id} missing after upsert")))
}

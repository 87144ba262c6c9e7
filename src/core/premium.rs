//! Premium user business logic - Granting, revoking, and looking up premium access.
//!
//! Premium status backs the `premium_only` authorization check. All functions are
//! async and keyed by Discord user ID.

use crate::{
    entities::{PremiumUser, premium_user},
    errors::Result,
};
use chrono::Utc;
use poise::serenity_prelude::UserId;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Returns true if `user_id` currently has premium access.
pub async fn is_premium<C>(db: &C, user_id: UserId) -> Result<bool>
where
    C: ConnectionTrait,
{
    let found = PremiumUser::find()
        .filter(premium_user::Column::UserId.eq(user_id.to_string()))
        .one(db)
        .await?;
    Ok(found.is_some())
}

/// Grants premium access to `user_id`.
///
/// Granting to a user who already has premium returns the existing record
/// unchanged, so the original grant date and granter are preserved.
pub async fn grant_premium(
    db: &DatabaseConnection,
    user_id: UserId,
    granted_by: UserId,
) -> Result<premium_user::Model> {
    if let Some(existing) = PremiumUser::find()
        .filter(premium_user::Column::UserId.eq(user_id.to_string()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let grant = premium_user::ActiveModel {
        user_id: Set(user_id.to_string()),
        granted_by: Set(granted_by.to_string()),
        granted_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let result = grant.insert(db).await?;
    Ok(result)
}

/// Revokes premium access. Returns false if the user did not have premium.
pub async fn revoke_premium(db: &DatabaseConnection, user_id: UserId) -> Result<bool> {
    let result = PremiumUser::delete_many()
        .filter(premium_user::Column::UserId.eq(user_id.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Lists every premium user, oldest grant first.
pub async fn list_premium_users(db: &DatabaseConnection) -> Result<Vec<premium_user::Model>> {
    PremiumUser::find()
        .order_by_asc(premium_user::Column::GrantedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

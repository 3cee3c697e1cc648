use crate::{
    abstract_trait::UserCommandRepositoryTrait,
    config::ConnectionPool,
    domain::requests::{CreateUserRecord, UpdateProfileRequest},
    errors::RepositoryError,
    model::User as UserModel,
};
use async_trait::async_trait;
use tracing::{error, info};

pub struct UserCommandRepository {
    db: ConnectionPool,
}

impl UserCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for UserCommandRepository {
    async fn create_user(&self, record: &CreateUserRecord) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            INSERT INTO users (name, email, phone, password, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, current_timestamp, current_timestamp)
            RETURNING *
            "#,
        )
        .bind(&record.name)
        .bind(record.email.to_lowercase())
        .bind(&record.phone)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to create user {}: {:?}", record.email, err);
            RepositoryError::from_constraint(err, "User with this email or phone")
        })?;

        info!("✅ Created user ID {} ({})", user.user_id, user.email);
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let address = req.address.as_ref();

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                street = COALESCE($4, street),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                pincode = COALESCE($7, pincode),
                updated_at = current_timestamp
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(req.name.as_deref())
        .bind(req.phone.as_deref())
        .bind(address.and_then(|a| a.street.as_deref()))
        .bind(address.and_then(|a| a.city.as_deref()))
        .bind(address.and_then(|a| a.state.as_deref()))
        .bind(address.and_then(|a| a.pincode.as_deref()))
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to update profile of user {}: {:?}", user_id, err);
            RepositoryError::from_constraint(err, "User with this phone")
        })?
        .ok_or(RepositoryError::NotFound)?;

        info!("🔄 Updated profile of user {}", user_id);
        Ok(user)
    }

    async fn set_wishlist(
        &self,
        user_id: i32,
        wishlist: &[i32],
    ) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            UPDATE users
            SET wishlist = $2, updated_at = current_timestamp
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(wishlist)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to update wishlist of user {}: {:?}", user_id, err);
            RepositoryError::from(err)
        })?
        .ok_or(RepositoryError::NotFound)?;

        Ok(user)
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use secrecy::SecretString;
use shophub_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::addresses::CreateAddressRequest,
    entity::{
        categories::{self, ActiveModel as CategoryActive},
        products::{self, ActiveModel as ProductActive, Entity as Products},
    },
    identity::{LocalClaims, SharedSecretIntrospector},
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    let introspector = SharedSecretIntrospector::new(&SecretString::from(SECRET));
    Ok(AppState::new(orm, Arc::new(introspector)))
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn user(sub: &str) -> AuthUser {
    AuthUser {
        user_id: sub.to_string(),
        username: Some(format!("{sub}-name")),
        roles: vec!["user".to_string()],
    }
}

pub fn admin(sub: &str) -> AuthUser {
    AuthUser {
        user_id: sub.to_string(),
        username: None,
        roles: vec!["user".to_string(), "admin".to_string()],
    }
}

pub fn token(sub: &str, roles: &[&str]) -> String {
    LocalClaims::new(
        sub,
        roles.iter().map(|r| r.to_string()).collect(),
        Duration::hours(1),
    )
    .with_username(format!("{sub}-name"))
    .encode(&SecretString::from(SECRET))
    .expect("token")
}

pub async fn seed_category(state: &AppState, slug: &str) -> anyhow::Result<categories::Model> {
    let category = CategoryActive {
        id: Set(Uuid::now_v7()),
        name: Set(slug.to_uppercase()),
        slug: Set(slug.to_string()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category)
}

pub async fn seed_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = ProductActive {
        id: Set(Uuid::now_v7()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        slug: Set(name.to_lowercase().replace(' ', "-")),
        price: Set(price),
        stock: Set(stock),
        image_url: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub fn address() -> CreateAddressRequest {
    CreateAddressRequest {
        line1: "12 Crab Street".into(),
        line2: "Flat 3".into(),
        city: "Lisbon".into(),
        postal_code: "1100-001".into(),
        country: "PT".into(),
    }
}

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::identity::TokenIntrospector;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub identity: Arc<dyn TokenIntrospector>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, identity: Arc<dyn TokenIntrospector>) -> Self {
        Self { orm, identity }
    }
}

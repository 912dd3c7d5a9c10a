use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, db::DB};

#[derive(FromRef, Clone)]
pub struct AppState {
    pub db: DB,
    pub config: Arc<Config>,
}

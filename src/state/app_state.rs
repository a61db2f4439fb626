//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::book_service::BookService;
use crate::config::Config;
use crate::loan_service::LoanService;
use crate::models::PageSize;
use crate::store::LibraryStore;
use crate::user_service::UserService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LibraryStore>,
    pub auth_service: Arc<AuthService>,
    pub loan_service: Arc<LoanService>,
    pub book_service: Arc<BookService>,
    pub user_service: Arc<UserService>,
    pub page_size: PageSize,
}

impl AppState {
    /// Wire every service to one store using the settings in `config`
    pub fn new(store: Arc<dyn LibraryStore>, config: &Config) -> Self {
        let auth_service = AuthService::new(
            store.clone(),
            config.jwt_secret.clone(),
            config.jwt_access_token_ttl_seconds,
            config.jwt_refresh_token_ttl_days,
        );

        Self {
            auth_service: Arc::new(auth_service),
            loan_service: Arc::new(LoanService::new(store.clone())),
            book_service: Arc::new(BookService::new(store.clone())),
            user_service: Arc::new(UserService::new(store.clone(), config.password_hash_cost)),
            page_size: PageSize(config.page_size),
            store,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<BookService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.book_service.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.user_service.clone()
    }
}

impl FromRef<AppState> for PageSize {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.page_size
    }
}

impl FromRef<AppState> for Arc<dyn LibraryStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

//! Business logic services

pub mod catalog;
pub mod email;
pub mod loans;
pub mod tokens;
pub mod users;

use crate::{
    config::{EmailConfig, LoansConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub loans: loans::LoansService,
    pub tokens: tokens::TokenService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        loans_config: LoansConfig,
        email_config: EmailConfig,
        token_service: tokens::TokenService,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            loans: loans::LoansService::new(repository, loans_config),
            tokens: token_service,
            email: email::EmailService::new(email_config),
        }
    }
}

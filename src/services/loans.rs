//! Loan lifecycle service

use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::loan::{Loan, LoanRecord},
    models::user::UserProfile,
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for a user
    pub async fn borrow(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Loan> {
        self.repository
            .loans
            .borrow(user_id, book_id, self.config.max_open)
            .await
    }

    /// Return a borrowed book
    pub async fn give_back(&self, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        self.repository.loans.give_back(user_id, book_id).await
    }

    /// A user's own loan history
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<LoanRecord>> {
        self.repository.loans.list_for_user(user_id).await
    }

    /// Admin view: a target user's loans with their public profile
    pub async fn history_with_profile(
        &self,
        user_id: Uuid,
    ) -> AppResult<(UserProfile, Vec<LoanRecord>)> {
        let profile = self.repository.users.get_profile(user_id).await?;
        let loans = self.repository.loans.list_for_user(user_id).await?;
        Ok((profile, loans))
    }
}

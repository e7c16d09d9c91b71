use async_trait::async_trait;

use super::domain::{AuthResponse, LoginInput, RegisterInput};
use super::errors::AuthError;

/// Remote authority that checks credentials and issues tokens.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn login(&self, input: &LoginInput) -> Result<AuthResponse, AuthError>;
    async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use models::User;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Mutex, PoisonError};

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, (String, User)>>, // key: email -> (password, user)
        scripted: Mutex<VecDeque<Result<AuthResponse, AuthError>>>,
        calls: Mutex<usize>,
    }

    impl MockAuthRepository {
        /// Queue an answer that the next call returns instead of the user table.
        pub fn script(&self, answer: Result<AuthResponse, AuthError>) {
            self.scripted.lock().unwrap_or_else(PoisonError::into_inner).push_back(answer);
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn next_scripted(&self) -> Option<Result<AuthResponse, AuthError>> {
            *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            self.scripted.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
        }

        fn token_for(user: &User) -> String {
            format!("mock-token-{}", user.id)
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn login(&self, input: &LoginInput) -> Result<AuthResponse, AuthError> {
            if let Some(answer) = self.next_scripted() {
                return answer;
            }
            let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
            match users.get(&input.email) {
                Some((password, user)) if *password == input.password => {
                    Ok(AuthResponse::new(Self::token_for(user), user.clone()))
                }
                _ => Err(AuthError::Rejected { status: 401, message: "Invalid credentials".into() }),
            }
        }

        async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, AuthError> {
            if let Some(answer) = self.next_scripted() {
                return answer;
            }
            let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
            if users.contains_key(&input.email) {
                return Err(AuthError::Rejected { status: 409, message: "Email already registered".into() });
            }
            let user = User::new(uuid::Uuid::new_v4().to_string(), input.username.clone(), input.email.clone());
            users.insert(input.email.clone(), (input.password.clone(), user.clone()));
            Ok(AuthResponse::new(Self::token_for(&user), user))
        }
    }
}

//! Request/response shapes of the remote API.

use core::str::FromStr;

use igaku_auth::Role;
use igaku_core::{DomainError, DomainResult, PageRequest, SortOrder, UserId};
use serde::{Deserialize, Serialize};

/// A user as shown on profile and user-list cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Body of `POST /auth/login/`.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/register/`.
#[derive(Clone, Serialize)]
pub struct RegistrationFields {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationFields {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for RegistrationFields {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistrationFields")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields the user list can be ordered by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserOrderField {
    #[default]
    Id,
    Username,
}

impl UserOrderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserOrderField::Id => "id",
            UserOrderField::Username => "username",
        }
    }
}

impl FromStr for UserOrderField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(UserOrderField::Id),
            "username" => Ok(UserOrderField::Username),
            _ => Err(DomainError::validation(
                "invalid order field: must be `id` or `username`",
            )),
        }
    }
}

/// Query of `GET /user/list/`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct UserListQuery {
    pub page: PageRequest,
    pub order_by: UserOrderField,
    pub order_method: SortOrder,
}

impl UserListQuery {
    pub fn new(
        page: u32,
        page_size: u32,
        order_by: UserOrderField,
        order_method: SortOrder,
    ) -> DomainResult<Self> {
        Ok(Self {
            page: PageRequest::new(page, page_size)?,
            order_by,
            order_method,
        })
    }

    /// Query parameters in the names the API expects.
    pub fn to_query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("page", self.page.page().to_string()),
            ("pageSize", self.page.page_size().to_string()),
            ("orderBy", self.order_by.as_str().to_string()),
            ("orderMethod", self.order_method.as_str().to_string()),
        ]
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: self.page.next(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_pairs_match_api_defaults() {
        let pairs = UserListQuery::default().to_query_pairs();
        assert_eq!(
            pairs,
            [
                ("page", "1".to_string()),
                ("pageSize", "10".to_string()),
                ("orderBy", "id".to_string()),
                ("orderMethod", "asc".to_string()),
            ]
        );
    }

    #[test]
    fn query_rejects_invalid_page_size() {
        let err = UserListQuery::new(1, 500, UserOrderField::Username, SortOrder::Desc).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn next_page_keeps_size_and_ordering() {
        let query = UserListQuery::new(2, 25, UserOrderField::Username, SortOrder::Desc).unwrap();
        let next = query.next_page();
        assert_eq!(next.page.page(), 3);
        assert_eq!(next.page.page_size(), 25);
        assert_eq!(next.order_by, UserOrderField::Username);
        assert_eq!(next.order_method, SortOrder::Desc);
    }

    #[test]
    fn order_field_parses_case_insensitively() {
        assert_eq!("USERNAME".parse::<UserOrderField>().unwrap(), UserOrderField::Username);
        assert!("email".parse::<UserOrderField>().is_err());
    }

    #[test]
    fn user_data_accepts_missing_id() {
        let user: UserData =
            serde_json::from_str(r#"{"username":"jdoe","email":"j@doe.io","role":"patient"}"#).unwrap();
        assert_eq!(user.id, None);
        assert_eq!(user.role, Role::PATIENT);
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = LoginCredentials::new("jdoe", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}

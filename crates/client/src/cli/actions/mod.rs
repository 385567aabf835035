use crate::config::ClientConfig;
use crate::types::{LoginCredentials, RegistrationFields, UserListQuery};

// The match over every variant lives in `run` so this module stays small.
mod run;

#[derive(Debug)]
pub enum Action {
    Login {
        config: ClientConfig,
        credentials: LoginCredentials,
    },
    Register {
        config: ClientConfig,
        fields: RegistrationFields,
    },
    Logout {
        config: ClientConfig,
    },
    Profile {
        config: ClientConfig,
    },
    Users {
        config: ClientConfig,
        query: UserListQuery,
    },
    Export {
        config: ClientConfig,
        query: UserListQuery,
    },
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use igaku_core::SortOrder;

use crate::cli::actions::Action;
use crate::config::ClientConfig;
use crate::types::{LoginCredentials, RegistrationFields, UserListQuery, UserOrderField};

/// Map parsed arguments to an [`Action`].
///
/// # Errors
/// Returns an error if the configuration or a list query is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let mut config = ClientConfig::from_env().context("failed to load client configuration")?;
    if let Some(api_url) = matches.get_one::<String>("api-url") {
        config = config.with_api_url(api_url)?;
    }
    if let Some(data_dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(data_dir.clone());
    }

    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login {
            config,
            credentials: LoginCredentials::new(required(sub, "username")?, required(sub, "password")?),
        },
        Some(("register", sub)) => Action::Register {
            config,
            fields: RegistrationFields::new(
                required(sub, "username")?,
                required(sub, "email")?,
                required(sub, "password")?,
            ),
        },
        Some(("logout", _)) => Action::Logout { config },
        Some(("profile", _)) => Action::Profile { config },
        Some(("users", sub)) => Action::Users {
            config,
            query: list_query(sub)?,
        },
        Some(("export", sub)) => Action::Export {
            config,
            query: list_query(sub)?,
        },
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("missing command"),
    };

    Ok(action)
}

fn required(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: {id}"))
}

fn list_query(matches: &clap::ArgMatches) -> Result<UserListQuery> {
    let page = matches.get_one::<u32>("page").copied().unwrap_or(igaku_core::DEFAULT_PAGE);
    let page_size = matches
        .get_one::<u32>("page-size")
        .copied()
        .unwrap_or(igaku_core::DEFAULT_PAGE_SIZE);
    let order_by = match matches.get_one::<String>("order-by") {
        Some(raw) => raw.parse::<UserOrderField>()?,
        None => UserOrderField::default(),
    };
    let order_method = match matches.get_one::<String>("order-method") {
        Some(raw) => raw.parse::<SortOrder>()?,
        None => SortOrder::default(),
    };

    Ok(UserListQuery::new(page, page_size, order_by, order_method)?)
}

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use igaku_auth::{FileCredentialStore, Navigator, RouteGuard, SessionContext, Surface};

use crate::api::ApiClient;
use crate::cache::ProfileSnapshotCache;
use crate::cli::actions::Action;
use crate::config::ClientConfig;
use crate::views::{
    AppContext, LoginView, ProfileSource, ProfileView, RegisterView, UsersView, ViewOutcome,
};

/// Navigator of a one-shot process: there is no next surface to show, so a
/// redirect is only logged and turned into an error by [`finish`].
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, path: &str) {
        tracing::debug!(path, "redirect requested");
    }
}

async fn context(config: &ClientConfig) -> Result<AppContext> {
    let session = SessionContext::new(Arc::new(FileCredentialStore::new(config.data_dir())));
    let guard = RouteGuard::new(session, Arc::new(TerminalNavigator));
    let api = ApiClient::new(config)?;
    let cache = ProfileSnapshotCache::open(&config.cache_db_path()).await?;

    Ok(AppContext::new(guard, api).with_cache(cache))
}

fn finish<T>(outcome: ViewOutcome<T>) -> Result<T> {
    match outcome {
        ViewOutcome::Ready(value) => Ok(value),
        ViewOutcome::Redirected(Surface::Login) => {
            bail!("not signed in or session expired; run `igaku login` first")
        }
        ViewOutcome::Redirected(Surface::Home) => {
            bail!("already signed in; run `igaku logout` first")
        }
        ViewOutcome::Redirected(Surface::Unauthorized) => {
            bail!("this command requires the admin role")
        }
        ViewOutcome::Redirected(other) => bail!("redirected to {other}"),
        ViewOutcome::Failed(err) => {
            tracing::debug!(error = %err, "command failed");
            Err(anyhow!(err.user_message()))
        }
        ViewOutcome::Superseded => bail!("request was superseded"),
    }
}

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login {
            config,
            credentials,
        } => {
            let view = LoginView::new(context(&config).await?);
            finish(view.render())?;
            match view.submit(&credentials).await {
                ViewOutcome::Redirected(Surface::Home) => {
                    println!("Signed in as {}", credentials.username);
                    Ok(())
                }
                other => finish(other),
            }
        }
        Action::Register { config, fields } => {
            let view = RegisterView::new(context(&config).await?);
            finish(view.render())?;
            match view.submit(&fields).await {
                ViewOutcome::Redirected(Surface::Home) => {
                    println!("Registered and signed in as {}", fields.username);
                    Ok(())
                }
                other => finish(other),
            }
        }
        Action::Logout { config } => {
            let ctx = context(&config).await?;
            ctx.sign_out().await?;
            println!("Signed out");
            Ok(())
        }
        Action::Profile { config } => {
            let view = ProfileView::new(context(&config).await?);
            let display = finish(view.render().await)?;

            if let ProfileSource::Snapshot { cached_at } = display.source {
                eprintln!("offline: showing profile cached at {}", cached_at.to_rfc3339());
            }
            println!("Username: {}", display.profile.username);
            println!("Email: {}", display.profile.email);
            println!("Role: {}", display.profile.role);
            Ok(())
        }
        Action::Users { config, query } => {
            let view = UsersView::new(context(&config).await?);
            let page = finish(view.render(&query).await)?;

            for user in &page.data {
                println!("{}\t{}\t{}", user.username, user.email, user.role);
            }
            eprintln!(
                "page {} of {} ({} users)",
                page.page, page.total_pages, page.total_count
            );
            if !page.is_last() {
                let next = query.next_page();
                eprintln!(
                    "next: igaku users --page {} --page-size {}",
                    next.page.page(),
                    next.page.page_size()
                );
            }
            Ok(())
        }
        Action::Export { config, query } => {
            let view = UsersView::new(context(&config).await?);
            let csv = finish(view.export(&query).await)?;
            print!("{csv}");
            Ok(())
        }
    }
}

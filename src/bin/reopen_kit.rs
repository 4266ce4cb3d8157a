//! Utility to check whether this machine's remembered visitor still has kit access.
//!
//! Usage: `reopen_kit [--uid <identifier>]`. Without `--uid` the identifier
//! comes from the file-backed slot at `IDENTIFIER_STORE_PATH`.

use cuidarte_leads::attribution::{EntryContext, UID_PARAM};
use cuidarte_leads::config::Config;
use cuidarte_leads::controller::LandingController;
use cuidarte_leads::identifier_store::FileIdentifierStore;
use cuidarte_leads::links;
use cuidarte_leads::record_store::SupabaseRecordStore;
use cuidarte_leads::state_machine::ViewState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn uid_argument() -> anyhow::Result<Option<String>> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(None),
        (Some("--uid"), Some(uid)) => Ok(Some(uid)),
        _ => anyhow::bail!("usage: reopen_kit [--uid <identifier>]"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuidarte_leads=info,reopen_kit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let entry_url = match uid_argument()? {
        Some(uid) => {
            let mut url = url::Url::parse(&config.public_base_url)?;
            url.query_pairs_mut().append_pair(UID_PARAM, &uid);
            url.to_string()
        }
        None => config.public_base_url.clone(),
    };
    let entry = EntryContext::detect(&entry_url, None)?;

    let store = SupabaseRecordStore::new(&config)?;
    let identifiers = FileIdentifierStore::new(&config.identifier_store_path);
    let mut controller = LandingController::new(Arc::new(store), Arc::new(identifiers));

    match controller.start(&entry).await.clone() {
        ViewState::GatedKit { lead_id } => {
            tracing::info!("✓ Access confirmed for lead {}", lead_id);
            tracing::info!(
                "Personal link: {}",
                links::magic_link(&config.public_base_url, &lead_id)?
            );
        }
        ViewState::IdleWithError { message } => {
            tracing::warn!("Access link rejected: {}", message);
        }
        state => {
            tracing::info!("No verified access (view: {})", state.name());
        }
    }

    Ok(())
}

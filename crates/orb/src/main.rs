use std::sync::Arc;

use orb_core::{
    chat::ChatService,
    config::Config,
    context::ContextWindow,
    ports::{CompletionClient, ProfileStore},
    profiles::ProfileService,
    quota::QuotaTracker,
};
use orb_openrouter::OpenRouterClient;
use orb_store::SupabaseStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orb_core::logging::init("orb");

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn ProfileStore> = Arc::new(SupabaseStore::new(
        cfg.supabase_url.clone(),
        cfg.supabase_service_role_key.clone(),
        cfg.store_timeout,
    ));
    let completion: Arc<dyn CompletionClient> = Arc::new(OpenRouterClient::new(
        cfg.openrouter_api_key.clone(),
        cfg.completion_timeout,
    ));

    let profiles = Arc::new(ProfileService::new(store.clone()));
    let quota = Arc::new(QuotaTracker::new(profiles.clone(), store.clone()));
    let context = Arc::new(ContextWindow::new(store, cfg.context_size));
    let chat = Arc::new(ChatService::new(profiles, quota, context, completion));

    orb_telegram::router::run_polling(cfg, chat).await
}

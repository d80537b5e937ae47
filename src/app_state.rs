use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    account::AccountService,
    api_client::{ApiClient, ApiError},
    assets::AssetService,
    catalog::CatalogService,
    dashboard::Dashboard,
    events::{ClientEvent, EventBus},
    poller::JobPoller,
    rerun::RerunWorkflow,
    session::Session,
    submission::SubmissionWorkflow,
    support::SupportService,
};

/// Fully wired client: one session, one event bus, one job poller, and the
/// workflows built on top of them.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub events: EventBus,
    pub api: Arc<ApiClient>,
    pub catalog: Arc<CatalogService>,
    pub dashboard: Arc<Dashboard>,
    pub poller: Arc<JobPoller>,
    pub submission: Arc<SubmissionWorkflow>,
    pub rerun: Arc<RerunWorkflow>,
    pub assets: Arc<AssetService>,
    pub account: Arc<AccountService>,
    pub support: Arc<SupportService>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let session = Arc::new(match &config.token {
            Some(token) => Session::with_credential(token.clone()),
            None => Session::new(),
        });
        let events = EventBus::new();
        let api = Arc::new(ApiClient::new(
            &config.api_base_url,
            config.request_timeout(),
            session.clone(),
        )?);

        let dashboard = Arc::new(Dashboard::new(
            api.clone(),
            events.clone(),
            config.require_login,
        ));
        let poller = Arc::new(JobPoller::new(
            api.clone(),
            events.clone(),
            dashboard.clone(),
            config.poll_policy(),
        ));

        Ok(Self {
            catalog: Arc::new(CatalogService::new(api.clone())),
            submission: Arc::new(SubmissionWorkflow::new(
                api.clone(),
                events.clone(),
                dashboard.clone(),
                poller.clone(),
                config.require_login,
            )),
            rerun: Arc::new(RerunWorkflow::new(
                api.clone(),
                events.clone(),
                dashboard.clone(),
                poller.clone(),
            )),
            assets: Arc::new(AssetService::new(api.clone())),
            account: Arc::new(AccountService::new(
                api.clone(),
                events.clone(),
                dashboard.clone(),
                poller.clone(),
            )),
            support: Arc::new(SupportService::new(
                api.clone(),
                events.clone(),
                dashboard.clone(),
                config.require_login,
            )),
            session,
            events,
            api,
            dashboard,
            poller,
        })
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Stop background polling. The session itself is kept.
    pub fn shutdown(&self) {
        self.poller.stop();
    }
}

use std::sync::Arc;

use crate::api::request::RequestSchema;
use crate::config::Config;
use crate::db::case::CaseRepository;
use crate::reanalysis::Reanalysis;
use crate::remote::session::RemoteConnector;

/// Built once at startup and cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cases: Arc<dyn CaseRepository>,
    pub connector: Arc<dyn RemoteConnector>,
    pub schema: Arc<RequestSchema>,
}

impl AppState {
    pub fn new(
        config: Config,
        cases: impl CaseRepository + 'static,
        connector: impl RemoteConnector + 'static,
    ) -> anyhow::Result<AppState> {
        Ok(AppState {
            config: Arc::new(config),
            cases: Arc::new(cases),
            connector: Arc::new(connector),
            schema: Arc::new(RequestSchema::load()?),
        })
    }

    pub fn reanalysis(&self) -> Reanalysis<'_> {
        Reanalysis {
            config: self.config.as_ref(),
            cases: self.cases.as_ref(),
            connector: self.connector.as_ref(),
        }
    }
}

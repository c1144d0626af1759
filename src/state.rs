use std::sync::Arc;

use crate::assets::Assets;
use crate::config::Config;
use crate::inquiry::SubmissionStore;
use crate::sessions::SessionRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SubmissionStore>,
    pub sessions: SessionRegistry,
    pub assets: Assets,
}

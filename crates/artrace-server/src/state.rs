use std::sync::Arc;

use artrace_core::config::Config;
use artrace_store::AccountStore;

use crate::access::AccessControl;
use crate::mailer::Mailer;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub config: Arc<Config>,
    pub access: AccessControl,
    pub mailer: Option<Mailer>,
    /// HS256 key for session cookies, generated into the settings table
    /// on first boot and stable across restarts.
    pub jwt_secret: String,
}

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::mail::Mailer;
use crate::services::payments::{CardGateway, RedirectGateway};
use crate::services::settings::SettingsHandle;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub settings: SettingsHandle,
    pub cards: Box<dyn CardGateway>,
    pub redirects: Box<dyn RedirectGateway>,
    pub mailer: Box<dyn Mailer>,
}

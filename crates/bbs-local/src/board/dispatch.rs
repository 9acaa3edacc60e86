use super::jbbs::JbbsPlugin;
use super::machibbs::MachiBbsPlugin;
use super::shitaraba::ShitarabaPlugin;
use super::type2ch::Type2chPlugin;
use bbs_core::board::BoardType;
use bbs_core::http::HttpBackend;
use bbs_core::plugin::BoardPlugin;
use std::sync::Arc;

/// Picks the `BoardPlugin` implementation for a `BoardType`. One shared
/// `HttpBackend` underlies every variant; only the URL shapes, charsets,
/// and post-submission protocol differ.
pub struct BoardPluginRegistry {
    http: Arc<dyn HttpBackend>,
}

impl BoardPluginRegistry {
    pub fn new(http: Arc<dyn HttpBackend>) -> Self {
        Self { http }
    }

    pub fn plugin_for(&self, board_type: BoardType) -> Box<dyn BoardPlugin> {
        match board_type {
            BoardType::TwoCh => Box::new(Type2chPlugin::new(self.http.clone())),
            BoardType::MachiBBS => Box::new(MachiBbsPlugin::new(self.http.clone())),
            BoardType::Shitaraba => Box::new(ShitarabaPlugin::new(self.http.clone())),
            BoardType::Jbbs => Box::new(JbbsPlugin::new(self.http.clone())),
        }
    }
}

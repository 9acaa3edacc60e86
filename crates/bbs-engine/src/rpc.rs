//! Typed request/response surface the renderer UI collaborator dispatches
//! into (§6). Each variant of [`Request`] names an RPC channel; [`Engine::handle`]
//! maps it onto the plain async methods defined in `lib.rs` and wraps the
//! result in the matching [`Response`] variant. This is the seam described
//! in SPEC_FULL §0/§1: "Callback/event-driven UI boundary → typed RPC map."
//!
//! `PostParams` is the one payload that crosses the trust boundary
//! unvalidated from the UI's perspective; [`Engine::post`] re-validates it,
//! so `Request::Post` does not need to duplicate that check here.

use serde::{Deserialize, Serialize};

use bbs_core::auth::AuthState;
use bbs_core::board::Board;
use bbs_core::cookie::StoredCookie;
use bbs_core::favorites::{FavNode, ReorderPosition};
use bbs_core::history::{BrowsingHistoryEntry, PostHistoryEntry};
use bbs_core::ng::NgRule;
use bbs_core::plugin::{DatFetchResult, SubjectFetchResult};
use bbs_core::post::{PostParams, PostResult};
use bbs_core::proxy::ProxyConfig;
use bbs_core::thread::ThreadIndex;
use bbs_core::{BbsMenu, Result};

use bbs_local::round_scheduler::RoundConfig;
use bbs_local::util::masked_log::LogEntry;

use crate::session::TabList;
use crate::{Engine, SearchHit, ThreadIndexPatch};

/// One RPC channel invocation. Mirrors the table in spec.md §6; channels
/// with no meaningful request payload carry a unit struct variant instead
/// of `()` so a wire encoding (JSON tag) stays self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum Request {
    #[serde(rename = "bbs:fetch-menu")]
    FetchMenu,
    #[serde(rename = "bbs:fetch-subject")]
    FetchSubject { board_url: String },
    #[serde(rename = "bbs:fetch-dat")]
    FetchDat { board_url: String, thread_id: String },
    #[serde(rename = "bbs:post")]
    Post(PostParams),
    #[serde(rename = "bbs:get-thread-index")]
    GetThreadIndex { board_url: String },
    #[serde(rename = "bbs:update-thread-index")]
    UpdateThreadIndex { board_url: String, thread_id: String, patch: ThreadIndexPatch },
    #[serde(rename = "bbs:add-external-board")]
    AddExternalBoard { board: Board },

    #[serde(rename = "cookie:set")]
    CookieSet { cookie: StoredCookie },
    #[serde(rename = "cookie:remove")]
    CookieRemove { domain: String, path: String, name: String },
    #[serde(rename = "cookie:matching")]
    CookieMatching { host: String, path: String },
    #[serde(rename = "cookie:persist")]
    CookiePersist,

    #[serde(rename = "auth:state")]
    AuthState,
    #[serde(rename = "auth:uplift-login")]
    UpliftLogin { user: String, password: String, user_agent_tag: String },
    #[serde(rename = "auth:uplift-logout")]
    UpliftLogout,
    #[serde(rename = "auth:be-login")]
    BeLogin { mail: String, pass: String },
    #[serde(rename = "auth:be-logout")]
    BeLogout,
    #[serde(rename = "auth:donguri-refresh")]
    DonguriRefresh,
    #[serde(rename = "auth:donguri-login")]
    DonguriLogin { mail: String, pass: String },

    #[serde(rename = "round:config")]
    RoundConfigGet,
    #[serde(rename = "round:configure")]
    RoundConfigure { enabled: bool, interval_minutes: u32 },
    #[serde(rename = "round:execute")]
    RoundExecute,
    #[serde(rename = "round:set-targets")]
    RoundSetTargets { board_urls: Vec<String>, threads: Vec<(String, String)> },

    #[serde(rename = "proxy:get")]
    ProxyGet,
    #[serde(rename = "proxy:set")]
    ProxySet { config: ProxyConfig },

    #[serde(rename = "ng:list")]
    NgList,
    #[serde(rename = "ng:add")]
    NgAdd { rule: NgRule },
    #[serde(rename = "ng:remove")]
    NgRemove { id: String },

    #[serde(rename = "fav:list")]
    FavList,
    #[serde(rename = "fav:add")]
    FavAdd { node: FavNode },
    #[serde(rename = "fav:remove")]
    FavRemove { id: String },
    #[serde(rename = "fav:move-to-folder")]
    FavMoveToFolder { node_id: String, folder_id: String },
    #[serde(rename = "fav:reorder")]
    FavReorder { drag_id: String, drop_id: String, position: ReorderPosition },

    #[serde(rename = "history:add-browsing")]
    HistoryAddBrowsing { board_url: String, thread_id: String, title: String },
    #[serde(rename = "history:list-browsing")]
    HistoryListBrowsing,
    #[serde(rename = "history:list-post")]
    HistoryListPost,

    #[serde(rename = "search:local")]
    SearchLocal { board_url: String, query: String },
    #[serde(rename = "search:local-all")]
    SearchLocalAll { query: String },

    #[serde(rename = "image:save")]
    ImageSave { url: String },
    #[serde(rename = "image:save-bulk")]
    ImageSaveBulk { urls: Vec<String> },

    #[serde(rename = "diag:add-log")]
    DiagAddLog { level: bbs_local::util::masked_log::LogLevel, tag: String, message: String },
    #[serde(rename = "diag:get-logs")]
    DiagGetLogs,
    #[serde(rename = "diag:clear-logs")]
    DiagClearLogs,

    /// Synchronous save-on-exit channel (§6, §10).
    #[serde(rename = "session:save-tab-list")]
    SaveTabList { tabs: TabList },
    #[serde(rename = "session:save-session")]
    SaveSession { session: serde_json::Value },
    #[serde(rename = "session:load-tab-list")]
    LoadTabList,
    #[serde(rename = "session:load-session")]
    LoadSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Response {
    Menu(BbsMenu),
    Subject(SubjectFetchResult),
    Dat(DatFetchResult),
    Post(PostResult),
    ThreadIndexList(Vec<ThreadIndex>),
    Cookies(Vec<StoredCookie>),
    Auth(AuthState),
    Round(RoundConfig),
    Proxy(ProxyConfig),
    NgRules(Vec<NgRule>),
    Favorites(Vec<FavNode>),
    BrowsingHistory(Vec<BrowsingHistoryEntry>),
    PostHistory(Vec<PostHistoryEntry>),
    SearchHits(Vec<SearchHit>),
    ImagePath(std::path::PathBuf),
    ImagePaths(Vec<std::result::Result<std::path::PathBuf, String>>),
    Logs(Vec<LogEntry>),
    TabList(TabList),
    Session(serde_json::Value),
    Removed(bool),
    Unit,
}

impl Engine {
    /// Dispatches one [`Request`] and returns the matching [`Response`].
    /// This is the single seam a transport (stdio, an in-process channel,
    /// an IPC bridge to the renderer) adapts to; it performs no I/O of its
    /// own beyond what the called `Engine` method already does.
    pub async fn handle(&self, request: Request) -> Result<Response> {
        use bbs_local::util::masked_log::LogLevel;

        Ok(match request {
            Request::FetchMenu => Response::Menu(self.fetch_menu().await),
            Request::FetchSubject { board_url } => Response::Subject(self.fetch_subject(&board_url).await?),
            Request::FetchDat { board_url, thread_id } => Response::Dat(self.fetch_dat(&board_url, &thread_id).await?),
            Request::Post(params) => Response::Post(self.post(params).await?),
            Request::GetThreadIndex { board_url } => Response::ThreadIndexList(self.get_thread_index(&board_url)?),
            Request::UpdateThreadIndex { board_url, thread_id, patch } => {
                self.update_thread_index(&board_url, &thread_id, patch).await?;
                Response::Unit
            }
            Request::AddExternalBoard { board } => {
                self.add_external_board(board).await;
                Response::Unit
            }

            Request::CookieSet { cookie } => {
                self.cookie_set(cookie);
                Response::Unit
            }
            Request::CookieRemove { domain, path, name } => {
                self.cookie_remove(&domain, &path, &name);
                Response::Unit
            }
            Request::CookieMatching { host, path } => Response::Cookies(self.cookie_matching(&host, &path)),
            Request::CookiePersist => {
                self.cookie_persist()?;
                Response::Unit
            }

            Request::AuthState => Response::Auth(self.auth_state().await),
            Request::UpliftLogin { user, password, user_agent_tag } => {
                self.uplift_login(&user, &password, &user_agent_tag).await?;
                Response::Auth(self.auth_state().await)
            }
            Request::UpliftLogout => {
                self.uplift_logout().await;
                Response::Auth(self.auth_state().await)
            }
            Request::BeLogin { mail, pass } => {
                self.be_login(&mail, &pass).await?;
                Response::Auth(self.auth_state().await)
            }
            Request::BeLogout => {
                self.be_logout();
                Response::Auth(self.auth_state().await)
            }
            Request::DonguriRefresh => {
                self.donguri_refresh().await?;
                Response::Auth(self.auth_state().await)
            }
            Request::DonguriLogin { mail, pass } => {
                self.donguri_login(&mail, &pass).await?;
                Response::Auth(self.auth_state().await)
            }

            Request::RoundConfigGet => Response::Round(self.round_config().await),
            Request::RoundConfigure { enabled, interval_minutes } => {
                self.round_configure(enabled, interval_minutes).await;
                Response::Round(self.round_config().await)
            }
            Request::RoundExecute => {
                self.round_execute_now();
                Response::Unit
            }
            Request::RoundSetTargets { board_urls, threads } => {
                self.round_set_targets(board_urls, threads).await?;
                Response::Unit
            }

            Request::ProxyGet => Response::Proxy(self.proxy_config()),
            Request::ProxySet { config } => {
                self.proxy_reconfigure(config)?;
                Response::Proxy(self.proxy_config())
            }

            Request::NgList => Response::NgRules(self.ng_list().await),
            Request::NgAdd { rule } => {
                self.ng_add(rule).await?;
                Response::NgRules(self.ng_list().await)
            }
            Request::NgRemove { id } => Response::Removed(self.ng_remove(&id).await?),

            Request::FavList => Response::Favorites(self.fav_list().await),
            Request::FavAdd { node } => {
                self.fav_add(node).await?;
                Response::Favorites(self.fav_list().await)
            }
            Request::FavRemove { id } => Response::Removed(self.fav_remove(&id).await?),
            Request::FavMoveToFolder { node_id, folder_id } => {
                self.fav_move_to_folder(&node_id, &folder_id).await?;
                Response::Favorites(self.fav_list().await)
            }
            Request::FavReorder { drag_id, drop_id, position } => {
                self.fav_reorder(&drag_id, &drop_id, position).await?;
                Response::Favorites(self.fav_list().await)
            }

            Request::HistoryAddBrowsing { board_url, thread_id, title } => {
                self.history_add_browsing(board_url, thread_id, title).await?;
                Response::Unit
            }
            Request::HistoryListBrowsing => Response::BrowsingHistory(self.history_list_browsing().await),
            Request::HistoryListPost => Response::PostHistory(self.history_list_post().await),

            Request::SearchLocal { board_url, query } => Response::SearchHits(self.search_local(&board_url, &query).await?),
            Request::SearchLocalAll { query } => Response::SearchHits(self.search_local_all(&query).await?),

            Request::ImageSave { url } => Response::ImagePath(self.image_save(&url).await?),
            Request::ImageSaveBulk { urls } => {
                let results = self.image_save_bulk(&urls).await;
                Response::ImagePaths(results.into_iter().map(|r| r.map_err(|e| e.to_string())).collect())
            }

            Request::DiagAddLog { level, tag, message } => {
                self.diag_add_log(level, &tag, &message);
                Response::Unit
            }
            Request::DiagGetLogs => Response::Logs(self.diag_get_logs()),
            Request::DiagClearLogs => {
                self.diag_clear_logs();
                Response::Unit
            }

            Request::SaveTabList { tabs } => {
                self.save_tab_list(&tabs)?;
                Response::Unit
            }
            Request::SaveSession { session } => {
                self.save_session(&session)?;
                Response::Unit
            }
            Request::LoadTabList => Response::TabList(self.load_tab_list()?),
            Request::LoadSession => Response::Session(self.load_session()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::board::BoardType;

    #[tokio::test]
    async fn fetch_menu_channel_round_trips_through_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        let response = engine.handle(Request::FetchMenu).await.unwrap();
        assert!(matches!(response, Response::Menu(m) if m.categories.is_empty()));
    }

    #[tokio::test]
    async fn unknown_board_surfaces_as_validation_error_through_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        let err = engine.handle(Request::FetchSubject { board_url: "https://nope/".to_string() }).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn ng_add_then_list_channel_reflects_the_new_rule() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        let rule = NgRule {
            id: "r1".to_string(),
            target: bbs_core::ng::NgTarget::Body,
            abon_type: bbs_core::ng::AbonType::Normal,
            match_mode: bbs_core::ng::MatchMode::Plain,
            tokens: vec!["spam".to_string()],
            board_id: None,
            thread_id: None,
            enabled: true,
        };
        let response = engine.handle(Request::NgAdd { rule }).await.unwrap();
        match response {
            Response::NgRules(rules) => assert_eq!(rules.len(), 1),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn round_trip_serializes_a_board_request_as_json() {
        let board = Board::new("Test", "https://example.5ch.net/test/", "test", "https://example.5ch.net/", BoardType::TwoCh, None);
        let req = Request::AddExternalBoard { board };
        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Request::AddExternalBoard { .. }));
    }
}

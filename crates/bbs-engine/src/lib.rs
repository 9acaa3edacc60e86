//! Composition root: wires the trait seams `bbs-core` defines to their
//! `bbs-local` implementations, then exposes the operations §6 names as
//! plain async methods on [`Engine`]. `rpc` adapts these into the typed
//! request/response surface; `main` is a CLI shell over the same methods.

pub mod concurrency;
pub mod menu;
pub mod paths;
mod round;
pub mod rpc;
pub mod session;

use bbs_core::auth::{AuthState, BeSession, DonguriState, UpliftSession};
use bbs_core::board::{Board, BoardType};
use bbs_core::cookie::StoredCookie;
use bbs_core::favorites::{FavNode, ReorderPosition};
use bbs_core::history::{BrowsingHistory, BrowsingHistoryEntry, PostHistory};
use bbs_core::ng::NgRule;
use bbs_core::plugin::{DatFetchResult, DatFetchStatus, SubjectFetchResult};
use bbs_core::post::{PostHistoryEntry, PostParams, PostResult, PostResultType};
use bbs_core::proxy::{ProxyConfig, ProxyMode};
use bbs_core::thread::{AgeSage, Res, ThreadIndex};
use bbs_core::{BbsMenu, Error, Result};

use bbs_local::auth::{be::BeAuth, donguri::DonguriAuth, uplift::UpliftAuth};
use bbs_local::board::common::type2ch_oyster_url;
use bbs_local::board::dispatch::BoardPluginRegistry;
use bbs_local::cache::dat_replace::ReplaceRule;
use bbs_local::cache::store::CacheStore;
use bbs_local::codec::{self, Encoding};
use bbs_local::cookie_jar::CookieJar;
use bbs_local::http_client::ReqwestHttpBackend;
use bbs_local::parsers::{dat, ini::IniDocument, round_list};
use bbs_local::proxy::ProxyManager;
use bbs_local::round_scheduler::{RoundConfig, RoundReport, RoundScheduler, RoundTarget};
use bbs_local::samba::SambaGate;
use bbs_local::util::atomic_write::{atomic_write, atomic_write_async};
use bbs_local::util::masked_log::{LogEntry, LogLevel, MaskedLogger};

use bbs_core::http::{HttpBackend, HttpRequest};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex as AsyncMutex;

use concurrency::KeyedLocks;
use paths::AppPaths;
use round::EngineRoundExecutor;
use session::TabList;

/// Real-world 5ch bbsmenu source; used as an unconditional GET, no auth.
const BBSMENU_URL: &str = "https://menu.5ch.net/bbsmenu.html";

pub struct Engine {
    paths: AppPaths,
    logger: Arc<MaskedLogger>,
    http: Arc<dyn HttpBackend>,
    cookies: Arc<CookieJar>,
    proxy: Arc<ProxyManager>,
    plugins: BoardPluginRegistry,
    cache: CacheStore,

    uplift: UpliftAuth,
    be: BeAuth,
    donguri: DonguriAuth,
    auth_uplift: AsyncMutex<UpliftSession>,
    auth_donguri: AsyncMutex<DonguriState>,

    menu: AsyncMutex<BbsMenu>,
    ng_rules: AsyncMutex<Vec<NgRule>>,
    favorites: AsyncMutex<Vec<FavNode>>,
    browsing_history: AsyncMutex<BrowsingHistory>,
    post_history: AsyncMutex<PostHistory>,
    replace_rules: AsyncMutex<Vec<ReplaceRule>>,

    fetch_locks: KeyedLocks<(String, String)>,
    idx_locks: KeyedLocks<String>,

    round: RoundScheduler<EngineRoundExecutor>,
    self_weak: Weak<Engine>,
}

/// `bbsId`-side resumption semantics differ by family (§4.H, §4.G): 5ch and
/// Machi BBS DAT fetches use a true HTTP byte `Range`; JBBS and Shitaraba's
/// `rawmode.cgi` instead resume from a response count, so the cached
/// response count — not the cached byte size — is what their plugins must
/// receive as `range_from`.
fn differential_range_from(board_type: BoardType, byte_range_from: Option<u64>, existing: Option<&ThreadIndex>) -> Option<u64> {
    match board_type {
        BoardType::Jbbs | BoardType::Shitaraba => existing.map(|row| row.all_res_count as u64),
        BoardType::TwoCh | BoardType::MachiBBS => byte_range_from,
    }
}

/// Selects the read-decode and DAT-field-layout pair a board family's
/// `<threadId>.dat` is stored and parsed with (§4.F/§4.G).
fn dat_codec(board_type: BoardType) -> (fn(&[u8]) -> String, fn(&str) -> Vec<Res>) {
    match board_type {
        BoardType::TwoCh => (two_ch_decode, dat::parse_5field),
        BoardType::Shitaraba => (two_ch_decode, dat::parse_7field),
        BoardType::Jbbs => (euc_jp_decode, dat::parse_7field),
        BoardType::MachiBBS => (two_ch_decode, dat::parse_7field),
    }
}

fn two_ch_decode(bytes: &[u8]) -> String {
    codec::decode(bytes, Encoding::ShiftJis)
}

fn euc_jp_decode(bytes: &[u8]) -> String {
    codec::decode(bytes, Encoding::EucJp)
}

fn blank_index_row(existing_rows: &[ThreadIndex], thread_id: &str) -> ThreadIndex {
    ThreadIndex {
        no: existing_rows.len() as u32 + 1,
        file_name: format!("{thread_id}.dat"),
        title: String::new(),
        count: 0,
        size: 0,
        round_date: None,
        last_modified: None,
        kokomade: -1,
        new_receive: false,
        un_read: true,
        scroll_top: 0,
        scroll_res_number: 0,
        scroll_res_offset: 0,
        all_res_count: 0,
        new_res_count: 0,
        age_sage: AgeSage::Unset,
    }
}

fn load_ini_or_default(path: &Path) -> Result<IniDocument> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(bbs_local::parsers::ini::parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IniDocument::default()),
        Err(e) => Err(e.into()),
    }
}

fn read_or_default<T, F>(path: &Path, parse: F) -> Result<T>
where
    T: Default,
    F: FnOnce(&str) -> Result<T>,
{
    match std::fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// One hit from [`Engine::search_local`] / [`Engine::search_local_all`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
    pub board_url: String,
    pub thread_id: String,
    pub number: u32,
    pub snippet: String,
}

fn snippet_of(body: &str, query: &str) -> String {
    const RADIUS: usize = 30;
    let Some(pos) = body.find(query) else {
        return body.chars().take(RADIUS * 2).collect();
    };
    let start = body[..pos].char_indices().rev().nth(RADIUS).map(|(i, _)| i).unwrap_or(0);
    let end_from = pos + query.len();
    let end = body[end_from..].char_indices().nth(RADIUS).map(|(i, _)| end_from + i).unwrap_or(body.len());
    body[start..end].to_string()
}

/// User-editable fields of a cached [`ThreadIndex`] row (§6
/// `bbs:update-thread-index`). Server-derived fields (`count`, `size`,
/// `allResCount`, `lastModified`, …) only ever change through
/// [`Engine::fetch_dat`], never through this patch.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ThreadIndexPatch {
    pub kokomade: Option<i32>,
    pub un_read: Option<bool>,
    pub new_receive: Option<bool>,
    pub scroll_top: Option<i32>,
    pub scroll_res_number: Option<i32>,
    pub scroll_res_offset: Option<i32>,
    pub age_sage: Option<AgeSage>,
}

impl Engine {
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Arc<Self>> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let paths = AppPaths::new(data_dir);
        let logger = Arc::new(MaskedLogger::new());

        let cookies = Arc::new(CookieJar::new());
        let persisted_cookies = read_or_default(&paths.cookies_txt(), bbs_local::cookie_jar::parse_cookies_file)?;
        cookies.load_persisted(persisted_cookies);

        let proxy_doc = load_ini_or_default(&paths.proxy_ini())?;
        let proxy_config = bbs_local::proxy::proxy_config_from_ini(&proxy_doc);
        let proxy = Arc::new(ProxyManager::new(proxy_config)?);

        let http: Arc<dyn HttpBackend> = Arc::new(ReqwestHttpBackend::new(proxy.clone(), cookies.clone()));
        let plugins = BoardPluginRegistry::new(http.clone());
        let cache = CacheStore::new(paths.data_dir());

        let uplift = UpliftAuth::new(http.clone(), cookies.clone());
        let be = BeAuth::new(http.clone(), cookies.clone());
        let donguri = DonguriAuth::new(http.clone(), cookies.clone());

        let menu: BbsMenu = read_or_default(&paths.bbsmenu_json(), |t| serde_json::from_str(t).map_err(|e| Error::Parse(format!("bbsmenu.json: {e}"))))?;
        let ng_rules: Vec<NgRule> = read_or_default(&paths.ng_rules_json(), |t| serde_json::from_str(t).map_err(|e| Error::Parse(format!("ng-rules.json: {e}"))))?;
        let favorites: Vec<FavNode> = read_or_default(&paths.favorites_json(), bbs_local::favorites::load)?;
        let browsing_history = read_or_default(&paths.history_json(), bbs_local::history::load_browsing)?;
        let post_history = read_or_default(&paths.post_history_json(), bbs_local::history::load_post)?;

        let replace_doc = load_ini_or_default(&paths.dat_replace_ini())?;
        let replace_rules = match bbs_local::cache::dat_replace::load(&replace_doc) {
            Ok(rules) => rules,
            Err(e) => {
                logger.log(chrono::Utc::now(), LogLevel::Warn, "dat-replace", format!("ignoring malformed dat-replace.ini: {e}"));
                Vec::new()
            }
        };

        let round_boards = read_or_default(&paths.round_board_2ch(), round_list::parse_board_list)?;
        let round_items = read_or_default(&paths.round_item_2ch(), round_list::parse_item_list)?;
        let mut targets: Vec<RoundTarget> = round_boards.into_iter().map(|board_url| RoundTarget::Board { board_url }).collect();
        targets.extend(round_items.into_iter().map(|i| RoundTarget::Thread { board_url: i.board_url, thread_id: i.thread_id }));

        let logger_for_report = logger.clone();
        let engine = Arc::new_cyclic(|weak: &Weak<Engine>| {
            let executor = Arc::new(EngineRoundExecutor { engine: weak.clone() });
            let round = RoundScheduler::new(executor, logger.clone(), move |report: RoundReport| {
                let logger = logger_for_report.clone();
                tokio::spawn(async move {
                    logger.log(
                        chrono::Utc::now(),
                        LogLevel::Info,
                        "round",
                        format!(
                            "round complete: {} board(s), {} thread(s), {} failure(s)",
                            report.updated_boards.len(),
                            report.updated_threads.len(),
                            report.failures.len()
                        ),
                    );
                });
            });
            Engine {
                paths,
                logger,
                http,
                cookies,
                proxy,
                plugins,
                cache,
                uplift,
                be,
                donguri,
                auth_uplift: AsyncMutex::new(UpliftSession::default()),
                auth_donguri: AsyncMutex::new(DonguriState::default()),
                menu: AsyncMutex::new(menu),
                ng_rules: AsyncMutex::new(ng_rules),
                favorites: AsyncMutex::new(favorites),
                browsing_history: AsyncMutex::new(browsing_history),
                post_history: AsyncMutex::new(post_history),
                replace_rules: AsyncMutex::new(replace_rules),
                fetch_locks: KeyedLocks::new(),
                idx_locks: KeyedLocks::new(),
                round,
                self_weak: weak.clone(),
            }
        });
        engine.round.set_targets(targets).await;
        Ok(engine)
    }

    pub fn logger(&self) -> &Arc<MaskedLogger> {
        &self.logger
    }

    pub fn data_dir(&self) -> &Path {
        self.paths.data_dir()
    }

    async fn find_board(&self, board_url: &str) -> Result<Board> {
        self.menu
            .lock()
            .await
            .find_by_url(board_url)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("unknown board: {board_url}")))
    }

    // ---- bbs:* ----------------------------------------------------------

    /// Returns the cached menu immediately and kicks off a background
    /// refresh that replaces it in place once the remote fetch completes
    /// (§6: "cached-first; background refresh triggered").
    pub async fn fetch_menu(&self) -> BbsMenu {
        let cached = self.menu.lock().await.clone();
        if let Some(engine) = self.self_weak.upgrade() {
            tokio::spawn(async move {
                if let Err(e) = engine.refresh_menu().await {
                    engine.logger.log(chrono::Utc::now(), LogLevel::Warn, "menu", format!("bbsmenu refresh failed: {e}"));
                }
            });
        }
        cached
    }

    async fn refresh_menu(&self) -> Result<()> {
        let req = HttpRequest::get(BBSMENU_URL, ProxyMode::Read);
        let resp = self.http.fetch(&req).await?;
        let text = codec::decode(&resp.body, Encoding::ShiftJis);
        let raw = bbs_local::parsers::bbsmenu::parse(&text);
        let categories = menu::into_categories(raw);

        let mut guard = self.menu.lock().await;
        let parsed = BbsMenu { categories, external: guard.external.clone() };
        if !BbsMenu::should_replace(&guard, &parsed) {
            return Ok(());
        }

        for (old_url, new_url) in menu::detect_transfers(guard.all_boards(), parsed.all_boards()) {
            if let Err(e) = self.cache.transfer_board(&old_url, &new_url) {
                self.logger.log(chrono::Utc::now(), LogLevel::Warn, "menu", format!("board transfer {old_url} -> {new_url} failed: {e}"));
            }
        }

        *guard = parsed;
        let json = serde_json::to_vec_pretty(&*guard).map_err(|e| Error::Parse(e.to_string()))?;
        drop(guard);
        atomic_write_async(self.paths.bbsmenu_json(), json).await
    }

    pub async fn add_external_board(&self, board: Board) {
        self.menu.lock().await.external.push(board);
    }

    pub async fn fetch_subject(&self, board_url: &str) -> Result<SubjectFetchResult> {
        let board = self.find_board(board_url).await?;
        let plugin = self.plugins.plugin_for(board.board_type);
        plugin.fetch_subject(&board).await
    }

    /// Falls back to UPLIFT's `kako` (past-log) mirror when a live-server DAT
    /// fetch fails for a 2ch-family board: the thread may simply have aged
    /// off the live server onto UPLIFT's archive. Returns `None` (letting the
    /// caller surface the original error) whenever no UPLIFT session is
    /// active or the thread id is too short to derive a kako path from.
    async fn fetch_kako_dat(&self, board: &Board, thread_id: &str) -> Option<DatFetchResult> {
        let session_id = self.auth_uplift.lock().await.session_id()?;
        let url = type2ch_oyster_url(board, thread_id, &session_id)?;
        let resp = self.http.fetch(&HttpRequest::get(url, ProxyMode::Read)).await.ok()?;
        if resp.status != 200 {
            return None;
        }
        let text = two_ch_decode(&resp.body);
        Some(DatFetchResult {
            responses: dat::parse_5field(&text),
            last_modified: resp.last_modified,
            status: DatFetchStatus::Full,
            body_len: resp.body.len() as u64,
            raw_body: resp.body,
        })
    }

    /// Coalesces concurrent callers for the same `(boardUrl, threadId)` and
    /// serializes the `Folder.idx` write against every other writer for
    /// `boardUrl` (§5), then applies the fetch and returns the full,
    /// current thread rather than just the bytes this call retrieved.
    pub async fn fetch_dat(&self, board_url: &str, thread_id: &str) -> Result<DatFetchResult> {
        let _coalesce = self.fetch_locks.acquire((board_url.to_string(), thread_id.to_string())).await;
        let board = self.find_board(board_url).await?;
        let plugin = self.plugins.plugin_for(board.board_type);

        let _idx_guard = self.idx_locks.acquire(board_url.to_string()).await;
        let mut rows = self.cache.load_index(board_url)?;
        let existing = rows.iter().find(|r| r.thread_id() == thread_id).cloned();

        let (byte_range_from, if_modified_since) = self.cache.differential_params(board_url, thread_id, existing.as_ref());
        let range_from = differential_range_from(board.board_type, byte_range_from, existing.as_ref());

        let result = match plugin.fetch_dat(&board, thread_id, range_from, if_modified_since.as_deref()).await {
            Ok(result) => result,
            Err(e) if board.board_type == BoardType::TwoCh => match self.fetch_kako_dat(&board, thread_id).await {
                Some(kako) => kako,
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };

        let row = existing.unwrap_or_else(|| blank_index_row(&rows, thread_id));
        let replace_rules = self.replace_rules.lock().await.clone();
        let (decode, parse) = dat_codec(board.board_type);
        let (responses, updated_row, corruption) =
            self.cache.apply_dat_fetch(board_url, thread_id, &result, &replace_rules, decode, parse, row)?;

        if let Some(notice) = &corruption {
            self.logger.log(
                chrono::Utc::now(),
                LogLevel::Warn,
                "cache",
                format!("quarantined corrupt dat for {thread_id} at {}", notice.quarantined_path.display()),
            );
        }

        let last_modified = updated_row.last_modified.clone();
        match rows.iter().position(|r| r.thread_id() == thread_id) {
            Some(pos) => rows[pos] = updated_row,
            None => rows.push(updated_row),
        }
        self.cache.save_index(board_url, &rows)?;

        Ok(DatFetchResult {
            responses,
            last_modified,
            status: result.status,
            body_len: result.body_len,
            raw_body: result.raw_body,
        })
    }

    /// `PostParams` crosses the RPC boundary so it is re-validated here even
    /// though plugins validate again before submission (§6 design note:
    /// untrusted input must never bypass validation by taking a shortcut
    /// path).
    pub async fn post(&self, params: PostParams) -> Result<PostResult> {
        params.validate().map_err(Error::Validation)?;
        let board = self.find_board(&params.board_url).await?;
        let now = chrono::Utc::now();

        let samba_path = self.cache.samba_ini_path(&params.board_url);
        let doc = load_ini_or_default(&samba_path)?;
        let mut gate = SambaGate::new(doc);
        if let Err(e) = gate.check(&board.bbs_id, now) {
            return Ok(PostResult { success: false, result_type: PostResultType::SambaBlocked, message: e.to_string() });
        }

        let plugin = self.plugins.plugin_for(board.board_type);
        let result = plugin.post_response(&params, &board).await?;

        gate.record(&board.bbs_id, now);
        atomic_write(&samba_path, bbs_local::parsers::ini::serialize(&gate.into_ini()).as_bytes())?;

        let mut history = self.post_history.lock().await;
        history.add(PostHistoryEntry {
            board_url: params.board_url.clone(),
            thread_id: params.thread_id.clone(),
            name: params.name.clone(),
            mail: params.mail.clone(),
            message: params.message.clone(),
            posted_at: now,
            result_type: result.result_type,
        });
        let json = bbs_local::history::save_post(&history)?;
        drop(history);
        atomic_write_async(self.paths.post_history_json(), json.into_bytes()).await?;

        Ok(result)
    }

    pub fn get_thread_index(&self, board_url: &str) -> Result<Vec<ThreadIndex>> {
        self.cache.load_index(board_url)
    }

    pub async fn update_thread_index(&self, board_url: &str, thread_id: &str, patch: ThreadIndexPatch) -> Result<()> {
        let _guard = self.idx_locks.acquire(board_url.to_string()).await;
        let mut rows = self.cache.load_index(board_url)?;
        let Some(row) = rows.iter_mut().find(|r| r.thread_id() == thread_id) else {
            return Err(Error::Validation(format!("no cached thread index for {thread_id}")));
        };
        if let Some(v) = patch.kokomade {
            row.kokomade = v;
        }
        if let Some(v) = patch.un_read {
            row.un_read = v;
        }
        if let Some(v) = patch.new_receive {
            row.new_receive = v;
        }
        if let Some(v) = patch.scroll_top {
            row.scroll_top = v;
        }
        if let Some(v) = patch.scroll_res_number {
            row.scroll_res_number = v;
        }
        if let Some(v) = patch.scroll_res_offset {
            row.scroll_res_offset = v;
        }
        if let Some(v) = patch.age_sage {
            row.age_sage = v;
        }
        if !row.check_invariants() {
            return Err(Error::Validation("kokomade must not exceed allResCount".to_string()));
        }
        self.cache.save_index(board_url, &rows)?;
        Ok(())
    }

    // ---- cookie:* ---------------------------------------------------------

    pub fn cookie_set(&self, cookie: StoredCookie) {
        self.cookies.set_cookie(cookie);
    }

    pub fn cookie_remove(&self, domain: &str, path: &str, name: &str) {
        self.cookies.remove_cookie(domain, path, name);
    }

    pub fn cookie_matching(&self, host: &str, path: &str) -> Vec<StoredCookie> {
        self.cookies.matching(host, path, chrono::Utc::now())
    }

    pub fn cookie_persist(&self) -> Result<()> {
        let snapshot = self.cookies.persistable(chrono::Utc::now());
        atomic_write(&self.paths.cookies_txt(), bbs_local::cookie_jar::serialize_cookies(&snapshot).as_bytes())
    }

    // ---- auth:* -------------------------------------------------------------

    pub async fn auth_state(&self) -> AuthState {
        AuthState {
            uplift: self.auth_uplift.lock().await.clone(),
            be: self.be.session(),
            donguri: self.auth_donguri.lock().await.clone(),
        }
    }

    pub async fn uplift_login(&self, user: &str, password: &str, user_agent_tag: &str) -> Result<UpliftSession> {
        let session = self.uplift.login(user, password, user_agent_tag).await?;
        *self.auth_uplift.lock().await = session.clone();
        Ok(session)
    }

    pub async fn uplift_logout(&self) -> UpliftSession {
        let session = self.uplift.logout();
        *self.auth_uplift.lock().await = session.clone();
        session
    }

    pub async fn be_login(&self, mail: &str, pass: &str) -> Result<BeSession> {
        self.be.login(mail, pass).await
    }

    pub fn be_logout(&self) -> BeSession {
        self.be.logout()
    }

    pub async fn donguri_refresh(&self) -> Result<DonguriState> {
        let state = self.donguri.refresh().await?;
        *self.auth_donguri.lock().await = state.clone();
        Ok(state)
    }

    pub async fn donguri_login(&self, mail: &str, pass: &str) -> Result<DonguriState> {
        let state = self.donguri.login(mail, pass).await?;
        *self.auth_donguri.lock().await = state.clone();
        Ok(state)
    }

    // ---- round:* -----------------------------------------------------------

    pub async fn round_config(&self) -> RoundConfig {
        self.round.config().await
    }

    pub async fn round_configure(&self, enabled: bool, interval_minutes: u32) {
        self.round.configure(enabled, interval_minutes).await
    }

    pub fn round_execute_now(&self) {
        self.round.execute_now()
    }

    /// Replaces the full registration list and persists it to
    /// `RoundBoard.2ch`/`RoundItem.2ch` so it survives a restart.
    pub async fn round_set_targets(&self, board_urls: Vec<String>, threads: Vec<(String, String)>) -> Result<()> {
        let mut targets: Vec<RoundTarget> = board_urls.iter().cloned().map(|board_url| RoundTarget::Board { board_url }).collect();
        targets.extend(threads.iter().cloned().map(|(board_url, thread_id)| RoundTarget::Thread { board_url, thread_id }));
        self.round.set_targets(targets).await;

        atomic_write(&self.paths.round_board_2ch(), round_list::serialize_board_list(&board_urls).as_bytes())?;
        let items: Vec<round_list::RoundItemEntry> =
            threads.into_iter().map(|(board_url, thread_id)| round_list::RoundItemEntry { board_url, thread_id }).collect();
        atomic_write(&self.paths.round_item_2ch(), round_list::serialize_item_list(&items).as_bytes())?;
        Ok(())
    }

    // ---- proxy:* -----------------------------------------------------------

    pub fn proxy_config(&self) -> ProxyConfig {
        self.proxy.config()
    }

    pub fn proxy_reconfigure(&self, config: ProxyConfig) -> Result<()> {
        self.proxy.reconfigure(config.clone())?;
        let doc = bbs_local::proxy::proxy_config_to_ini(&config);
        atomic_write(&self.paths.proxy_ini(), bbs_local::parsers::ini::serialize(&doc).as_bytes())
    }

    // ---- ng:* --------------------------------------------------------------

    pub async fn ng_list(&self) -> Vec<NgRule> {
        self.ng_rules.lock().await.clone()
    }

    pub async fn ng_add(&self, rule: NgRule) -> Result<()> {
        let mut rules = self.ng_rules.lock().await;
        rules.push(rule);
        self.persist_ng_rules(&rules)
    }

    pub async fn ng_remove(&self, id: &str) -> Result<bool> {
        let mut rules = self.ng_rules.lock().await;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        let removed = rules.len() != before;
        self.persist_ng_rules(&rules)?;
        Ok(removed)
    }

    fn persist_ng_rules(&self, rules: &[NgRule]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rules).map_err(|e| Error::Parse(e.to_string()))?;
        atomic_write(&self.paths.ng_rules_json(), &json)
    }

    // ---- fav:* -------------------------------------------------------------

    pub async fn fav_list(&self) -> Vec<FavNode> {
        self.favorites.lock().await.clone()
    }

    pub async fn fav_add(&self, node: FavNode) -> Result<()> {
        let mut tree = self.favorites.lock().await;
        bbs_local::favorites::add(&mut tree, node);
        self.persist_favorites(&tree)
    }

    pub async fn fav_remove(&self, id: &str) -> Result<bool> {
        let mut tree = self.favorites.lock().await;
        let removed = bbs_local::favorites::remove(&mut tree, id);
        self.persist_favorites(&tree)?;
        Ok(removed)
    }

    pub async fn fav_move_to_folder(&self, node_id: &str, folder_id: &str) -> Result<()> {
        let mut tree = self.favorites.lock().await;
        bbs_local::favorites::move_to_folder(&mut tree, node_id, folder_id)?;
        self.persist_favorites(&tree)
    }

    pub async fn fav_reorder(&self, drag_id: &str, drop_id: &str, position: ReorderPosition) -> Result<()> {
        let mut tree = self.favorites.lock().await;
        bbs_local::favorites::reorder(&mut tree, drag_id, drop_id, position)?;
        self.persist_favorites(&tree)
    }

    fn persist_favorites(&self, tree: &[FavNode]) -> Result<()> {
        let json = bbs_local::favorites::save(tree)?;
        atomic_write(&self.paths.favorites_json(), json.as_bytes())
    }

    // ---- history:* ---------------------------------------------------------

    pub async fn history_add_browsing(&self, board_url: String, thread_id: String, title: String) -> Result<()> {
        let mut history = self.browsing_history.lock().await;
        history.add(board_url, thread_id, title, chrono::Utc::now());
        let json = bbs_local::history::save_browsing(&history)?;
        atomic_write(&self.paths.history_json(), json.as_bytes())
    }

    pub async fn history_list_browsing(&self) -> Vec<BrowsingHistoryEntry> {
        self.browsing_history.lock().await.entries.clone()
    }

    pub async fn history_list_post(&self) -> Vec<PostHistoryEntry> {
        self.post_history.lock().await.entries.clone()
    }

    // ---- search:local[-all] -------------------------------------------------

    pub async fn search_local(&self, board_url: &str, query: &str) -> Result<Vec<SearchHit>> {
        let board = self.find_board(board_url).await?;
        self.search_board(&board, query)
    }

    pub async fn search_local_all(&self, query: &str) -> Result<Vec<SearchHit>> {
        let boards: Vec<Board> = self.menu.lock().await.all_boards().cloned().collect();
        let mut hits = Vec::new();
        for board in &boards {
            hits.extend(self.search_board(board, query)?);
        }
        Ok(hits)
    }

    fn search_board(&self, board: &Board, query: &str) -> Result<Vec<SearchHit>> {
        let rows = self.cache.load_index(&board.url)?;
        let (decode, parse) = dat_codec(board.board_type);
        let mut hits = Vec::new();
        for row in rows {
            let thread_id = row.thread_id().to_string();
            let path = self.cache.dat_path(&board.url, &thread_id);
            let Ok(bytes) = std::fs::read(&path) else { continue };
            let text = decode(&bytes);
            for res in parse(&text) {
                if res.body.contains(query) || res.name.contains(query) {
                    hits.push(SearchHit {
                        board_url: board.url.clone(),
                        thread_id: thread_id.clone(),
                        number: res.number,
                        snippet: snippet_of(&res.body, query),
                    });
                }
            }
        }
        Ok(hits)
    }

    // ---- image:save[-bulk] --------------------------------------------------

    pub async fn image_save(&self, url: &str) -> Result<PathBuf> {
        let req = HttpRequest::get(url, ProxyMode::Read);
        let resp = self.http.fetch(&req).await?;
        if resp.status != 200 {
            return Err(Error::Network(format!("image fetch failed: status {}", resp.status)));
        }
        let images_dir = self.paths.data_dir().join("images");
        let name = image_file_name(url);
        let path = images_dir.join(name);
        atomic_write_async(path.clone(), resp.body).await?;
        Ok(path)
    }

    pub async fn image_save_bulk(&self, urls: &[String]) -> Vec<Result<PathBuf>> {
        let mut out = Vec::with_capacity(urls.len());
        for url in urls {
            out.push(self.image_save(url).await);
        }
        out
    }

    // ---- diag:* --------------------------------------------------------------

    pub fn diag_add_log(&self, level: LogLevel, tag: &str, message: &str) {
        self.logger.log(chrono::Utc::now(), level, tag, message);
    }

    pub fn diag_get_logs(&self) -> Vec<LogEntry> {
        self.logger.entries()
    }

    pub fn diag_clear_logs(&self) {
        self.logger.clear();
    }

    // ---- save-on-exit channels (§6, §10) ------------------------------------

    /// Synchronous by design (§10): returns only once the write to
    /// `tab.sav` is durable on disk.
    pub fn save_tab_list(&self, tabs: &TabList) -> Result<()> {
        let json = serde_json::to_vec_pretty(tabs).map_err(|e| Error::Parse(e.to_string()))?;
        atomic_write(&self.paths.tab_sav(), &json)
    }

    /// Synchronous by design (§10): the session blob's schema belongs to the
    /// host shell, not this engine, so it is stored and returned opaque.
    pub fn save_session(&self, session: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_vec_pretty(session).map_err(|e| Error::Parse(e.to_string()))?;
        atomic_write(&self.paths.session_json(), &json)
    }

    pub fn load_session(&self) -> Result<serde_json::Value> {
        match std::fs::read_to_string(self.paths.session_json()) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error::Parse(format!("session.json: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Value::Null),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_tab_list(&self) -> Result<TabList> {
        read_or_default(&self.paths.tab_sav(), |t| serde_json::from_str(t).map_err(|e| Error::Parse(format!("tab.sav: {e}"))))
    }
}

/// The last non-empty path segment of `url`, or a fallback name if it has
/// none — the same thing a browser's "save image as" suggests.
fn image_file_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(|s| s.to_string())))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differential_range_from_uses_response_count_for_jbbs_family() {
        let mut row = blank_index_row(&[], "1");
        row.all_res_count = 42;
        assert_eq!(differential_range_from(BoardType::Jbbs, Some(9999), Some(&row)), Some(42));
        assert_eq!(differential_range_from(BoardType::Shitaraba, Some(9999), Some(&row)), Some(42));
    }

    #[test]
    fn differential_range_from_uses_byte_size_for_2ch_family() {
        let mut row = blank_index_row(&[], "1");
        row.all_res_count = 42;
        assert_eq!(differential_range_from(BoardType::TwoCh, Some(9999), Some(&row)), Some(9999));
        assert_eq!(differential_range_from(BoardType::MachiBBS, Some(9999), Some(&row)), Some(9999));
    }

    #[test]
    fn differential_range_from_is_none_with_nothing_cached() {
        assert_eq!(differential_range_from(BoardType::TwoCh, None, None), None);
        assert_eq!(differential_range_from(BoardType::Jbbs, None, None), None);
    }

    #[test]
    fn snippet_of_centers_on_the_match() {
        let body = "a".repeat(50) + "NEEDLE" + &"b".repeat(50);
        let snippet = snippet_of(&body, "NEEDLE");
        assert!(snippet.contains("NEEDLE"));
        assert!(snippet.len() < body.len());
    }

    #[test]
    fn image_file_name_uses_last_path_segment() {
        assert_eq!(image_file_name("https://example.com/a/b/pic.jpg"), "pic.jpg");
        assert_eq!(image_file_name("not a url"), "image");
    }

    #[tokio::test]
    async fn engine_constructs_over_an_empty_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        assert!(engine.fetch_menu().await.categories.is_empty());
        assert!(engine.ng_list().await.is_empty());
        assert!(engine.fav_list().await.is_empty());
    }

    #[tokio::test]
    async fn round_trip_tab_list_and_session_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        let tabs = TabList {
            tabs: vec![session::TabEntry { board_url: "https://a/".to_string(), thread_id: None, title: "t".to_string() }],
        };
        engine.save_tab_list(&tabs).unwrap();
        let loaded = engine.load_tab_list().unwrap();
        assert_eq!(loaded.tabs, tabs.tabs);

        let session = serde_json::json!({"openBoard": "https://a/"});
        engine.save_session(&session).unwrap();
        assert_eq!(engine.load_session().unwrap(), session);
    }

    #[tokio::test]
    async fn update_thread_index_rejects_kokomade_past_all_res_count() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = Engine::new(tmp.path()).await.unwrap();
        let board_url = "https://example.5ch.net/newsplus/";
        let mut rows = vec![blank_index_row(&[], "1")];
        rows[0].all_res_count = 3;
        engine.cache.save_index(board_url, &rows).unwrap();

        let err = engine
            .update_thread_index(board_url, "1", ThreadIndexPatch { kokomade: Some(10), ..Default::default() })
            .await;
        assert!(err.is_err());

        engine
            .update_thread_index(board_url, "1", ThreadIndexPatch { kokomade: Some(2), ..Default::default() })
            .await
            .unwrap();
        let rows = engine.get_thread_index(board_url).unwrap();
        assert_eq!(rows[0].kokomade, 2);
    }
}

//! CLI shell over [`bbs_engine::Engine`] for manual exercise of the backend
//! engine without a renderer UI attached. Every subcommand maps onto one
//! `bbs:*`/`cookie:*`/... RPC channel (`rpc::Request`) and prints the JSON
//! `rpc::Response` to stdout, following the `webpipe-mcp` CLI's own
//! `schema_version`/`ok` envelope convention for machine-readable output.

use anyhow::Result;
use clap::{Parser, Subcommand};

use bbs_core::board::{Board, BoardType};
use bbs_core::post::PostParams;
use bbs_engine::rpc::{Request, Response};
use bbs_engine::Engine;

#[derive(Parser, Debug)]
#[command(name = "bbs-engine")]
#[command(about = "2channel-lineage BBS client backend engine (CLI + RPC dispatch)", long_about = None)]
struct Cli {
    /// App data directory. Defaults to the platform data dir under `bbs-engine`.
    #[arg(long, env = "BBS_ENGINE_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the cached bbsmenu, triggering a background refresh.
    FetchMenu,
    /// Add a board not present in the parsed menu (an "external" board).
    AddBoard(AddBoardCmd),
    /// Fetch a board's subject.txt.
    FetchSubject(BoardCmd),
    /// Fetch (or differentially update) one thread's DAT.
    FetchDat(ThreadCmd),
    /// Read the cached `Folder.idx` rows for a board.
    ThreadIndex(BoardCmd),
    /// Submit a post.
    Post(PostCmd),
    /// Print the current auth state across UPLIFT/Be/Donguri.
    AuthState,
    /// Log in to UPLIFT.
    UpliftLogin(UpliftLoginCmd),
    /// Log in to Be.
    BeLogin(BeLoginCmd),
    /// Print the round-scheduler configuration.
    RoundConfig,
    /// Reconfigure the round scheduler.
    RoundConfigure(RoundConfigureCmd),
    /// Fire one round immediately.
    RoundExecute,
    /// Print the proxy configuration.
    ProxyGet,
    /// Local full-text search across every cached board, or one board.
    Search(SearchCmd),
    /// Print the masked diagnostic log ring buffer.
    DiagLogs,
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct AddBoardCmd {
    #[arg(long)]
    title: String,
    #[arg(long)]
    url: String,
    #[arg(long)]
    bbs_id: String,
    #[arg(long)]
    server_url: String,
    /// One of: 2ch, machi, shitaraba, jbbs.
    #[arg(long, default_value = "2ch")]
    board_type: String,
    #[arg(long)]
    jbbs_dir: Option<String>,
}

#[derive(clap::Args, Debug)]
struct BoardCmd {
    #[arg(long)]
    board_url: String,
}

#[derive(clap::Args, Debug)]
struct ThreadCmd {
    #[arg(long)]
    board_url: String,
    #[arg(long)]
    thread_id: String,
}

#[derive(clap::Args, Debug)]
struct PostCmd {
    #[arg(long)]
    board_url: String,
    /// Digits, or empty to start a new thread.
    #[arg(long, default_value = "")]
    thread_id: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    mail: String,
    #[arg(long)]
    message: String,
    #[arg(long)]
    subject: Option<String>,
}

#[derive(clap::Args, Debug)]
struct UpliftLoginCmd {
    #[arg(long)]
    user: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "bbs-engine")]
    user_agent_tag: String,
}

#[derive(clap::Args, Debug)]
struct BeLoginCmd {
    #[arg(long)]
    mail: String,
    #[arg(long)]
    pass: String,
}

#[derive(clap::Args, Debug)]
struct RoundConfigureCmd {
    #[arg(long, action = clap::ArgAction::Set)]
    enabled: bool,
    #[arg(long)]
    interval_minutes: u32,
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    #[arg(long)]
    board_url: Option<String>,
    #[arg(long)]
    query: String,
}

fn parse_board_type(s: &str) -> anyhow::Result<BoardType> {
    match s {
        "2ch" => Ok(BoardType::TwoCh),
        "machi" => Ok(BoardType::MachiBBS),
        "shitaraba" => Ok(BoardType::Shitaraba),
        "jbbs" => Ok(BoardType::Jbbs),
        other => anyhow::bail!("unknown board type: {other} (expected 2ch, machi, shitaraba, jbbs)"),
    }
}

fn default_data_dir() -> std::path::PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("bbs-engine")
}

fn print_response(response: &Response) -> Result<()> {
    let envelope = serde_json::json!({
        "schema_version": 1,
        "ok": true,
        "response": response,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    if matches!(cli.command, Commands::Version) {
        let v = serde_json::json!({
            "schema_version": 1,
            "kind": "version",
            "ok": true,
            "name": "bbs-engine",
            "version": env!("CARGO_PKG_VERSION"),
        });
        println!("{v}");
        return Ok(());
    }

    let engine = Engine::new(data_dir).await?;

    let request = match cli.command {
        Commands::Version => unreachable!("handled above"),
        Commands::FetchMenu => Request::FetchMenu,
        Commands::AddBoard(args) => {
            let board_type = parse_board_type(&args.board_type)?;
            let board = Board::new(args.title, args.url, args.bbs_id, args.server_url, board_type, args.jbbs_dir);
            Request::AddExternalBoard { board }
        }
        Commands::FetchSubject(args) => Request::FetchSubject { board_url: args.board_url },
        Commands::FetchDat(args) => Request::FetchDat { board_url: args.board_url, thread_id: args.thread_id },
        Commands::ThreadIndex(args) => Request::GetThreadIndex { board_url: args.board_url },
        Commands::Post(args) => Request::Post(PostParams {
            board_url: args.board_url,
            thread_id: args.thread_id,
            name: args.name,
            mail: args.mail,
            message: args.message,
            subject: args.subject,
        }),
        Commands::AuthState => Request::AuthState,
        Commands::UpliftLogin(args) => Request::UpliftLogin { user: args.user, password: args.password, user_agent_tag: args.user_agent_tag },
        Commands::BeLogin(args) => Request::BeLogin { mail: args.mail, pass: args.pass },
        Commands::RoundConfig => Request::RoundConfigGet,
        Commands::RoundConfigure(args) => Request::RoundConfigure { enabled: args.enabled, interval_minutes: args.interval_minutes },
        Commands::RoundExecute => Request::RoundExecute,
        Commands::ProxyGet => Request::ProxyGet,
        Commands::Search(args) => match args.board_url {
            Some(board_url) => Request::SearchLocal { board_url, query: args.query },
            None => Request::SearchLocalAll { query: args.query },
        },
        Commands::DiagLogs => Request::DiagGetLogs,
    };

    match engine.handle(request).await {
        Ok(response) => print_response(&response)?,
        Err(e) => {
            let envelope = serde_json::json!({
                "schema_version": 1,
                "ok": false,
                "error": e.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            std::process::exit(1);
        }
    }
    Ok(())
}

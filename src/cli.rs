use crate::api::SynapsisClient;
use crate::model::ClientConfig;
use crate::ui_controller::UiController;
use crate::view::MessageKind;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "synapsis",
    version,
    about = "Save notes to a Synapsis server, or ask its AI modes, from the terminal"
)]
pub struct Cli {
    /// Base URL of the Synapsis server
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Request timeout (e.g. 90s); requests wait indefinitely when unset
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// File name the server should store submissions under
    #[arg(long)]
    pub filename: Option<String>,

    /// Check that the server is up and exit (no TUI)
    #[arg(long)]
    pub health: bool,

    /// List available modes and exit (no TUI)
    #[arg(long)]
    pub list_modes: bool,

    /// Save TEXT as-is and exit (no TUI); use - to read stdin
    #[arg(long, value_name = "TEXT")]
    pub save: Option<String>,

    /// Ask the AI about TEXT and exit (no TUI); use - to read stdin
    #[arg(long, value_name = "TEXT")]
    pub ask: Option<String>,

    /// Mode to use with --ask (defaults to the server's default mode)
    #[arg(long, value_name = "ID", requires = "ask")]
    pub mode: Option<String>,

    /// Print JSON instead of text (one-shot modes only)
    #[arg(long)]
    pub json: bool,

    /// Log file used while the TUI is running
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// True when a one-shot mode was requested.
    pub fn is_one_shot(&self) -> bool {
        self.health || self.list_modes || self.save.is_some() || self.ask.is_some()
    }

    fn validate(&self) -> Result<()> {
        let modes = [
            self.health,
            self.list_modes,
            self.save.is_some(),
            self.ask.is_some(),
        ]
        .iter()
        .filter(|m| **m)
        .count();
        if modes > 1 {
            anyhow::bail!("--health, --list-modes, --save and --ask are mutually exclusive");
        }
        if self.json && modes == 0 {
            anyhow::bail!("--json can only be used with --health, --list-modes, --save or --ask");
        }
        Ok(())
    }
}

pub async fn run(args: Cli) -> Result<()> {
    args.validate()?;

    if !args.is_one_shot() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            anyhow::bail!(
                "built without TUI support; use --health, --list-modes, --save or --ask"
            );
        }
    }

    run_one_shot(args).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        timeout: args.timeout.map(Into::into),
        user_agent: format!("synapsis-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Resolve `-` to the contents of stdin.
fn read_text_arg(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read content from stdin")?;
    Ok(buf)
}

async fn run_one_shot(args: Cli) -> Result<()> {
    let client = SynapsisClient::new(&build_config(&args)).context("build HTTP client")?;
    let (out_tx, out_handle) = spawn_output_writer();

    let outcome = one_shot(&args, &client, &out_tx).await;

    drop(out_tx);
    let _ = out_handle.await;
    if outcome? {
        std::process::exit(1);
    }
    Ok(())
}

/// Run the requested one-shot mode. Returns true if it ended in an error status.
async fn one_shot(
    args: &Cli,
    client: &SynapsisClient,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<bool> {
    if args.health {
        let status = client
            .health()
            .await
            .with_context(|| format!("health check against {}", args.base_url))?;
        let line = if args.json {
            serde_json::to_string(&serde_json::json!({ "status": status.status }))?
        } else {
            format!("{}: {}", args.base_url, status.status)
        };
        let _ = out_tx.send(OutputLine::Stdout(line));
        return Ok(false);
    }

    let mut ui = UiController::new().with_filename(args.filename.clone());

    if args.list_modes {
        ui.initialize(client).await;
        let lines = crate::text_summary::catalog_lines(&ui, args.json)?;
        return Ok(emit(&ui, lines, out_tx));
    }

    let result = if let Some(text) = args.save.as_deref() {
        ui.set_input(read_text_arg(text)?);
        ui.save_content(client).await
    } else if let Some(text) = args.ask.as_deref() {
        ui.initialize(client).await;
        if ui.catalog().is_none() {
            let lines = crate::text_summary::outcome_lines(&ui, None, args.json)?;
            return Ok(emit(&ui, lines, out_tx));
        }
        if let Some(mode) = args.mode.as_deref() {
            if let Some(catalog) = ui.catalog() {
                if catalog.find(mode).is_none() {
                    let known: Vec<&str> = catalog.modes.iter().map(|m| m.id.as_str()).collect();
                    anyhow::bail!("unknown mode '{mode}' (available: {})", known.join(", "));
                }
            }
            ui.select_mode(mode);
        }
        ui.set_input(read_text_arg(text)?);
        ui.ask_ai(client).await
    } else {
        None
    };

    let lines = crate::text_summary::outcome_lines(&ui, result.as_ref(), args.json)?;
    Ok(emit(&ui, lines, out_tx))
}

/// Print the rendered lines; an error-styled status also goes to stderr.
fn emit(
    ui: &UiController,
    lines: Vec<String>,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> bool {
    for line in lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    match ui.view().message.as_ref() {
        Some(msg) if msg.kind == MessageKind::Error => {
            let _ = out_tx.send(OutputLine::Stderr(format!("Error: {}", msg.text)));
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_server_url, spawn_server};
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    fn server_app() -> Router {
        Router::new()
            .route(
                "/modes",
                get(|| async {
                    Json(json!({
                        "modes": [
                            {"id": "general", "name": "General", "description": "Anything"},
                            {"id": "code", "name": "Code", "description": ""}
                        ],
                        "default_mode": "general"
                    }))
                }),
            )
            .route(
                "/save",
                post(|| async {
                    Json(json!({
                        "success": true,
                        "message": "saved",
                        "filepath": "data/note.md",
                        "git_pushed": true
                    }))
                }),
            )
            .route(
                "/ask-ai",
                post(|Json(body): Json<Value>| async move {
                    let mode = body["mode_id"].as_str().unwrap_or_default().to_string();
                    Json(json!({
                        "success": true,
                        "message": "answered",
                        "ai_response": format!("mode={mode}"),
                        "git_pushed": false
                    }))
                }),
            )
            .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
    }

    struct OneShot {
        failed: Result<bool>,
        stdout: Vec<String>,
        stderr: Vec<String>,
    }

    async fn one_shot_against(base_url: &str, args: &[&str]) -> OneShot {
        let mut full = vec!["--base-url", base_url];
        full.extend_from_slice(args);
        let cli = parse(&full);
        cli.validate().expect("valid flags");
        let client = SynapsisClient::new(&build_config(&cli)).expect("client");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let failed = one_shot(&cli, &client, &tx).await;
        drop(tx);

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        while let Some(line) = rx.recv().await {
            match line {
                OutputLine::Stdout(l) => stdout.push(l),
                OutputLine::Stderr(l) => stderr.push(l),
            }
        }
        OneShot {
            failed,
            stdout,
            stderr,
        }
    }

    fn only_json(lines: &[String]) -> Value {
        assert_eq!(lines.len(), 1, "{lines:?}");
        serde_json::from_str(&lines[0]).expect("stdout is JSON")
    }

    #[tokio::test]
    async fn health_prints_server_status() {
        let url = spawn_server(server_app()).await;

        let out = one_shot_against(&url, &["--health"]).await;
        assert!(!out.failed.unwrap());
        assert_eq!(out.stdout, vec![format!("{url}: ok")]);

        let out = one_shot_against(&url, &["--health", "--json"]).await;
        assert_eq!(only_json(&out.stdout), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn list_modes_marks_the_default() {
        let url = spawn_server(server_app()).await;
        let out = one_shot_against(&url, &["--list-modes"]).await;
        assert!(!out.failed.unwrap());
        assert_eq!(
            out.stdout,
            vec!["* general  General - Anything", "  code     Code"]
        );
    }

    #[tokio::test]
    async fn save_reports_status_and_path() {
        let url = spawn_server(server_app()).await;
        let out = one_shot_against(&url, &["--save", "note"]).await;
        assert!(!out.failed.unwrap());
        assert_eq!(
            out.stdout,
            vec!["saved (Git push成功)", "Saved to: data/note.md"]
        );
        assert!(out.stderr.is_empty());
    }

    #[tokio::test]
    async fn blank_save_fails_without_a_request() {
        let out = one_shot_against(&closed_server_url().await, &["--save", "  "]).await;
        assert!(out.failed.unwrap());
        assert!(out.stdout.is_empty());
        assert_eq!(
            out.stderr,
            vec![format!("Error: {}", crate::messages::CONTENT_REQUIRED)]
        );
    }

    #[tokio::test]
    async fn ask_uses_the_requested_mode() {
        let url = spawn_server(server_app()).await;
        let out = one_shot_against(&url, &["--ask", "q", "--mode", "code", "--json"]).await;
        assert!(!out.failed.unwrap());
        let v = only_json(&out.stdout);
        assert_eq!(v["kind"], "warning");
        assert_eq!(v["message"], "answered");
        assert_eq!(v["ai_response"], "mode=code");
    }

    #[tokio::test]
    async fn ask_rejects_unknown_mode() {
        let url = spawn_server(server_app()).await;
        let out = one_shot_against(&url, &["--ask", "q", "--mode", "nope"]).await;
        let err = out.failed.expect_err("unknown mode must fail");
        assert_eq!(
            err.to_string(),
            "unknown mode 'nope' (available: general, code)"
        );
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_still_prints_json() {
        let url = closed_server_url().await;
        for args in [&["--ask", "q", "--json"][..], &["--list-modes", "--json"][..]] {
            let out = one_shot_against(&url, args).await;
            assert!(out.failed.unwrap(), "{args:?}");
            let v = only_json(&out.stdout);
            assert_eq!(v["kind"], "error");
            assert!(
                v["message"]
                    .as_str()
                    .unwrap()
                    .starts_with(crate::messages::MODES_FAILED),
                "{v}"
            );
            assert_eq!(out.stderr.len(), 1);
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("synapsis").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn defaults_launch_the_tui() {
        let cli = parse(&[]);
        assert_eq!(cli.base_url, "http://127.0.0.1:8000");
        assert!(!cli.is_one_shot());
        assert!(cli.validate().is_ok());
        assert!(build_config(&cli).timeout.is_none());
    }

    #[test]
    fn timeout_is_parsed_as_humantime() {
        let cli = parse(&["--timeout", "90s", "--list-modes"]);
        assert_eq!(
            build_config(&cli).timeout,
            Some(std::time::Duration::from_secs(90))
        );
    }

    #[test]
    fn mode_requires_ask() {
        let err = Cli::try_parse_from(["synapsis", "--mode", "general"]);
        assert!(err.is_err());
        let cli = parse(&["--ask", "hi", "--mode", "general"]);
        assert_eq!(cli.mode.as_deref(), Some("general"));
        assert!(cli.is_one_shot());
    }

    #[test]
    fn one_shot_modes_are_exclusive() {
        let cli = parse(&["--save", "a", "--ask", "b"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn json_needs_a_one_shot_mode() {
        assert!(parse(&["--json"]).validate().is_err());
        assert!(parse(&["--json", "--save", "x"]).validate().is_ok());
    }

    #[test]
    fn literal_text_is_not_read_from_stdin() {
        assert_eq!(read_text_arg("hello").unwrap(), "hello");
    }
}

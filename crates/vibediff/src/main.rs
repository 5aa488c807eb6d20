//! vibediff - compare two texts and merge them hunk by hunk.
//!
//! Subcommands show a side-by-side diff or its hunk list, build a merged
//! text from per-hunk decisions, and manage saved diffs.

mod config;
mod notify;
mod views;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vibediff_core::{
    preview, Choice, DiffEngine, DiffStore, Handoff, MergeSession, ResolutionMode, SavedDiff,
    Side,
};

use crate::config::Config;
use crate::notify::Notifier;
use crate::views::{render_hunk_list, render_side_by_side, ViewOptions};

const DEFAULT_WIDTH: usize = 120;

#[derive(Parser, Debug)]
#[command(
    name = "vibediff",
    version,
    about = "Compare two texts and merge them hunk by hunk"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. "debug" or "vibediff_core=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a side-by-side diff of two files
    Diff { left: PathBuf, right: PathBuf },

    /// List the hunks between two files
    Hunks { left: PathBuf, right: PathBuf },

    /// Resolve hunks and produce merged text
    Merge(MergeArgs),

    /// List saved diffs, newest first
    List {
        /// Only show diffs whose name or merged text contains this
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a saved diff
    Show { name: String },

    /// Delete a saved diff
    Delete { name: String },

    /// Write the merged text of a saved diff to a file
    Export {
        name: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Original file
    #[arg(required_unless_present_any = ["resume", "from_handoff"])]
    left: Option<PathBuf>,

    /// Modified file
    #[arg(required_unless_present_any = ["resume", "from_handoff"])]
    right: Option<PathBuf>,

    /// Continue a saved diff
    #[arg(long, conflicts_with_all = ["left", "right", "from_handoff"])]
    resume: Option<String>,

    /// Continue from a handoff payload file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["left", "right"])]
    from_handoff: Option<PathBuf>,

    /// Resolve a hunk: HUNK=left, HUNK=right, HUNK=both or HUNK=both:right,left
    #[arg(long = "take", value_name = "HUNK=CHOICE", value_parser = parse_take)]
    takes: Vec<(usize, Choice)>,

    /// Take one whole side, ignoring hunks (applied before --take)
    #[arg(long, value_enum)]
    all: Option<SideArg>,

    /// How a decision interacts with earlier ones
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Write merged text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the merge under this name
    #[arg(long)]
    save: Option<String>,

    /// Write a handoff payload to resume this merge elsewhere
    #[arg(long, value_name = "FILE")]
    write_handoff: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Cumulative,
    LatestOnly,
}

impl From<ModeArg> for ResolutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cumulative => ResolutionMode::Cumulative,
            ModeArg::LatestOnly => ResolutionMode::LatestOnly,
        }
    }
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.trim() {
        "left" => Ok(Side::Left),
        "right" => Ok(Side::Right),
        other => Err(format!("unknown side '{other}', expected left or right")),
    }
}

fn parse_take(s: &str) -> Result<(usize, Choice), String> {
    let (index, choice) = s
        .split_once('=')
        .ok_or_else(|| format!("expected HUNK=CHOICE, got '{s}'"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid hunk index '{index}'"))?;

    let choice = match choice.trim() {
        "left" => Choice::Left,
        "right" => Choice::Right,
        "both" => Choice::Both {
            order: vec![Side::Left, Side::Right],
        },
        other => {
            let order = other
                .strip_prefix("both:")
                .ok_or_else(|| format!("unknown choice '{other}'"))?;
            let order = order
                .split(',')
                .map(parse_side)
                .collect::<Result<Vec<_>, _>>()?;
            Choice::both(order).map_err(|e| e.to_string())?
        }
    };
    Ok((index, choice))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.log_level.as_deref(), &config);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(flag: Option<&str>, config: &Config) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env("VIBEDIFF_LOG").unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.as_deref().unwrap_or("warn"))
        }),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let opts = view_options(&config, cli.no_color);
    let notifier = Notifier::new(opts.color);
    let store = DiffStore::new(config.store_path());
    debug!(store = %store.path().display(), "using store");

    match cli.command {
        Commands::Diff { left, right } => cmd_diff(&engine(&config), &left, &right, &opts),
        Commands::Hunks { left, right } => cmd_hunks(&engine(&config), &left, &right, &opts),
        Commands::Merge(args) => cmd_merge(args, &config, &store, &notifier),
        Commands::List { search } => cmd_list(&store, search.as_deref()),
        Commands::Show { name } => cmd_show(&store, &name, &opts),
        Commands::Delete { name } => {
            store
                .delete(&name)
                .with_context(|| format!("failed to delete \"{name}\""))?;
            notifier.info(&format!("deleted \"{name}\""));
            Ok(())
        }
        Commands::Export { name, dir } => {
            let diff = store.get(&name)?;
            let path = store
                .export(&diff, &dir)
                .with_context(|| format!("failed to export \"{name}\""))?;
            notifier.success(&format!("exported \"{name}\" to {}", path.display()));
            Ok(())
        }
    }
}

fn engine(config: &Config) -> DiffEngine {
    match config.diff_timeout() {
        Some(timeout) => DiffEngine::new().with_timeout(timeout),
        None => DiffEngine::new(),
    }
}

fn view_options(config: &Config, no_color: bool) -> ViewOptions {
    let width = crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH);
    ViewOptions {
        width,
        line_numbers: config.view.line_numbers,
        tab_width: config.view.tab_width,
        color: config.view.color && !no_color,
    }
}

fn cmd_diff(engine: &DiffEngine, left: &Path, right: &Path, opts: &ViewOptions) -> Result<()> {
    let diff = engine
        .diff_files(left, right)
        .context("failed to compute diff")?;
    if !diff.result.has_diff() {
        println!("No differences.");
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    for line in render_side_by_side(&diff.result.side_by_side(), opts) {
        writeln!(out, "{line}")?;
    }
    writeln!(
        out,
        "{} hunks, +{} -{}",
        diff.result.hunks().len(),
        diff.result.insertions,
        diff.result.deletions
    )?;
    Ok(())
}

fn cmd_hunks(engine: &DiffEngine, left: &Path, right: &Path, opts: &ViewOptions) -> Result<()> {
    let diff = engine
        .diff_files(left, right)
        .context("failed to compute diff")?;
    let hunks = diff.result.hunks();
    if hunks.is_empty() {
        println!("No differences.");
        return Ok(());
    }

    for line in render_hunk_list(&hunks, &Default::default(), opts) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs, config: &Config, store: &DiffStore, notifier: &Notifier) -> Result<()> {
    let mode = args.mode.map(Into::into).unwrap_or(config.merge.mode);
    let mut session = open_session(&args, config, store, mode)?;

    if let Some(side) = args.all {
        notifier.outcome(&session.accept_all(side.into()));
    }
    for (index, choice) in args.takes {
        let outcome = session
            .accept(index, choice)
            .with_context(|| format!("cannot resolve hunk {index}"))?;
        notifier.outcome(&outcome);
    }

    let unresolved = session.hunk_count() - session.resolved_hunks();
    if unresolved > 0 {
        notifier.info(&format!("{unresolved} hunks left at their right-hand content"));
    }
    if session.has_conflicts() {
        notifier.warn("merged text contains conflict markers");
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &session.merged_text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            notifier.success(&format!("merged text written to {}", path.display()));
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(session.merged_text.as_bytes())?;
            out.flush()?;
        }
    }

    if let Some(path) = &args.write_handoff {
        let json = session.to_handoff().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write handoff {}", path.display()))?;
    }

    if let Some(name) = args.save {
        let saved = store
            .save(SavedDiff::from_session(name, &session))
            .context("failed to save diff")?;
        notifier.saved(&saved);
    }
    Ok(())
}

fn open_session(
    args: &MergeArgs,
    config: &Config,
    store: &DiffStore,
    mode: ResolutionMode,
) -> Result<MergeSession> {
    if let Some(name) = &args.resume {
        let saved = store.get(name)?;
        return MergeSession::from_handoff(saved.to_handoff(), mode)
            .with_context(|| format!("saved diff \"{name}\" cannot be resumed"));
    }

    if let Some(path) = &args.from_handoff {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read handoff {}", path.display()))?;
        let handoff = Handoff::from_json(&raw).context("handoff payload rejected")?;
        return Ok(MergeSession::from_handoff(handoff, mode)?);
    }

    let (Some(left), Some(right)) = (&args.left, &args.right) else {
        bail!("merge needs LEFT and RIGHT files, --resume or --from-handoff");
    };
    let diff = engine(config)
        .diff_files(left, right)
        .context("failed to compute diff")?;
    Ok(MergeSession::new(
        diff.old_content,
        diff.new_content,
        diff.result.segments,
        mode,
    ))
}

fn cmd_list(store: &DiffStore, search: Option<&str>) -> Result<()> {
    let diffs = store.search(search.unwrap_or_default())?;
    if diffs.is_empty() {
        println!("No saved diffs.");
        return Ok(());
    }

    for diff in diffs {
        println!("{}  {}", format_date(&diff), diff.name);
        println!("    {}", preview(&diff.merged_text).replace('\n', "⏎"));
    }
    Ok(())
}

fn cmd_show(store: &DiffStore, name: &str, opts: &ViewOptions) -> Result<()> {
    let diff = store.get(name)?;
    let session = MergeSession::from_handoff(diff.to_handoff(), ResolutionMode::Cumulative)
        .with_context(|| format!("saved diff \"{name}\" is incomplete"))?;

    println!("{}  (saved {})", diff.name, format_date(&diff));
    println!(
        "{} hunks, {} resolved{}",
        session.hunk_count(),
        session.resolved_hunks(),
        if session.has_conflicts() { ", has conflict markers" } else { "" }
    );
    for line in render_hunk_list(&session.hunks(), &diff.hunk_selections, opts) {
        println!("{line}");
    }
    println!();
    print!("{}", diff.merged_text);
    Ok(())
}

fn format_date(diff: &SavedDiff) -> String {
    diff.saved_at()
        .map(|at| at.with_timezone(&Local).format("%b %e, %Y %H:%M").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_take() {
        assert_eq!(parse_take("0=left").unwrap(), (0, Choice::Left));
        assert_eq!(parse_take(" 3 = right ").unwrap(), (3, Choice::Right));
        assert_eq!(
            parse_take("1=both").unwrap(),
            (
                1,
                Choice::Both {
                    order: vec![Side::Left, Side::Right]
                }
            )
        );
        assert_eq!(
            parse_take("2=both:right,left").unwrap(),
            (
                2,
                Choice::Both {
                    order: vec![Side::Right, Side::Left]
                }
            )
        );
    }

    #[test]
    fn test_parse_take_errors() {
        assert!(parse_take("left").is_err());
        assert!(parse_take("x=left").is_err());
        assert!(parse_take("0=middle").is_err());
        assert!(parse_take("0=both:left,left").is_err());
        assert!(parse_take("0=both:up").is_err());
    }

    #[test]
    fn test_cli_parses_merge() {
        let cli = Cli::try_parse_from([
            "vibediff", "merge", "a.txt", "b.txt", "--take", "0=left", "--take", "1=both",
            "--save", "demo",
        ])
        .unwrap();
        match cli.command {
            Commands::Merge(args) => {
                assert_eq!(args.takes.len(), 2);
                assert_eq!(args.save.as_deref(), Some("demo"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_resume_needs_no_files() {
        assert!(Cli::try_parse_from(["vibediff", "merge", "--resume", "demo"]).is_ok());
        assert!(Cli::try_parse_from(["vibediff", "merge"]).is_err());
        assert!(
            Cli::try_parse_from(["vibediff", "merge", "a", "b", "--resume", "demo"]).is_err()
        );
    }

    fn merge_in(dir: &Path, extra: &[&str]) -> DiffStore {
        let config = Config::parse(&format!(
            "[store]\npath = {:?}\n",
            dir.join("store.json")
        ))
        .unwrap();
        let store = DiffStore::new(config.store_path());

        let mut argv = vec![
            "vibediff".to_string(),
            "merge".to_string(),
            dir.join("left.txt").display().to_string(),
            dir.join("right.txt").display().to_string(),
            "--output".to_string(),
            dir.join("merged.txt").display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        let Commands::Merge(args) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected merge");
        };
        cmd_merge(args, &config, &store, &Notifier::new(false)).unwrap();
        store
    }

    #[test]
    fn test_merge_with_empty_left_outputs_right() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("left.txt"), "").unwrap();
        std::fs::write(dir.path().join("right.txt"), "abc\n").unwrap();

        let store = merge_in(dir.path(), &["--save", "empty"]);

        let merged = std::fs::read_to_string(dir.path().join("merged.txt")).unwrap();
        assert_eq!(merged, "abc\n");
        assert_eq!(store.get("empty").unwrap().merged_text, "abc\n");
    }

    #[test]
    fn test_merge_all_counts_every_hunk_resolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("left.txt"), "a\nb\nc\nd\n").unwrap();
        std::fs::write(dir.path().join("right.txt"), "a\nx\nc\n").unwrap();

        let store = merge_in(dir.path(), &["--all", "left", "--save", "whole"]);

        let saved = store.get("whole").unwrap();
        let session =
            MergeSession::from_handoff(saved.to_handoff(), ResolutionMode::Cumulative).unwrap();
        assert_eq!(session.hunk_count(), 2);
        assert_eq!(session.resolved_hunks(), 2);
        assert_eq!(session.merged_text, "a\nb\nc\nd\n");
    }

    #[test]
    fn test_merge_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.txt");
        let right = dir.path().join("right.txt");
        let output = dir.path().join("merged.txt");
        std::fs::write(&left, "a\nb\nc\n").unwrap();
        std::fs::write(&right, "a\nx\nc\n").unwrap();

        let config = Config::parse(&format!(
            "[store]\npath = {:?}\n",
            dir.path().join("store.json")
        ))
        .unwrap();
        let store = DiffStore::new(config.store_path());
        let notifier = Notifier::new(false);

        let cli = Cli::try_parse_from([
            "vibediff".into(),
            "merge".into(),
            left.into_os_string(),
            right.into_os_string(),
            "--take".into(),
            "0=both:right,left".into(),
            "--output".into(),
            output.clone().into_os_string(),
            "--save".into(),
            "e2e".into(),
        ])
        .unwrap();
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        cmd_merge(args, &config, &store, &notifier).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "a\nx\nb\nc\n");
        let saved = store.get("e2e").unwrap();
        assert_eq!(saved.merged_text, "a\nx\nb\nc\n");
        assert_eq!(saved.hunk_selections.len(), 1);
    }
}

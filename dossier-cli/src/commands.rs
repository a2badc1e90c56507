//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use dossier_core::DossierError;
use dossier_core::config::{DossierConfig, load_config};
use dossier_core::history::{HistoryEntry, HistoryStore};
use dossier_core::report::{
    Depth, Language, ReportEngine, ReportFormat, ReportObserver, ReportRequest, ReportStage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path, quiet: bool) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            topic,
            lang,
            depth,
            format,
            output,
            open,
        } => {
            let config = load(workspace)?;
            let request = build_request(&topic, lang, depth, format, output)?;
            handle_generate(&config, request, open, quiet).await
        }
        Commands::History => handle_history(&history_store(&load(workspace)?)),
        Commands::Open { index } => handle_open(&history_store(&load(workspace)?), index),
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load(workspace: &Path) -> anyhow::Result<DossierConfig> {
    Ok(load_config(Some(workspace), None).map_err(DossierError::from)?)
}

fn history_store(config: &DossierConfig) -> HistoryStore {
    HistoryStore::with_capacity(config.history.resolved_path(), config.history.capacity)
}

fn build_request(
    topic: &str,
    language: Language,
    depth: Depth,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<ReportRequest> {
    let topic = topic.trim();
    if topic.is_empty() {
        anyhow::bail!("Please enter a topic.");
    }
    let destination = output.unwrap_or_else(|| default_output(topic, format));
    Ok(ReportRequest::new(topic, language, depth, format, destination))
}

/// `<topic>.<ext>` in the current directory, with path separators replaced.
pub fn default_output(topic: &str, format: ReportFormat) -> PathBuf {
    let stem: String = topic
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

/// Prints progress lines; the outcome is printed by the caller.
struct ConsoleObserver {
    quiet: bool,
}

impl ReportObserver for ConsoleObserver {
    fn on_stage(&self, stage: &ReportStage) {
        if !self.quiet {
            eprintln!("  ... {}", stage);
        }
    }

    fn on_completed(&self, _path: &Path) {}

    fn on_failed(&self, _error: &str) {}
}

async fn handle_generate(
    config: &DossierConfig,
    mut request: ReportRequest,
    open_after: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    // History records absolute paths so `dossier open` works from anywhere.
    request.destination = std::path::absolute(&request.destination)?;
    let engine: Arc<ReportEngine> = Arc::new(dossier_tools::build_engine(config)?);
    if !quiet {
        println!(
            "Working on {} ({}, {}, {})...",
            request.topic, request.language, request.format, depth_label(request.depth)
        );
    }

    let observer = Arc::new(ConsoleObserver { quiet });
    let path = engine
        .spawn(request, observer)
        .await
        .map_err(|e| anyhow::anyhow!("Report task failed: {}", e))?
        .map_err(|e| anyhow::anyhow!("Error during export: {}", e))?;

    println!("Report saved: {}", path.display());
    if open_after {
        open_file(&path)?;
    }
    Ok(())
}

fn depth_label(depth: Depth) -> &'static str {
    match depth {
        Depth::Quick => "quick",
        Depth::Normal => "normal",
        Depth::Deep => "deep",
    }
}

/// One history line: `[<date>] <topic>`.
pub fn format_entry(entry: &HistoryEntry) -> String {
    format!("[{}] {}", entry.timestamp, entry.topic)
}

fn handle_history(store: &HistoryStore) -> anyhow::Result<()> {
    let entries = store.load();
    if entries.is_empty() {
        println!("No reports yet.");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{:>3}. {}", i + 1, format_entry(entry));
    }
    Ok(())
}

/// History entry at 1-based `index`, checked to still exist on disk.
pub fn resolve_entry(store: &HistoryStore, index: usize) -> anyhow::Result<HistoryEntry> {
    let entries = store.load();
    let entry = index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .cloned()
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No history entry #{} ({} recorded)",
                index,
                entries.len()
            )
        })?;
    if !Path::new(&entry.file_path).exists() {
        anyhow::bail!("{}: file no longer exists", entry.file_path);
    }
    Ok(entry)
}

fn handle_open(store: &HistoryStore, index: usize) -> anyhow::Result<()> {
    let entry = resolve_entry(store, index)?;
    open_file(Path::new(&entry.file_path))
}

fn open_file(path: &Path) -> anyhow::Result<()> {
    open::that(path).map_err(|e| anyhow::anyhow!("Could not open {}: {}", path.display(), e))
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".dossier");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&DossierConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output("Ancient Rome", ReportFormat::Pdf),
            PathBuf::from("Ancient Rome.pdf")
        );
        assert_eq!(
            default_output("AC/DC: live?", ReportFormat::Docx),
            PathBuf::from("AC_DC_ live_.docx")
        );
    }

    #[test]
    fn test_build_request_rejects_blank_topic() {
        assert!(build_request("   ", Language::It, Depth::Normal, ReportFormat::Pdf, None).is_err());
        let req = build_request(" Rome ", Language::En, Depth::Quick, ReportFormat::Pdf, None)
            .unwrap();
        assert_eq!(req.topic, "Rome");
        assert_eq!(req.destination, PathBuf::from("Rome.pdf"));
    }

    #[test]
    fn test_invalid_workspace_config_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".dossier")).unwrap();
        std::fs::write(
            dir.path().join(".dossier").join("config.toml"),
            "[sources]\nscrape_timeout_secs = \"soon\"\n",
        )
        .unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DossierError>(),
            Some(DossierError::Config(_))
        ));
        assert!(err.to_string().starts_with("Configuration error: "));
    }

    #[test]
    fn test_format_entry() {
        let entry = HistoryEntry {
            topic: "Rome".into(),
            timestamp: "2024-05-01 10:30".into(),
            file_path: "/tmp/Rome.pdf".into(),
        };
        assert_eq!(format_entry(&entry), "[2024-05-01 10:30] Rome");
    }

    #[test]
    fn test_resolve_entry() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let report = dir.path().join("Rome.pdf");
        std::fs::write(&report, b"%PDF").unwrap();
        store.append("Gone", "/definitely/missing.pdf").unwrap();
        store.append("Rome", &report.to_string_lossy()).unwrap();

        assert_eq!(resolve_entry(&store, 1).unwrap().topic, "Rome");
        let err = resolve_entry(&store, 2).unwrap_err();
        assert!(err.to_string().contains("file no longer exists"));
        assert!(resolve_entry(&store, 0).is_err());
        assert!(resolve_entry(&store, 3).is_err());
    }
}

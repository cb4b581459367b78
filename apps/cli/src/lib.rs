//! `cardmark` command line: walks markdown files and writes one JSON note per
//! line.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use cardmark_core::{ExtractSettings, Extractor, Note, Tokenizer};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cardmark")]
#[command(about = "Extract flashcards from markdown notes")]
pub struct Args {
    /// Markdown files or directories to scan
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write notes here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extraction settings as JSON, e.g. '{"incremental_tag":"steps"}'
    #[arg(long)]
    pub settings: Option<String>,

    /// Vault root used for the FilePath field
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// One output line.
#[derive(Debug, Serialize)]
pub struct NoteRecord {
    pub guid: String,
    pub model_id: u64,
    pub model: &'static str,
    /// `(field name, value)` in model order.
    pub fields: Vec<(&'static str, String)>,
    pub tags: Vec<String>,
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        let fields = note
            .model
            .fields()
            .iter()
            .map(|field| field.name())
            .zip(note.fields.iter().cloned())
            .collect();

        Self {
            guid: note.guid(),
            model_id: note.model.id(),
            model: note.model.name(),
            fields,
            tags: note.tags.iter().cloned().collect(),
        }
    }
}

/// Counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub notes: usize,
    pub failed: usize,
}

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            let summary = run_with(&args, &mut out)?;
            out.flush()?;
            summary
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_with(&args, &mut out)?
        }
    };

    tracing::info!(
        files = summary.files,
        notes = summary.notes,
        failed = summary.failed,
        "Extraction finished"
    );
    Ok(())
}

/// Extract every markdown file under `args.paths` into `out`.
///
/// Files that fail to read or extract are logged and counted, not fatal.
pub fn run_with(args: &Args, out: &mut impl Write) -> anyhow::Result<Summary> {
    let settings = match &args.settings {
        Some(json) => serde_json::from_str::<ExtractSettings>(json)
            .context("Failed to parse --settings")?,
        None => ExtractSettings::default(),
    };
    let extractor = Extractor::new(Tokenizer::new(), settings);

    let mut files = Vec::new();
    for path in &args.paths {
        collect_md_files(path, &mut files)?;
    }
    files.sort();
    files.dedup();

    let mut summary = Summary::default();
    for path in &files {
        summary.files += 1;
        let file_path = file_path_context(path, args.root.as_deref());

        match extract_file(&extractor, path, &file_path) {
            Ok(notes) => {
                for note in &notes {
                    serde_json::to_writer(&mut *out, &NoteRecord::from(note))?;
                    out.write_all(b"\n")?;
                }
                tracing::debug!(file = %file_path, notes = notes.len(), "Extracted file");
                summary.notes += notes.len();
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), "Skipping file: {:#}", e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn extract_file(extractor: &Extractor, path: &Path, file_path: &str) -> anyhow::Result<Vec<Note>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(extractor.extract_notes(text, file_path)?)
}

/// Collect `.md` files under `path`; a file path is taken as given.
fn collect_md_files(path: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    if path.is_dir() {
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
        {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                collect_md_files(&entry_path, files)?;
            } else if is_markdown(&entry_path) {
                files.push(entry_path);
            }
        }
    } else {
        files.push(path.to_path_buf());
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension().map(|e| e == "md").unwrap_or(false)
}

/// Path relative to `root`, or the bare file name outside it.
fn file_path_context(path: &Path, root: Option<&Path>) -> String {
    if let Some(relative) = root.and_then(|root| path.strip_prefix(root).ok()) {
        return relative.to_string_lossy().to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn args(dir: &TempDir) -> Args {
        Args {
            paths: vec![dir.path().to_path_buf()],
            output: None,
            settings: None,
            root: Some(dir.path().to_path_buf()),
        }
    }

    fn records(output: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_collects_markdown_recursively_sorted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.md", "");
        write(&dir, "a/inner.md", "");
        write(&dir, "notes.txt", "");

        let mut files = Vec::new();
        collect_md_files(dir.path(), &mut files).unwrap();
        files.sort();

        let names: Vec<String> = files
            .iter()
            .map(|path| file_path_context(path, Some(dir.path())))
            .collect();
        assert_eq!(names, vec!["a/inner.md", "b.md"]);
    }

    #[test]
    fn test_file_path_falls_back_to_file_name() {
        let path = Path::new("/elsewhere/deck/file.md");
        assert_eq!(file_path_context(path, Some(Path::new("/vault"))), "file.md");
        assert_eq!(file_path_context(path, None), "file.md");
    }

    #[test]
    fn test_writes_one_record_per_note() {
        let dir = TempDir::new().unwrap();
        write(&dir, "geo.md", "- Capital of France ==> Paris\n- Capital of Spain ==> Madrid\n");

        let mut out = Vec::new();
        let summary = run_with(&args(&dir), &mut out).unwrap();
        assert_eq!(
            summary,
            Summary {
                files: 1,
                notes: 2,
                failed: 0
            }
        );

        let records = records(&out);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["model"], "Cloze with Context");
        assert_eq!(records[0]["model_id"], 1874134125u64);
        assert_eq!(records[0]["fields"][0][0], "FilePath");
        assert_eq!(records[0]["fields"][0][1], "geo.md");
        assert_eq!(records[0]["guid"].as_str().unwrap().len(), 16);
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "---\ntags: [card]\n---\nno separator\n");
        write(&dir, "b.md", "Text with ~~a cloze~~.\n");

        let mut out = Vec::new();
        let summary = run_with(&args(&dir), &mut out).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.notes, 1);
        assert_eq!(records(&out)[0]["fields"][0][1], "b.md");
    }

    #[test]
    fn test_settings_override_tags() {
        let dir = TempDir::new().unwrap();
        write(&dir, "steps.md", "- Order ==> #steps\n  - one\n  - two\n");

        let mut args = args(&dir);
        args.settings = Some(r#"{"incremental_tag":"steps"}"#.to_string());

        let mut out = Vec::new();
        run_with(&args, &mut out).unwrap();
        let text = records(&out)[0]["fields"][2][1].as_str().unwrap().to_string();
        assert!(text.contains("{{c2:: two }}"));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir);
        args.settings = Some("not json".to_string());
        assert!(run_with(&args, &mut Vec::<u8>::new()).is_err());
    }
}

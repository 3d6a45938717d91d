//! `contentsplit split`: Split a file or stdin into fragments.

use std::io::Read;
use std::path::{Path, PathBuf};

use contentsplit_config::SplitterConfig;
use contentsplit_core::{ContentKind, LongWordPolicy, SplitOutcome, Splitter};

const SEPARATOR_WIDTH: usize = 20;

/// Command-line overrides for a single run.
pub struct SplitArgs {
    pub file: Option<PathBuf>,
    pub max_len: Option<usize>,
    pub long_words: Option<LongWordPolicy>,
    pub output_dir: Option<PathBuf>,
    pub no_write: bool,
    pub json: bool,
}

pub fn run(args: SplitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SplitterConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let content = read_input(args.file.as_deref())?;
    let splitter = Splitter::new(config.split_options())?;
    let outcome = splitter.split(&content)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_report(&outcome));
        for warning in &outcome.warnings {
            eprintln!("⚠️  {warning}");
        }
    }

    if config.output.write_files && !args.no_write {
        let written = write_fragments(&outcome, &config.output.directory)?;
        tracing::info!(
            files = written.len(),
            directory = %config.output.directory.display(),
            "Wrote fragment files"
        );
    }

    Ok(())
}

fn apply_overrides(config: &mut SplitterConfig, args: &SplitArgs) {
    if let Some(max_len) = args.max_len {
        config.max_length = max_len;
    }
    if let Some(long_words) = args.long_words {
        config.long_words = long_words;
    }
    if let Some(dir) = &args.output_dir {
        config.output.directory = dir.clone();
    }
}

fn read_input(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?),
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

/// Per-fragment report: a header line, a separator, then the fragment.
fn render_report(outcome: &SplitOutcome) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut report = String::new();
    for fragment in &outcome.fragments {
        let marker = if fragment.is_oversized() { " (oversized)" } else { "" };
        report.push_str(&format!(
            "fragment #{}: {} chars.{marker}\n{separator}\n{}\n",
            fragment.index() + 1,
            fragment.length(),
            fragment.content()
        ));
    }
    report
}

/// File name for the 1-based fragment `number`.
fn fragment_file_name(kind: ContentKind, number: usize) -> String {
    match kind {
        ContentKind::Markup => format!("fragment_html_{number}.html"),
        ContentKind::PlainText => format!("fragment_text_{number}.txt"),
    }
}

fn write_fragments(outcome: &SplitOutcome, directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;

    let mut written = Vec::with_capacity(outcome.len());
    for fragment in &outcome.fragments {
        let path = directory.join(fragment_file_name(outcome.kind, fragment.index() + 1));
        std::fs::write(&path, fragment.content())?;
        written.push(path);
    }
    Ok(written)
}

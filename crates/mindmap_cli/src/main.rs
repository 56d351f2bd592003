//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `mindmap_core` linkage with a deterministic probe.
//! - Convert between outline text and structured documents on disk.
//!
//! Usage:
//!   mindmap_cli
//!   mindmap_cli outline-to-json <input.md> [output.json]
//!   mindmap_cli json-to-outline <input.json> [output.md]

use mindmap_core::{EditorError, MindMapEditor};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    Usage(String),
    Io { path: String, source: std::io::Error },
    Editor(EditorError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "usage: {message}"),
            Self::Io { path, source } => write!(f, "{path}: {source}"),
            Self::Editor(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Editor(err) => Some(err),
        }
    }
}

impl From<EditorError> for CliError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mindmap_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), CliError> {
    let Some((command, rest)) = args.split_first() else {
        println!("mindmap_core ping={}", mindmap_core::ping());
        println!("mindmap_core version={}", mindmap_core::core_version());
        return Ok(());
    };

    let (input, output) = match rest {
        [input] => (input.as_str(), None),
        [input, output] => (input.as_str(), Some(output.as_str())),
        _ => return Err(CliError::Usage(format!("{command} <input> [output]"))),
    };

    let text = read(input)?;
    let mut editor = MindMapEditor::default();
    let converted = match command.as_str() {
        "outline-to-json" => {
            editor.import_outline(&text)?;
            editor.export_document()?
        }
        "json-to-outline" => {
            editor.import_document(&text)?;
            editor.export_outline()
        }
        other => {
            return Err(CliError::Usage(format!(
                "unknown command `{other}`; expected outline-to-json|json-to-outline"
            )))
        }
    };

    match output {
        Some(path) => std::fs::write(path, converted).map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        }),
        None => {
            println!("{converted}");
            Ok(())
        }
    }
}

fn read(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

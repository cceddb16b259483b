//! Run command implementation.
//!
//! Executes one source file through the dispatcher and prints what ended
//! up in the output area.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use scribble_core::{ExecutionRequest, Language, LanguageTag, OutputBuffer};
use tracing::debug;

use crate::colors;
use crate::playground::{self, PlaygroundArgs};

/// Execute a file. Returns `false` when the run reported a failure.
pub async fn execute(
    file: &Path,
    language: Option<&str>,
    args: &PlaygroundArgs,
) -> anyhow::Result<bool> {
    let tag = resolve_language(file, language)?;
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let config = playground::load_config(args)?;

    let output = OutputBuffer::new();
    let dispatcher = playground::mount(&config, args.in_process, Arc::new(output.clone()));

    // Python runs are refused until the worker is ready; wait here instead.
    if tag == LanguageTag::Known(Language::Python) {
        let worker = dispatcher.session().acquire()?;
        debug!("Waiting for interpreter worker");
        worker.wait_ready(config.ready_timeout()).await?;
    }

    dispatcher
        .run(ExecutionRequest::new(tag, source))
        .finished()
        .await;

    let contents = output.contents();
    print!("{}", contents);
    if !contents.is_empty() && !contents.ends_with('\n') {
        println!();
    }
    if let Some((mount_id, html)) = output.mounted() {
        println!("{}#{}{}", colors::DIM, mount_id, colors::RESET);
        println!("{}", html);
    }

    dispatcher.session().shutdown().await?;
    Ok(!output.has_failure())
}

/// A tag typed by the user. Aliases and casing are normalized here so the
/// dispatcher only ever sees canonical tags.
pub fn user_tag(input: &str) -> LanguageTag {
    match input.parse::<Language>() {
        Ok(language) => LanguageTag::Known(language),
        Err(_) => LanguageTag::Unknown(input.trim().to_string()),
    }
}

/// The explicit `--language`, or the one implied by the file extension.
fn resolve_language(file: &Path, language: Option<&str>) -> anyhow::Result<LanguageTag> {
    if let Some(language) = language {
        return Ok(user_tag(language));
    }

    file.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension)
        .map(LanguageTag::Known)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "cannot infer the language of {}; pass --language",
                playground::display_name(file)
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension_or_flag() {
        assert_eq!(
            resolve_language(Path::new("a/b.py"), None).unwrap(),
            LanguageTag::Known(Language::Python)
        );
        assert_eq!(
            resolve_language(Path::new("app.jsx"), None).unwrap(),
            LanguageTag::Known(Language::React)
        );
        assert_eq!(
            resolve_language(Path::new("notes.txt"), Some("js")).unwrap(),
            LanguageTag::Known(Language::JavaScript)
        );
        assert_eq!(
            resolve_language(Path::new("x.py"), Some("JSX")).unwrap(),
            LanguageTag::Known(Language::React)
        );
        assert_eq!(
            resolve_language(Path::new("x.rb"), Some("ruby")).unwrap(),
            LanguageTag::Unknown("ruby".to_string())
        );
        assert!(resolve_language(Path::new("notes.txt"), None).is_err());
    }
}

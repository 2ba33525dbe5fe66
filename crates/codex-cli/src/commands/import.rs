//! Import command implementation.

use crate::cli::ImportArgs;
use crate::commands::{build_importer, read_document};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use codex_domain::CompletionProvider;
use codex_importer::{CategoryPolicy, ImportRequest, ImportResult, Importer, ImporterConfig};
use std::fs;
use std::path::Path;

/// Execute the import command.
pub async fn execute_import(args: ImportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let importer = build_importer(config, importer_config_for(&args, config), args.model.as_deref());
    run_import(args, &importer, formatter).await?;
    Ok(())
}

/// Effective importer settings for this run.
pub fn importer_config_for(args: &ImportArgs, config: &Config) -> ImporterConfig {
    let mut importer_config = args.overrides.apply(&config.importer);
    if args.strict {
        importer_config.category_policy = CategoryPolicy::Strict;
    }
    if args.dedupe {
        importer_config.dedupe_titles = true;
    }
    importer_config
}

/// Import the document named by `args` and emit the drafts.
///
/// Drafts go to `--output` as a JSON array when given, otherwise to stdout
/// in the selected format. Chunk failures are reported on stderr.
pub async fn run_import<P>(
    args: ImportArgs,
    importer: &Importer<P>,
    formatter: &Formatter,
) -> Result<ImportResult>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: std::fmt::Display,
{
    let text = read_document(&args.file)?;
    let filename = args
        .filename
        .clone()
        .unwrap_or_else(|| display_name(&args.file));

    let result = importer.import(ImportRequest::new(text, filename)).await?;

    for warning in result.warnings() {
        eprintln!("{}", formatter.warning(&warning));
    }

    match &args.output {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&result.entries)?)?;
            println!("{}", formatter.format_import_summary(&result)?);
            if formatter.format() == OutputFormat::Table {
                println!(
                    "{}",
                    formatter.info(&format!(
                        "Wrote {} entries to {}",
                        result.entries.len(),
                        path.display()
                    ))
                );
            }
        }
        None => {
            println!("{}", formatter.format_entries(&result.entries)?);
            if formatter.format() == OutputFormat::Table {
                println!("{}", formatter.format_import_summary(&result)?);
            }
        }
    }

    Ok(result)
}

/// File name shown to the extraction service
fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ImporterOverrides;
    use codex_domain::Category;
    use codex_llm::MockProvider;
    use std::path::PathBuf;

    fn args_for(file: PathBuf, output: Option<PathBuf>) -> ImportArgs {
        ImportArgs {
            file,
            filename: None,
            output,
            model: None,
            strict: false,
            dedupe: false,
            overrides: ImporterOverrides::default(),
        }
    }

    #[tokio::test]
    async fn test_import_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lore.md");
        let output = dir.path().join("entries.json");
        fs::write(&input, "# The Sunfather\nThe god of the first dawn, father of light.").unwrap();

        let provider = MockProvider::new(
            r#"[{"title": "The Sunfather", "category": "deity", "summary": "God of dawn."}]"#,
        );
        let importer = Importer::new(provider.clone(), ImporterConfig::default());
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = run_import(args_for(input, Some(output.clone())), &importer, &formatter)
            .await
            .unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.metadata.filename, "lore.md");

        let written: Vec<codex_domain::CodexEntryDraft> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].category, Category::Deity);
        assert!(provider.requests()[0].user.contains("Document: lore.md"));
    }

    #[tokio::test]
    async fn test_filename_override() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("upload-1234.txt");
        fs::write(&input, "The Alduinari are children of light.").unwrap();

        let provider = MockProvider::new("[]");
        let importer = Importer::new(provider.clone(), ImporterConfig::default());
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let mut args = args_for(input, None);
        args.filename = Some("Alduinari.docx".to_string());
        run_import(args, &importer, &formatter).await.unwrap();

        assert!(provider.requests()[0].user.contains("Document: Alduinari.docx"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let importer = Importer::new(MockProvider::new("[]"), ImporterConfig::default());
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = run_import(
            args_for(PathBuf::from("/nonexistent/lore.md"), None),
            &importer,
            &formatter,
        )
        .await;
        assert!(matches!(result, Err(crate::error::CliError::Io(_))));
    }

    #[test]
    fn test_flags_override_config() {
        let mut args = args_for(PathBuf::from("lore.md"), None);
        args.strict = true;
        args.dedupe = true;
        let importer_config = importer_config_for(&args, &Config::default());
        assert_eq!(importer_config.category_policy, CategoryPolicy::Strict);
        assert!(importer_config.dedupe_titles);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/lore/world.md")), "world.md");
        assert_eq!(display_name(Path::new("-")), "stdin");
    }
}

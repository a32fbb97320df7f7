//! Command-line interface handling and tool dispatch

mod args;

pub use args::{Cli, CollectionArgs, Command, NerdifyArgs, RenameArgs, WeightsArgs};

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::font::metadata::TtfMetadata;
use crate::font::style::StyleMatcher;
use crate::font::weight::WeightVocabulary;
use crate::font::writer::SfntNameWriter;
use crate::models::Config;
use crate::organizer::batch::{BatchReport, EXIT_NO_INPUT, EXIT_OK, EXIT_PARTIAL};
use crate::organizer::collection::{describe_plan, plan_collection, write_collection};
use crate::organizer::patch::{check_fontforge_available, ensure_font_patcher, patch_one_font};
use crate::organizer::rename::process_font;
use crate::organizer::weights::{generate_weight_instances, WeightJob};
use crate::utils::file::{discover_fonts, PATCHABLE_EXTENSIONS, SFNT_EXTENSIONS};
use crate::utils::process::SystemRunner;

const TTF_ONLY: [&str; 1] = ["ttf"];

/// Exit status for an error that stopped a whole tool
fn exit_for(error: &Error) -> u8 {
    match error {
        Error::UnrecognizedFormat(_)
        | Error::MixedInput
        | Error::TypeConflict { .. }
        | Error::InvalidPath(_)
        | Error::Processing(_) => EXIT_NO_INPUT,
        _ => EXIT_PARTIAL,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run the selected tool and return the process exit status
pub fn run(cli: &Cli) -> u8 {
    let config = cli.config();
    log::debug!("verbosity={} weights={}", config.verbosity, config.weights_path.display());

    let outcome = match &cli.command {
        Command::Collection(args) => load_vocabulary(&config).and_then(|v| run_collection(args, &v)),
        Command::Rename(args) => load_vocabulary(&config).and_then(|v| run_rename(args, &v)),
        Command::Weights(args) => load_vocabulary(&config).and_then(|v| run_weights(args, &v)),
        Command::Nerdify(args) => run_nerdify(args),
    };
    outcome.unwrap_or_else(|e| {
        eprintln!("{}", e);
        exit_for(&e)
    })
}

fn load_vocabulary(config: &Config) -> Result<WeightVocabulary> {
    WeightVocabulary::load(&config.weights_path)
}

fn run_collection(args: &CollectionArgs, vocab: &WeightVocabulary) -> Result<u8> {
    let fonts = discover_fonts(&args.paths, &SFNT_EXTENSIONS)?;
    if fonts.is_empty() {
        eprintln!("No supported fonts found (.ttf/.otf).");
        return Ok(EXIT_NO_INPUT);
    }

    let plan = plan_collection(&fonts, args.kind, args.name.as_deref(), &TtfMetadata, vocab)?;
    if args.dry_run {
        for line in describe_plan(&plan) {
            println!("{}", line);
        }
        return Ok(EXIT_OK);
    }

    match write_collection(&plan, &args.output) {
        Ok(path) => {
            println!("Wrote {} ({} fonts)", path.display(), plan.fonts.len());
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(EXIT_PARTIAL)
        }
    }
}

fn run_rename(args: &RenameArgs, vocab: &WeightVocabulary) -> Result<u8> {
    let fonts = discover_fonts(&args.paths, &TTF_ONLY)?;
    if fonts.is_empty() {
        eprintln!("No .ttf files found under provided paths.");
        return Ok(EXIT_NO_INPUT);
    }

    let matcher = StyleMatcher::new();
    let mut writer = SfntNameWriter::new();
    let mut report = BatchReport::new();
    for font in &fonts {
        let outcome = process_font(font, args.output.as_deref(), &mut writer, &matcher, vocab);
        report.record(&display_name(font), outcome.map(|p| p.display().to_string()));
    }
    Ok(report.exit_code())
}

fn run_weights(args: &WeightsArgs, vocab: &WeightVocabulary) -> Result<u8> {
    let fonts = discover_fonts(&args.paths, &TTF_ONLY)?;
    if fonts.is_empty() {
        eprintln!("No .ttf files found under provided paths.");
        return Ok(EXIT_NO_INPUT);
    }

    let job = WeightJob {
        offset: args.weight_offset,
        out_dir: args.output.clone(),
        python: args.python.clone(),
    };
    let mut writer = SfntNameWriter::new();
    let mut report = BatchReport::new();
    let mut outputs = 0;
    for font in &fonts {
        let name = display_name(font);
        match generate_weight_instances(font, &job, vocab, &TtfMetadata, &SystemRunner, &mut writer) {
            Ok(created) if !created.is_empty() => {
                outputs += created.len();
                report.record::<_, Error>(&name, Ok(format!("{} outputs", created.len())));
            }
            Ok(_) => report.fail(&name, "no outputs created"),
            Err(e) => report.fail(&name, e),
        }
    }
    println!("Done. Outputs: {}, Fonts with no outputs: {}", outputs, report.failed);
    Ok(report.exit_code())
}

fn run_nerdify(args: &NerdifyArgs) -> Result<u8> {
    check_fontforge_available(&args.fontforge, &SystemRunner)?;
    let cwd: PathBuf = env::current_dir()?;
    let patcher = ensure_font_patcher(args.fontpatcher_dir.as_deref(), &cwd)?;

    let fonts = discover_fonts(&args.paths, &PATCHABLE_EXTENSIONS)?;
    if fonts.is_empty() {
        println!("No fonts found to patch.");
        return Ok(EXIT_NO_INPUT);
    }

    let mut report = BatchReport::new();
    for font in &fonts {
        let outcome = patch_one_font(font, &patcher, &args.output, &args.fontforge, &SystemRunner);
        report.record(&display_name(font), outcome.map(|moved| format!("{} files", moved.len())));
    }
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_errors_exit_with_one() {
        assert_eq!(exit_for(&Error::MixedInput), EXIT_NO_INPUT);
        assert_eq!(exit_for(&Error::Config("missing".into())), EXIT_PARTIAL);
        assert_eq!(exit_for(&Error::MissingDependency("fontforge".into())), EXIT_PARTIAL);
    }

    #[test]
    fn missing_vocabulary_is_a_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            verbose: false,
            quiet: true,
            weights: Some(dir.path().join("absent.toml")),
            command: Command::Rename(RenameArgs {
                paths: vec![dir.path().to_path_buf()],
                output: None,
            }),
        };
        assert_eq!(run(&cli), EXIT_PARTIAL);
    }

    #[test]
    fn empty_input_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("w.toml");
        std::fs::write(&weights, "[weights]\nRegular = 400\n").unwrap();
        let cli = Cli {
            verbose: false,
            quiet: true,
            weights: Some(weights),
            command: Command::Collection(CollectionArgs {
                paths: vec![dir.path().join("nothing-here")],
                output: dir.path().to_path_buf(),
                kind: None,
                name: None,
                dry_run: true,
            }),
        };
        assert_eq!(run(&cli), EXIT_NO_INPUT);
    }
}

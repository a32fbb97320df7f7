use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::font::metadata::FontMetadataProvider;
use crate::font::weight::WeightVocabulary;
use crate::font::writer::{
    identity_records, NameTableWriter, FAMILY, FULL_NAME, POSTSCRIPT_NAME, SUBFAMILY, TYPOGRAPHIC_FAMILY,
    TYPOGRAPHIC_SUBFAMILY,
};
use crate::models::WeightTarget;
use crate::utils::file::ensure_directory_exists;
use crate::utils::naming::format_weight;
use crate::utils::process::{check_output, ProcessRunner};

/// Python module that pins a variable font to one instance
pub const INSTANCER_MODULE: &str = "fontTools.varLib.instancer";

/// Parse a weight offset such as `+10`, `-10` or `12.5`
pub fn parse_weight_offset(value: &str) -> Result<f64> {
    let invalid = || Error::Config(format!("invalid weight offset '{}'", value));
    let offset: f64 = value.trim().parse().map_err(|_| invalid())?;
    if offset.is_finite() {
        Ok(offset)
    } else {
        Err(invalid())
    }
}

/// Subfamily label of an instance; the resolved value is appended when offset
fn instance_subfamily(weight_name: &str, resolved: f64, offset: f64) -> String {
    if offset == 0.0 {
        weight_name.to_string()
    } else {
        format!("{}-{}", weight_name, format_weight(resolved))
    }
}

/// Output stem of one instance: `<stem>-<Weight>` or `<stem>-<Weight>-<value>`
pub fn compose_weight_basename(stem: &str, weight_name: &str, resolved: f64, offset: f64) -> String {
    format!("{}-{}", stem, instance_subfamily(weight_name, resolved, offset))
}

/// One target per standard weight, shifted by `offset` and clamped into the
/// font's `wght` range when it declares one
pub fn process_font_all_weights<P>(
    font: &Path,
    provider: &P,
    offset: f64,
    vocab: &WeightVocabulary,
) -> Result<Vec<WeightTarget>>
where
    P: FontMetadataProvider + ?Sized,
{
    let range = provider.read_axis_range(font)?;
    if range.is_none() {
        log::debug!("{} declares no wght axis; targets are not clamped", font.display());
    }
    Ok(vocab
        .standard_weights()
        .into_iter()
        .map(|(base_value, name)| {
            let target = f64::from(base_value) + offset;
            WeightTarget {
                name,
                base_value,
                resolved_value: range.map_or(target, |r| r.clamp(target)),
                offset,
            }
        })
        .collect())
}

/// `python -m fontTools.varLib.instancer <font> wght=<value> -o <out>`
pub fn build_instancer_argv(python: &str, font: &Path, weight: f64, out_path: &Path) -> Vec<String> {
    vec![
        python.to_string(),
        "-m".to_string(),
        INSTANCER_MODULE.to_string(),
        font.display().to_string(),
        format!("wght={}", format_weight(weight)),
        "-o".to_string(),
        out_path.display().to_string(),
    ]
}

/// Settings shared by every instance of a run
#[derive(Debug, Clone)]
pub struct WeightJob {
    /// Offset added to every standard weight
    pub offset: f64,
    /// Directory receiving the instances
    pub out_dir: PathBuf,
    /// Python interpreter with fontTools installed
    pub python: String,
}

/// Pin `font` at `weight` and write `<basename>.ttf` into the job's directory
pub fn adjust_font_weight<P, R>(
    font: &Path,
    weight: f64,
    basename: &str,
    job: &WeightJob,
    provider: &P,
    runner: &R,
) -> Result<PathBuf>
where
    P: FontMetadataProvider + ?Sized,
    R: ProcessRunner + ?Sized,
{
    ensure_directory_exists(&job.out_dir)?;
    if let Some(range) = provider.read_axis_range(font)? {
        if !range.contains(weight) {
            return Err(Error::Processing(format!(
                "weight {} outside supported range [{}, {}]",
                format_weight(weight),
                format_weight(range.min),
                format_weight(range.max)
            )));
        }
    }

    let out_path = job.out_dir.join(format!("{}.ttf", basename));
    let argv = build_instancer_argv(&job.python, font, weight, &out_path);
    check_output(INSTANCER_MODULE, runner.run(&argv, None)?)?;
    Ok(out_path)
}

/// Point the identity records of an instance at its weight
pub fn rewrite_instance_names<P, W>(
    instance: &Path,
    target: &WeightTarget,
    provider: &P,
    writer: &mut W,
) -> Result<()>
where
    P: FontMetadataProvider + ?Sized,
    W: NameTableWriter + ?Sized,
{
    let family = provider
        .read_family_and_subfamily(instance)?
        .0
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| {
            instance
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
    let subfamily = instance_subfamily(&target.name, target.resolved_value, target.offset);
    let full = format!("{} {}", family, subfamily).trim().to_string();
    let postscript = format!("{}-{}", family.replace(' ', ""), subfamily.replace(' ', ""));

    let values = [
        (TYPOGRAPHIC_FAMILY, family.as_str()),
        (TYPOGRAPHIC_SUBFAMILY, subfamily.as_str()),
        (FAMILY, family.as_str()),
        (SUBFAMILY, subfamily.as_str()),
        (FULL_NAME, full.as_str()),
        (POSTSCRIPT_NAME, postscript.as_str()),
    ];
    for entry in identity_records(&values) {
        writer.set_name(instance, entry)?;
    }
    writer.save(instance)
}

/// Produce every instance of the weight ladder for one font.
///
/// A failing weight is reported and skipped; the others are still attempted.
/// Returns the instances that were written.
pub fn generate_weight_instances<P, R, W>(
    font: &Path,
    job: &WeightJob,
    vocab: &WeightVocabulary,
    provider: &P,
    runner: &R,
    writer: &mut W,
) -> Result<Vec<PathBuf>>
where
    P: FontMetadataProvider + ?Sized,
    R: ProcessRunner + ?Sized,
    W: NameTableWriter + ?Sized,
{
    let font_name = font
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = font
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut created = Vec::new();
    for target in process_font_all_weights(font, provider, job.offset, vocab)? {
        let basename = compose_weight_basename(&stem, &target.name, target.resolved_value, target.offset);
        match adjust_font_weight(font, target.resolved_value, &basename, job, provider, runner) {
            Ok(instance) => {
                if let Err(e) = rewrite_instance_names(&instance, &target, provider, writer) {
                    log::warn!("{} {}: could not rewrite internal names: {}", font_name, target.name, e);
                }
                created.push(instance);
            }
            Err(e) => eprintln!("FAIL {} {}: {}", font_name, target.name, e),
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AxisRange, NameEntry, StyleFlags};
    use crate::utils::process::ProcessOutput;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    struct Ranged(Option<AxisRange>);

    impl FontMetadataProvider for Ranged {
        fn read_family_and_subfamily(&self, _path: &Path) -> Result<(Option<String>, Option<String>)> {
            Ok((Some("Cool Sans".to_string()), None))
        }

        fn read_weight_and_italic(&self, _path: &Path) -> Result<(Option<u16>, bool)> {
            Ok((None, false))
        }

        fn read_axis_range(&self, _path: &Path) -> Result<Option<AxisRange>> {
            Ok(self.0)
        }
    }

    /// Fails whenever the requested weight is 900
    struct ScriptedRunner {
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, argv: &[String], _cwd: Option<&Path>) -> Result<ProcessOutput> {
            self.calls.borrow_mut().push(argv.to_vec());
            let code = if argv.iter().any(|a| a == "wght=900") { 1 } else { 0 };
            Ok(ProcessOutput {
                code,
                stdout: String::new(),
                stderr: "boom".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct NullWriter {
        entries: Vec<(PathBuf, NameEntry)>,
    }

    impl NameTableWriter for NullWriter {
        fn set_name(&mut self, path: &Path, entry: NameEntry) -> Result<()> {
            self.entries.push((path.to_path_buf(), entry));
            Ok(())
        }

        fn set_style(&mut self, _path: &Path, _flags: StyleFlags) -> Result<()> {
            Ok(())
        }

        fn save(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn vocab() -> WeightVocabulary {
        WeightVocabulary::from_toml_str("[weights]\nThin = 100\nRegular = 400\nBlack = 900\n").unwrap()
    }

    #[test]
    fn offsets_parse_with_sign() {
        assert_eq!(parse_weight_offset("+10").unwrap(), 10.0);
        assert_eq!(parse_weight_offset("-12.5").unwrap(), -12.5);
        assert!(matches!(parse_weight_offset("inf"), Err(Error::Config(_))));
        assert!(matches!(parse_weight_offset("heavy"), Err(Error::Config(_))));
    }

    #[test]
    fn argv_names_the_instancer() {
        let argv = build_instancer_argv("python3", Path::new("a.ttf"), 412.5, Path::new("out/a.ttf"));
        assert_eq!(
            argv,
            vec!["python3", "-m", INSTANCER_MODULE, "a.ttf", "wght=412.5", "-o", "out/a.ttf"]
        );
    }

    #[test]
    fn out_of_range_weight_is_rejected_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let job = WeightJob {
            offset: 0.0,
            out_dir: dir.path().to_path_buf(),
            python: "python3".into(),
        };
        let runner = ScriptedRunner { calls: RefCell::new(Vec::new()) };
        let provider = Ranged(Some(AxisRange { min: 300.0, max: 700.0 }));
        let err = adjust_font_weight(Path::new("a.ttf"), 800.0, "a-800", &job, &provider, &runner).unwrap_err();
        assert!(err.to_string().contains("outside supported range [300, 700]"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn failing_weight_does_not_stop_the_ladder() {
        let dir = tempfile::tempdir().unwrap();
        let job = WeightJob {
            offset: 0.0,
            out_dir: dir.path().to_path_buf(),
            python: "python3".into(),
        };
        let runner = ScriptedRunner { calls: RefCell::new(Vec::new()) };
        let mut writer = NullWriter::default();
        let created = generate_weight_instances(
            Path::new("/src/Cool-VF.ttf"),
            &job,
            &vocab(),
            &Ranged(None),
            &runner,
            &mut writer,
        )
        .unwrap();

        assert_eq!(runner.calls.borrow().len(), 3);
        assert_eq!(
            created,
            vec![dir.path().join("Cool-VF-Thin.ttf"), dir.path().join("Cool-VF-Regular.ttf")]
        );
        let ps: Vec<&str> = writer
            .entries
            .iter()
            .filter(|(_, e)| e.name_id == POSTSCRIPT_NAME && e.platform_id == 3)
            .map(|(_, e)| e.value.as_str())
            .collect();
        assert_eq!(ps, vec!["CoolSans-Thin", "CoolSans-Regular"]);
    }

    #[test]
    fn offset_instances_carry_the_value() {
        let target = WeightTarget {
            name: "Bold".into(),
            base_value: 700,
            resolved_value: 712.5,
            offset: 12.5,
        };
        let mut writer = NullWriter::default();
        rewrite_instance_names(Path::new("x.ttf"), &target, &Ranged(None), &mut writer).unwrap();
        let subfamily = writer
            .entries
            .iter()
            .find(|(_, e)| e.name_id == SUBFAMILY)
            .map(|(_, e)| e.value.clone());
        assert_eq!(subfamily.as_deref(), Some("Bold-712.5"));
    }

    #[test]
    fn instances_rewrite_typographic_names_on_both_platforms() {
        let target = WeightTarget {
            name: "Bold".into(),
            base_value: 700,
            resolved_value: 700.0,
            offset: 0.0,
        };
        let mut writer = NullWriter::default();
        rewrite_instance_names(Path::new("x.ttf"), &target, &Ranged(None), &mut writer).unwrap();

        for platform in [1, 3] {
            let mut ids: Vec<u16> = writer
                .entries
                .iter()
                .filter(|(_, e)| e.platform_id == platform)
                .map(|(_, e)| e.name_id)
                .collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 4, 6, 16, 17]);
        }
        let typographic = writer
            .entries
            .iter()
            .find(|(_, e)| e.name_id == TYPOGRAPHIC_SUBFAMILY && e.platform_id == 3)
            .map(|(_, e)| e.value.clone());
        assert_eq!(typographic.as_deref(), Some("Bold"));
    }
}

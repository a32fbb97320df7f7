use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::file::{ensure_directory_exists, has_extension, safe_move_file, snapshot_files, PATCHABLE_EXTENSIONS};
use crate::utils::process::{check_output, ProcessRunner};

/// Name of the patcher script inside a FontPatcher directory
pub const PATCHER_SCRIPT: &str = "font-patcher";
/// Directory searched when none is given
pub const LOCAL_PATCHER_DIR: &str = "FontPatcher";

/// Make sure `fontforge -version` runs
pub fn check_fontforge_available<R>(fontforge: &str, runner: &R) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    let missing = || {
        Error::MissingDependency(format!(
            "{} not found. Install it with your package manager.",
            fontforge
        ))
    };
    match runner.run(&[fontforge.to_string(), "-version".to_string()], None) {
        Ok(output) if output.success() => Ok(()),
        Ok(_) | Err(Error::MissingDependency(_)) => Err(missing()),
        Err(e) => Err(e),
    }
}

/// Locate the patcher script in `patcher_dir`, or in `./FontPatcher`.
///
/// Nothing is downloaded; a missing script is a missing dependency.
pub fn ensure_font_patcher(patcher_dir: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let candidate = match patcher_dir {
        Some(dir) => dir.join(PATCHER_SCRIPT),
        None => cwd.join(LOCAL_PATCHER_DIR).join(PATCHER_SCRIPT),
    };
    if candidate.is_file() {
        Ok(candidate)
    } else if patcher_dir.is_some() {
        Err(Error::MissingDependency(format!(
            "invalid --fontpatcher-dir; missing {}",
            candidate.display()
        )))
    } else {
        Err(Error::MissingDependency(format!(
            "{} not found; unpack FontPatcher.zip there or pass --fontpatcher-dir",
            candidate.display()
        )))
    }
}

/// `<fontforge> -script <patcher> <font>`; outputs land in the working directory
pub fn build_patch_command(fontforge: &str, patcher: &Path, font: &Path) -> Vec<String> {
    vec![
        fontforge.to_string(),
        "-script".to_string(),
        patcher.display().to_string(),
        font.display().to_string(),
    ]
}

/// Destination of one patcher output; fonts become `<stem>-NerdFont.<ext>`
fn output_name(font: &Path, produced: &Path) -> String {
    let produced_name = produced
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !has_extension(produced, &PATCHABLE_EXTENSIONS) {
        return produced_name;
    }
    let stem = font
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = produced
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("{}-NerdFont.{}", stem, ext)
}

/// Patch one font in a scratch directory and move what it produced to `out_dir`
pub fn patch_one_font<R>(
    font: &Path,
    patcher: &Path,
    out_dir: &Path,
    fontforge: &str,
    runner: &R,
) -> Result<Vec<PathBuf>>
where
    R: ProcessRunner + ?Sized,
{
    ensure_directory_exists(out_dir)?;
    let workdir = tempfile::tempdir()?;
    let before = snapshot_files(workdir.path())?;

    let argv = build_patch_command(fontforge, patcher, font);
    check_output(fontforge, runner.run(&argv, Some(workdir.path()))?)?;

    let after = snapshot_files(workdir.path())?;
    let mut moved = Vec::new();
    for produced in after.difference(&before) {
        let dest = out_dir.join(output_name(font, produced));
        safe_move_file(produced, &dest)?;
        moved.push(dest);
    }
    log::debug!("{}: moved {} patcher outputs", font.display(), moved.len());
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::ProcessOutput;
    use pretty_assertions::assert_eq;
    use std::fs;

    /// Writes a fake patched font into the working directory
    struct FakePatcher {
        code: i32,
    }

    impl ProcessRunner for FakePatcher {
        fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<ProcessOutput> {
            if let Some(dir) = cwd {
                fs::write(dir.join("Cool Nerd Font Complete.TTF"), b"x")?;
                fs::write(dir.join("log.txt"), b"done")?;
            }
            Ok(ProcessOutput {
                code: self.code,
                stdout: argv.join(" "),
                stderr: if self.code == 0 { String::new() } else { "no glyphs".into() },
            })
        }
    }

    #[test]
    fn outputs_are_renamed_and_moved() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let moved = patch_one_font(
            Path::new("/fonts/Cool-Regular.ttf"),
            Path::new("/opt/FontPatcher/font-patcher"),
            &out,
            "fontforge",
            &FakePatcher { code: 0 },
        )
        .unwrap();
        assert_eq!(moved, vec![out.join("Cool-Regular-NerdFont.ttf"), out.join("log.txt")]);
        assert!(out.join("Cool-Regular-NerdFont.ttf").exists());
    }

    #[test]
    fn patcher_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let err = patch_one_font(
            Path::new("a.ttf"),
            Path::new("font-patcher"),
            dir.path(),
            "fontforge",
            &FakePatcher { code: 3 },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "fontforge failed (rc=3): no glyphs");
    }

    #[test]
    fn patcher_lookup() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ensure_font_patcher(None, dir.path()),
            Err(Error::MissingDependency(_))
        ));
        let local = dir.path().join(LOCAL_PATCHER_DIR);
        fs::create_dir_all(&local).unwrap();
        fs::write(local.join(PATCHER_SCRIPT), b"#!").unwrap();
        assert_eq!(ensure_font_patcher(None, dir.path()).unwrap(), local.join(PATCHER_SCRIPT));
        assert!(ensure_font_patcher(Some(dir.path().join("nope").as_path()), dir.path()).is_err());
    }

    #[test]
    fn fontforge_check_maps_failures() {
        assert!(check_fontforge_available("fontforge", &FakePatcher { code: 0 }).is_ok());
        assert!(matches!(
            check_fontforge_available("fontforge", &FakePatcher { code: 1 }),
            Err(Error::MissingDependency(_))
        ));
    }

    #[test]
    fn command_line() {
        assert_eq!(
            build_patch_command("ff", Path::new("p"), Path::new("f.otf")),
            vec!["ff", "-script", "p", "f.otf"]
        );
    }
}

use std::fmt::Display;

/// Exit status when every item succeeded
pub const EXIT_OK: u8 = 0;
/// Exit status for missing inputs or a failed inference
pub const EXIT_NO_INPUT: u8 = 1;
/// Exit status when some items failed or a dependency is missing
pub const EXIT_PARTIAL: u8 = 2;

/// Running tally of a batch of per-item operations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one item: `OK  <item> -> <detail>` on success, `FAIL <item>: <err>` otherwise
    pub fn record<T: Display, E: Display>(&mut self, item: &str, outcome: std::result::Result<T, E>) {
        match outcome {
            Ok(detail) => {
                self.succeeded += 1;
                println!("OK  {} -> {}", item, detail);
            }
            Err(e) => self.fail(item, e),
        }
    }

    /// Record one failed item
    pub fn fail<E: Display>(&mut self, item: &str, error: E) {
        self.failed += 1;
        log::debug!("{} failed", item);
        eprintln!("FAIL {}: {}", item, error);
    }

    /// 0 when nothing failed, 2 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.failed == 0 {
            EXIT_OK
        } else {
            EXIT_PARTIAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_failure_is_a_partial_exit() {
        let mut report = BatchReport::new();
        report.record::<_, String>("a.ttf", Ok("out/a.ttf"));
        assert_eq!(report.exit_code(), EXIT_OK);
        report.record::<&str, _>("b.ttf", Err("broken name table"));
        assert_eq!(report.exit_code(), EXIT_PARTIAL);
        assert_eq!((report.succeeded, report.failed), (1, 1));
    }
}

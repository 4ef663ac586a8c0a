//! Field checks for config sections
//!
//! A section reports every bad field at once so a hand-edited file can be
//! fixed in one pass.

use crate::error::FieldError;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// A `[table]` of `config.toml` that can check its own fields
pub trait ConfigSection {
    const TABLE: &'static str;

    fn check(&self, checks: &mut Checks);

    fn validate(&self) -> Result<(), Vec<FieldError>>
    where
        Self: Sized,
    {
        let mut checks = Checks::default();
        checks.section(self);
        checks.finish()
    }
}

/// Accumulates field errors, prefixing keys with the current table
#[derive(Debug, Default)]
pub struct Checks {
    table: &'static str,
    errors: Vec<FieldError>,
}

impl Checks {
    /// Runs a section's checks under its table name
    pub fn section<S: ConfigSection>(&mut self, section: &S) -> &mut Self {
        let outer = std::mem::replace(&mut self.table, S::TABLE);
        section.check(self);
        self.table = outer;
        self
    }

    pub fn within<T>(&mut self, key: &str, value: T, bounds: RangeInclusive<T>) -> &mut Self
    where
        T: PartialOrd + Display,
    {
        if !bounds.contains(&value) {
            let problem = format!("{} is outside {}..={}", value, bounds.start(), bounds.end());
            self.fail(key, problem);
        }
        self
    }

    pub fn ensure(&mut self, key: &str, holds: bool, problem: &str) -> &mut Self {
        if !holds {
            self.fail(key, problem.to_string());
        }
        self
    }

    fn fail(&mut self, key: &str, problem: String) {
        let field = if self.table.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.table, key)
        };
        self.errors.push(FieldError { field, problem });
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

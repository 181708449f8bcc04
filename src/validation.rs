use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// Field name to message, shown under the offending input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects field errors while a form is checked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn required<'a>(&mut self, field: &str, label: &str, value: &'a str) -> Option<&'a str> {
        let value = value.trim();
        if value.is_empty() {
            self.fail(field, format!("{label} is required"));
            None
        } else {
            Some(value)
        }
    }

    /// Blank passes; anything else must look like `local@domain.tld`.
    pub fn email(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if !value.is_empty() && !is_email(value) {
            self.fail(field, "Enter a valid email address");
        }
    }

    pub fn url(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match reqwest::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            _ => self.fail(field, "Enter a valid URL"),
        }
    }

    pub fn integer(&mut self, field: &str, label: &str, value: &str) -> Option<i64> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse() {
            Ok(number) => Some(number),
            Err(_) => {
                self.fail(field, format!("{label} must be a whole number"));
                None
            }
        }
    }

    pub fn required_integer(&mut self, field: &str, label: &str, value: &str) -> Option<i64> {
        self.required(field, label, value)
            .and_then(|value| self.integer(field, label, value))
    }

    pub fn decimal(&mut self, field: &str, label: &str, value: &str) -> Option<f64> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Some(number),
            _ => {
                self.fail(field, format!("{label} must be a number"));
                None
            }
        }
    }

    pub fn percentage(&mut self, field: &str, label: &str, value: &str) -> Option<u8> {
        let number = self.integer(field, label, value)?;
        match u8::try_from(number) {
            Ok(percent) if percent <= 100 => Some(percent),
            _ => {
                self.fail(field, format!("{label} must be between 0 and 100"));
                None
            }
        }
    }

    pub fn date(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.fail(field, format!("{label} must be a date (YYYY-MM-DD)"));
                None
            }
        }
    }

    pub fn required_date(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveDate> {
        self.required(field, label, value)
            .and_then(|value| self.date(field, label, value))
    }

    pub fn time(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"));
        match parsed {
            Ok(time) => Some(time),
            Err(_) => {
                self.fail(field, format!("{label} must be a time (HH:MM)"));
                None
            }
        }
    }

    pub fn required_time(&mut self, field: &str, label: &str, value: &str) -> Option<NaiveTime> {
        self.required(field, label, value)
            .and_then(|value| self.time(field, label, value))
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::models::{CompanyInfo, Field, FormData, JobDetails, MultiJobForm, SingleJobForm};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,14}$").expect("phone pattern compiles"));

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

pub const NO_POSITIONS_MESSAGE: &str = "Please add at least one position before submitting";

/// Field name to message, plus an optional form-wide `submit` banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorMap {
    #[serde(flatten)]
    fields: BTreeMap<Field, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submit: Option<String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.submit.is_none()
    }

    pub fn len(&self) -> usize {
        self.fields.len() + usize::from(self.submit.is_some())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }

    /// Drop one field's message; returns whether there was one
    pub fn clear_field(&mut self, field: Field) -> bool {
        self.fields.remove(&field).is_some()
    }

    pub fn submit(&self) -> Option<&str> {
        self.submit.as_deref()
    }

    pub fn set_submit(&mut self, message: impl Into<String>) {
        self.submit = Some(message.into());
    }

    fn check(&mut self, field: Field, outcome: Option<&'static str>) {
        if let Some(message) = outcome {
            self.insert(field, message);
        }
    }
}

fn required(value: &str, message: &'static str) -> Option<&'static str> {
    value.trim().is_empty().then_some(message)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Whitespace is ignored, so "+251 911 223344" is accepted
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

pub fn check_email(value: &str) -> Option<&'static str> {
    required(value, "Email is required").or_else(|| {
        (!is_valid_email(value)).then_some("Please enter a valid business email")
    })
}

pub fn check_phone(value: &str) -> Option<&'static str> {
    required(value, "Phone number is required").or_else(|| {
        (!is_valid_phone(value)).then_some("Enter a valid phone number (e.g. +251 911...)")
    })
}

/// Compared by calendar day, so `today` itself is still accepted
pub fn check_deadline(value: &str, today: NaiveDate) -> Option<&'static str> {
    if value.trim().is_empty() {
        return Some("Submission deadline is required");
    }
    match NaiveDate::parse_from_str(value.trim(), DEADLINE_FORMAT) {
        Ok(date) if date < today => Some("Deadline cannot be in the past"),
        Ok(_) => None,
        Err(_) => Some("Enter a valid date (YYYY-MM-DD)"),
    }
}

pub fn check_personnel_count(value: &str) -> Option<&'static str> {
    required(value, "Headcount is required").or_else(|| match value.trim().parse::<u32>() {
        Ok(count) if count >= 1 => None,
        _ => Some("Headcount must be a whole number of at least 1"),
    })
}

/// Errors for one step of the single-job form. Steps outside 1..=3 have
/// no required fields.
pub fn single_step_errors(form: &SingleJobForm, step: usize, today: NaiveDate) -> ErrorMap {
    let mut errors = ErrorMap::new();
    match step {
        1 => {
            errors.check(Field::Email, check_email(&form.email));
            errors.check(
                Field::CompanyName,
                required(&form.company_name, "Company name is required"),
            );
            errors.check(
                Field::JobTitle,
                required(&form.job_title, "Job title is required"),
            );
        }
        2 => {
            errors.check(
                Field::JobDescription,
                required(&form.job_description, "Please provide a job description"),
            );
        }
        3 => {
            errors.check(Field::ContactPhone, check_phone(&form.contact_phone));
            errors.check(Field::Deadline, check_deadline(&form.deadline, today));
            errors.check(
                Field::WorkLocation,
                required(&form.work_location, "Location is required"),
            );
        }
        _ => {}
    }
    errors
}

pub fn company_errors(company: &CompanyInfo) -> ErrorMap {
    let mut errors = ErrorMap::new();
    errors.check(Field::Email, check_email(&company.email));
    errors.check(
        Field::CompanyName,
        required(&company.company_name, "Company name is required"),
    );
    errors.check(Field::ContactPhone, check_phone(&company.contact_phone));
    errors
}

pub fn job_errors(job: &JobDetails, today: NaiveDate) -> ErrorMap {
    let mut errors = ErrorMap::new();
    errors.check(
        Field::JobTitle,
        required(&job.job_title, "Job title is required"),
    );
    errors.check(
        Field::PersonnelCount,
        check_personnel_count(&job.personnel_count),
    );
    errors.check(
        Field::JobDescription,
        required(&job.job_description, "Please provide a job description"),
    );
    errors.check(
        Field::WorkLocation,
        required(&job.work_location, "Location is required"),
    );
    errors.check(Field::Deadline, check_deadline(&job.deadline, today));
    errors
}

/// Step 1 is the company block; step 2 only requires a non-empty job list.
pub fn multi_step_errors(form: &MultiJobForm, step: usize) -> ErrorMap {
    match step {
        1 => company_errors(&form.company),
        2 if form.jobs.is_empty() => {
            let mut errors = ErrorMap::new();
            errors.set_submit(NO_POSITIONS_MESSAGE);
            errors
        }
        _ => ErrorMap::new(),
    }
}

pub fn step_errors(form: &FormData, step: usize, today: NaiveDate) -> ErrorMap {
    match form {
        FormData::Single(single) => single_step_errors(single, step, today),
        FormData::Multi(multi) => multi_step_errors(multi, step),
    }
}

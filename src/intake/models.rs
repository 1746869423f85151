use std::fmt;
use std::str::FromStr;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A wire label that does not name any member of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Failure to write a single form field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("field '{0}' is not part of this form")]
    NotEditable(Field),

    #[error(transparent)]
    InvalidValue(#[from] UnknownLabel),
}

/// Closed enumerations serialize as their human-readable label, which is
/// also what the data store columns hold.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.label() == s)
                    .ok_or_else(|| UnknownLabel {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

labelled_enum! {
    ExperienceLevel: "experience level" {
        Internship => "Internship",
        FreshGraduate => "Fresh Graduate",
        #[default]
        Junior => "Junior (0-2 Years)",
        Intermediate => "Intermediate (2-4 Years)",
        Senior => "Senior (4+ Years)",
        Management => "Management",
    }
}

labelled_enum! {
    EmploymentType: "employment type" {
        #[default]
        FullTime => "Full-time",
        PartTime => "Part-time",
        Contract => "Contract",
    }
}

labelled_enum! {
    SalaryRange: "salary range" {
        Below20k => "Below 20,000 Birr",
        TwentyToFifty => "20,000 - 50,000 Birr",
        FiftyToHundred => "50,000 - 100,000 Birr",
        #[default]
        Negotiable => "Negotiable",
    }
}

labelled_enum! {
    JobSite: "job site" {
        #[default]
        OnSite => "On-Site",
        Remote => "Remote",
    }
}

labelled_enum! {
    EducationLevel: "education level" {
        Masters => "Masters Degree",
        NotRequired => "Not Required",
        Tvet => "Tvet",
        Secondary => "Secondary School",
        Certificate => "Certificate",
        Diploma => "Diploma",
        #[default]
        Bachelors => "Bachelors Degree",
        Phd => "Phd",
    }
}

/// Every named input a form can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Email,
    CompanyName,
    ContactPhone,
    JobTitle,
    JobDescription,
    WorkLocation,
    JobSite,
    ExperienceLevel,
    EmploymentType,
    EducationLevel,
    SalaryRange,
    Deadline,
    PersonnelCount,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::CompanyName => "companyName",
            Field::ContactPhone => "contactPhone",
            Field::JobTitle => "jobTitle",
            Field::JobDescription => "jobDescription",
            Field::WorkLocation => "workLocation",
            Field::JobSite => "jobSite",
            Field::ExperienceLevel => "experienceLevel",
            Field::EmploymentType => "employmentType",
            Field::EducationLevel => "educationLevel",
            Field::SalaryRange => "salaryRange",
            Field::Deadline => "deadline",
            Field::PersonnelCount => "personnelCount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which shape of intake form a session drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// One job posting collected over three fixed steps
    Single,
    /// Company details, then a list of job postings
    #[default]
    Multi,
}

impl Variant {
    pub fn step_titles(&self) -> &'static [&'static str] {
        match self {
            Variant::Single => &["Company & Role", "Description", "Logistics"],
            Variant::Multi => &["Company", "Positions"],
        }
    }

    pub fn total_steps(&self) -> usize {
        self.step_titles().len()
    }
}

impl FromStr for Variant {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Variant::Single),
            "multi" => Ok(Variant::Multi),
            _ => Err(UnknownLabel {
                kind: "form variant",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub email: String,
    pub company_name: String,
    pub contact_phone: String,
}

impl CompanyInfo {
    pub fn set(&mut self, field: Field, value: String) -> Result<(), UpdateError> {
        match field {
            Field::Email => self.email = value,
            Field::CompanyName => self.company_name = value,
            Field::ContactPhone => self.contact_phone = value,
            other => return Err(UpdateError::NotEditable(other)),
        }
        Ok(())
    }
}

/// One job posting in the multi-job form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub id: String,
    pub job_title: String,
    pub job_description: String,
    pub work_location: String,
    pub job_site: JobSite,
    pub experience_level: ExperienceLevel,
    pub employment_type: EmploymentType,
    pub education_level: EducationLevel,
    pub salary_range: SalaryRange,
    pub deadline: String,
    pub personnel_count: String,
}

impl JobDetails {
    /// Blank posting with a freshly generated id and default selections
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, field: Field, value: String) -> Result<(), UpdateError> {
        match field {
            Field::JobTitle => self.job_title = value,
            Field::JobDescription => self.job_description = value,
            Field::WorkLocation => self.work_location = value,
            Field::JobSite => self.job_site = value.parse()?,
            Field::ExperienceLevel => self.experience_level = value.parse()?,
            Field::EmploymentType => self.employment_type = value.parse()?,
            Field::EducationLevel => self.education_level = value.parse()?,
            Field::SalaryRange => self.salary_range = value.parse()?,
            Field::Deadline => self.deadline = value,
            Field::PersonnelCount => self.personnel_count = value,
            other => return Err(UpdateError::NotEditable(other)),
        }
        Ok(())
    }
}

/// Flat record collected by the single-job form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleJobForm {
    pub email: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub work_location: String,
    pub job_site: JobSite,
    pub experience_level: ExperienceLevel,
    pub employment_type: EmploymentType,
    pub salary_range: SalaryRange,
    pub deadline: String,
    pub contact_phone: String,
}

impl SingleJobForm {
    pub fn set(&mut self, field: Field, value: String) -> Result<(), UpdateError> {
        match field {
            Field::Email => self.email = value,
            Field::CompanyName => self.company_name = value,
            Field::ContactPhone => self.contact_phone = value,
            Field::JobTitle => self.job_title = value,
            Field::JobDescription => self.job_description = value,
            Field::WorkLocation => self.work_location = value,
            Field::JobSite => self.job_site = value.parse()?,
            Field::ExperienceLevel => self.experience_level = value.parse()?,
            Field::EmploymentType => self.employment_type = value.parse()?,
            Field::SalaryRange => self.salary_range = value.parse()?,
            Field::Deadline => self.deadline = value,
            other => return Err(UpdateError::NotEditable(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiJobForm {
    pub company: CompanyInfo,
    pub jobs: Vec<JobDetails>,
}

impl MultiJobForm {
    /// Replace the entry with the same id in place, or append it
    pub fn upsert(&mut self, job: JobDetails) {
        match self.jobs.iter_mut().find(|existing| existing.id == job.id) {
            Some(slot) => *slot = job,
            None => self.jobs.push(job),
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.id != id);
        self.jobs.len() != before
    }
}

/// Aggregate root of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormData {
    Single(SingleJobForm),
    Multi(MultiJobForm),
}

impl FormData {
    pub fn empty(variant: Variant) -> Self {
        match variant {
            Variant::Single => FormData::Single(SingleJobForm::default()),
            Variant::Multi => FormData::Multi(MultiJobForm::default()),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            FormData::Single(_) => Variant::Single,
            FormData::Multi(_) => Variant::Multi,
        }
    }
}

/// Opaque client-side identifier for jobs and sessions
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_their_labels() {
        for level in EducationLevel::ALL {
            assert_eq!(level.label().parse::<EducationLevel>(), Ok(*level));
        }
        assert_eq!("Remote".parse::<JobSite>(), Ok(JobSite::Remote));
        assert!("remote".parse::<JobSite>().is_err());
    }

    #[test]
    fn enums_serialize_as_labels() {
        let json = serde_json::to_value(SalaryRange::TwentyToFifty).unwrap();
        assert_eq!(json, serde_json::json!("20,000 - 50,000 Birr"));
    }

    #[test]
    fn new_jobs_get_distinct_ids_and_defaults() {
        let a = JobDetails::new();
        let b = JobDetails::new();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
        assert_eq!(a.experience_level, ExperienceLevel::Junior);
        assert_eq!(a.education_level, EducationLevel::Bachelors);
        assert_eq!(a.job_site, JobSite::OnSite);
    }

    #[test]
    fn setting_an_enum_field_rejects_unknown_labels() {
        let mut job = JobDetails::new();
        let err = job
            .set(Field::SalaryRange, "A lot".to_string())
            .unwrap_err();
        assert!(matches!(err, UpdateError::InvalidValue(_)));
        assert_eq!(job.salary_range, SalaryRange::Negotiable);
    }

    #[test]
    fn company_info_only_accepts_company_fields() {
        let mut company = CompanyInfo::default();
        company.set(Field::Email, "hr@acme.com".into()).unwrap();
        assert_eq!(company.email, "hr@acme.com");
        assert_eq!(
            company.set(Field::JobTitle, "Engineer".into()),
            Err(UpdateError::NotEditable(Field::JobTitle))
        );
    }

    #[test]
    fn single_form_has_no_headcount() {
        let mut form = SingleJobForm::default();
        assert_eq!(
            form.set(Field::PersonnelCount, "3".into()),
            Err(UpdateError::NotEditable(Field::PersonnelCount))
        );
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let mut form = MultiJobForm::default();
        let mut first = JobDetails::new();
        first.job_title = "First".into();
        let second = JobDetails::new();
        form.upsert(first.clone());
        form.upsert(second.clone());

        first.job_title = "Renamed".into();
        form.upsert(first.clone());

        assert_eq!(form.jobs.len(), 2);
        assert_eq!(form.jobs[0].job_title, "Renamed");
        assert_eq!(form.jobs[1].id, second.id);
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("Single".parse::<Variant>(), Ok(Variant::Single));
        assert_eq!(" multi ".parse::<Variant>(), Ok(Variant::Multi));
        assert!("triple".parse::<Variant>().is_err());
    }
}

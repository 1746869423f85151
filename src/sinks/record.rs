use serde::Serialize;

use crate::intake::models::{
    CompanyInfo, EducationLevel, EmploymentType, ExperienceLevel, JobDetails, JobSite,
    SalaryRange, SingleJobForm,
};

/// One job request as delivered to the sinks
///
/// Column names mirror the data store table. Education and headcount are
/// only collected by the multi-job form and are omitted otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequestRecord {
    pub email: String,
    pub company_name: String,
    pub contact_phone: String,
    pub job_title: String,
    pub job_description: String,
    pub work_location: String,
    pub job_site: JobSite,
    pub experience_level: ExperienceLevel,
    pub employment_type: EmploymentType,
    pub salary_range: SalaryRange,
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<EducationLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personnel_count: Option<u32>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<&SingleJobForm> for JobRequestRecord {
    fn from(form: &SingleJobForm) -> Self {
        Self {
            email: form.email.clone(),
            company_name: form.company_name.clone(),
            contact_phone: form.contact_phone.clone(),
            job_title: form.job_title.clone(),
            job_description: form.job_description.clone(),
            work_location: form.work_location.clone(),
            job_site: form.job_site,
            experience_level: form.experience_level,
            employment_type: form.employment_type,
            salary_range: form.salary_range,
            deadline: non_empty(&form.deadline),
            education_level: None,
            personnel_count: None,
        }
    }
}

impl JobRequestRecord {
    pub fn for_job(company: &CompanyInfo, job: &JobDetails) -> Self {
        Self {
            email: company.email.clone(),
            company_name: company.company_name.clone(),
            contact_phone: company.contact_phone.clone(),
            job_title: job.job_title.clone(),
            job_description: job.job_description.clone(),
            work_location: job.work_location.clone(),
            job_site: job.job_site,
            experience_level: job.experience_level,
            employment_type: job.employment_type,
            salary_range: job.salary_range,
            deadline: non_empty(&job.deadline),
            education_level: Some(job.education_level),
            personnel_count: job.personnel_count.trim().parse().ok(),
        }
    }
}

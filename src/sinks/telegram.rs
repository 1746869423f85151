use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{JobRequestRecord, Sink, SinkError, SinkKind};
use crate::config::NotificationConfig;

/// Longest description excerpt included in an alert
pub const DESCRIPTION_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Posts a markdown summary of each job request to a chat via a bot
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(config: &NotificationConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &NotificationConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", config.api_base, config.token),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl Sink for TelegramSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Notification
    }

    async fn submit(&self, record: &JobRequestRecord) -> Result<(), SinkError> {
        debug!("Sending alert for '{}' to chat {}", record.job_title, self.chat_id);

        let body = SendMessage {
            chat_id: &self.chat_id,
            text: format_message(record),
            parse_mode: "Markdown",
        };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(status.as_u16()))
        }
    }
}

fn preview(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let head: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        description.to_string()
    }
}

pub fn format_message(record: &JobRequestRecord) -> String {
    let mut text = format!(
        "🚀 *New Recruitment Request*\n\n\
         *Company:* {}\n\
         *Job Title:* {}\n\
         *Email:* {}\n\
         *Phone:* {}\n\n\
         *Location:* {} ({})\n\
         *Experience:* {}\n",
        record.company_name,
        record.job_title,
        record.email,
        record.contact_phone,
        record.work_location,
        record.job_site,
        record.experience_level,
    );
    if let Some(education) = record.education_level {
        text.push_str(&format!("*Education:* {education}\n"));
    }
    if let Some(count) = record.personnel_count {
        text.push_str(&format!("*Headcount:* {count}\n"));
    }
    text.push_str(&format!(
        "*Salary:* {}\n*Deadline:* {}\n\n*Description:*\n{}\n\n#Afriwork #Recruitment #Hiring",
        record.salary_range,
        record.deadline.as_deref().unwrap_or("Not set"),
        preview(&record.job_description),
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::models::{CompanyInfo, JobDetails, SingleJobForm};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> NotificationConfig {
        NotificationConfig {
            api_base,
            token: "123:abc".to_string(),
            chat_id: "-10042".to_string(),
        }
    }

    fn record() -> JobRequestRecord {
        let company = CompanyInfo {
            email: "hr@acme.com".into(),
            company_name: "Acme".into(),
            contact_phone: "+251911223344".into(),
        };
        let job = JobDetails {
            job_title: "Engineer".into(),
            job_description: "Build things".into(),
            work_location: "Addis Ababa".into(),
            personnel_count: "2".into(),
            ..JobDetails::new()
        };
        JobRequestRecord::for_job(&company, &job)
    }

    #[test]
    fn message_summarises_company_and_job() {
        let text = format_message(&record());
        assert!(text.contains("*Company:* Acme"));
        assert!(text.contains("*Location:* Addis Ababa (On-Site)"));
        assert!(text.contains("*Headcount:* 2"));
        assert!(text.contains("*Deadline:* Not set"));
        assert!(text.ends_with("Build things\n\n#Afriwork #Recruitment #Hiring"));
    }

    #[test]
    fn single_form_message_omits_multi_job_lines() {
        let text = format_message(&JobRequestRecord::from(&SingleJobForm::default()));
        assert!(!text.contains("*Headcount:*"));
        assert!(!text.contains("*Education:*"));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let mut record = record();
        record.job_description = "é".repeat(DESCRIPTION_PREVIEW_CHARS + 20);
        let text = format_message(&record);
        let expected = format!("{}...", "é".repeat(DESCRIPTION_PREVIEW_CHARS));
        assert!(text.contains(&expected));
        assert!(!text.contains(&format!("{}é", expected.trim_end_matches("..."))));

        record.job_description = "x".repeat(DESCRIPTION_PREVIEW_CHARS);
        assert!(!format_message(&record).contains("..."));
    }

    #[tokio::test]
    async fn posts_to_bot_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "-10042",
                "parse_mode": "Markdown"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let sink = TelegramSink::new(&config(server.uri()));
        sink.submit(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_message_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let sink = TelegramSink::new(&config(server.uri()));
        assert!(matches!(
            sink.submit(&record()).await,
            Err(SinkError::Status(400))
        ));
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// Declares a closed set of string-valued variants with their wire names.
macro_rules! str_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = PortalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        PortalError::Validation(format!(
                            "unknown {} '{}' (expected one of: {})",
                            stringify!($name),
                            s,
                            options.join(", ")
                        ))
                    })
            }
        }
    };
}

str_enum! {
    pub enum Role {
        Admin => "admin",
        Student => "student",
        Employer => "employer",
        PlacementOfficer => "placement_officer",
    }
}

str_enum! {
    pub enum JobType {
        FullTime => "full_time",
        PartTime => "part_time",
        Internship => "internship",
        Contract => "contract",
    }
}

str_enum! {
    pub enum ApplicationStatus {
        Pending => "pending",
        UnderReview => "under_review",
        Shortlisted => "shortlisted",
        InterviewScheduled => "interview_scheduled",
        Interviewed => "interviewed",
        Offered => "offered",
        Accepted => "accepted",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
        OnHold => "on_hold",
    }
}

impl ApplicationStatus {
    /// Closed applications no longer count against re-applying.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

str_enum! {
    pub enum InterviewStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
        Rescheduled => "rescheduled",
    }
}

str_enum! {
    pub enum InterviewMode {
        Online => "online",
        InPerson => "in_person",
    }
}

str_enum! {
    pub enum NotificationType {
        Application => "application",
        Interview => "interview",
        Message => "message",
        Job => "job",
        Placement => "placement",
        System => "system",
    }
}

str_enum! {
    pub enum DocumentType {
        Resume => "resume",
        CoverLetter => "cover_letter",
        Transcript => "transcript",
        Certificate => "certificate",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: Option<String>,
    pub application_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Active and not past its deadline on `today`.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.application_deadline.is_none_or(|d| d >= today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub student_id: String,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub student_id: String,
    pub job_id: String,
    pub company: String,
    pub package: f64, // LPA
    pub placed_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: String,
    pub application_id: String,
    pub student_id: String,
    pub employer_id: String,
    pub date: DateTime<Utc>,
    pub mode: InterviewMode,
    pub location: Option<String>, // room or meeting link
    pub status: InterviewStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub size: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_public: bool,
    pub is_favorite: bool,
    pub download_count: u32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub full_name: String,
    pub department: Option<String>,
    pub graduation_year: Option<i32>,
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub application_updates: bool,
    pub interview_reminders: bool,
    pub messages: bool,
    pub job_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            application_updates: true,
            interview_reminders: true,
            messages: true,
            job_alerts: true,
        }
    }
}

impl NotificationSettings {
    pub fn set(&mut self, name: &str, value: bool) -> Result<(), PortalError> {
        let slot = match name.trim().to_lowercase().replace('-', "_").as_str() {
            "email" => &mut self.email,
            "push" => &mut self.push,
            "application_updates" => &mut self.application_updates,
            "interview_reminders" => &mut self.interview_reminders,
            "messages" => &mut self.messages,
            "job_alerts" => &mut self.job_alerts,
            _ => {
                return Err(PortalError::Validation(format!(
                    "unknown notification setting '{}'",
                    name
                )));
            }
        };
        *slot = value;
        Ok(())
    }

    /// Whether notifications of `kind` should be delivered.
    pub fn allows(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::Application | NotificationType::Placement => {
                self.application_updates
            }
            NotificationType::Interview => self.interview_reminders,
            NotificationType::Message => self.messages,
            NotificationType::Job => self.job_alerts,
            NotificationType::System => true,
        }
    }
}

/// The single blob holding every mock entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalData {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub interviews: Vec<Interview>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_wire_names_and_dashes() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(
            "placement-officer".parse::<Role>().unwrap(),
            Role::PlacementOfficer
        );
        assert_eq!(" Student ".parse::<Role>().unwrap(), Role::Student);
        assert!("recruiter".parse::<Role>().is_err());
    }

    #[test]
    fn test_application_status_has_ten_values() {
        assert_eq!(ApplicationStatus::ALL.len(), 10);
        let json = serde_json::to_string(&ApplicationStatus::InterviewScheduled).unwrap();
        assert_eq!(json, "\"interview_scheduled\"");
    }

    #[test]
    fn test_message_uses_camel_case_keys() {
        let msg = Message {
            id: "m1".to_string(),
            conversation_id: "1-2".to_string(),
            sender_id: "1".to_string(),
            receiver_id: "2".to_string(),
            content: "hi".to_string(),
            timestamp: Utc::now(),
            read: false,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["conversationId"], "1-2");
        assert_eq!(value["senderId"], "1");
    }

    #[test]
    fn test_job_open_respects_deadline_and_flag() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut job = Job {
            id: "j".to_string(),
            employer_id: "3".to_string(),
            title: "Engineer".to_string(),
            description: String::new(),
            requirements: vec![],
            location: "Remote".to_string(),
            job_type: JobType::FullTime,
            salary_range: None,
            application_deadline: Some(today),
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(job.is_open_on(today));
        assert!(!job.is_open_on(today.succ_opt().unwrap()));
        job.is_active = false;
        assert!(!job.is_open_on(today));
    }

    #[test]
    fn test_notification_settings_set_and_allows() {
        let mut settings = NotificationSettings::default();
        settings.set("job-alerts", false).unwrap();
        assert!(!settings.allows(NotificationType::Job));
        assert!(settings.allows(NotificationType::System));
        assert!(settings.set("carrier_pigeon", true).is_err());
    }
}

use chrono::{DateTime, Duration, Utc};

use crate::messaging::conversation_id;
use crate::models::{
    Application, ApplicationStatus, Document, DocumentType, Interview, InterviewMode,
    InterviewStatus, Job, JobType, Message, Notification, NotificationType, PortalData,
    Placement, Profile,
};

/// Default records written on first access, dated relative to `now`.
pub fn default_data(now: DateTime<Utc>) -> PortalData {
    let today = now.date_naive();
    let days_ago = |n: i64| now - Duration::days(n);

    let jobs = vec![
        Job {
            id: "1".to_string(),
            employer_id: "3".to_string(),
            title: "Software Engineer".to_string(),
            description: "Build and maintain customer-facing web applications.".to_string(),
            requirements: strings(&["JavaScript", "React", "Node.js", "SQL"]),
            location: "Bangalore".to_string(),
            job_type: JobType::FullTime,
            salary_range: Some("8-12 LPA".to_string()),
            application_deadline: Some(today + Duration::days(30)),
            is_active: true,
            created_at: days_ago(15),
        },
        Job {
            id: "2".to_string(),
            employer_id: "3".to_string(),
            title: "Data Analyst Intern".to_string(),
            description: "Support the analytics team with reporting and dashboards.".to_string(),
            requirements: strings(&["Python", "SQL", "Excel", "Data Analysis"]),
            location: "Hyderabad".to_string(),
            job_type: JobType::Internship,
            salary_range: Some("25k/month".to_string()),
            application_deadline: Some(today + Duration::days(20)),
            is_active: true,
            created_at: days_ago(12),
        },
        Job {
            id: "3".to_string(),
            employer_id: "6".to_string(),
            title: "DevOps Engineer".to_string(),
            description: "Own CI/CD pipelines and cloud infrastructure.".to_string(),
            requirements: strings(&["Docker", "Kubernetes", "AWS", "Git"]),
            location: "Pune".to_string(),
            job_type: JobType::FullTime,
            salary_range: Some("10-15 LPA".to_string()),
            application_deadline: Some(today + Duration::days(45)),
            is_active: true,
            created_at: days_ago(60),
        },
        Job {
            id: "4".to_string(),
            employer_id: "3".to_string(),
            title: "Frontend Developer".to_string(),
            description: "Contract role building design-system components.".to_string(),
            requirements: strings(&["HTML", "CSS", "TypeScript", "Angular"]),
            location: "Remote".to_string(),
            job_type: JobType::Contract,
            salary_range: Some("6-9 LPA".to_string()),
            application_deadline: Some(today - Duration::days(5)),
            is_active: false,
            created_at: days_ago(90),
        },
        Job {
            id: "5".to_string(),
            employer_id: "6".to_string(),
            title: "Machine Learning Engineer".to_string(),
            description: "Train and ship recommendation models.".to_string(),
            requirements: strings(&["Python", "Machine Learning", "Django"]),
            location: "Bangalore".to_string(),
            job_type: JobType::FullTime,
            salary_range: Some("12-18 LPA".to_string()),
            application_deadline: Some(today + Duration::days(25)),
            is_active: true,
            created_at: days_ago(8),
        },
    ];

    let applications = vec![
        Application {
            id: "1".to_string(),
            job_id: "1".to_string(),
            student_id: "2".to_string(),
            status: ApplicationStatus::UnderReview,
            cover_letter: Some("I have built several React projects.".to_string()),
            applied_at: days_ago(10),
            updated_at: days_ago(6),
        },
        Application {
            id: "2".to_string(),
            job_id: "2".to_string(),
            student_id: "2".to_string(),
            status: ApplicationStatus::InterviewScheduled,
            cover_letter: None,
            applied_at: days_ago(7),
            updated_at: days_ago(2),
        },
        Application {
            id: "3".to_string(),
            job_id: "3".to_string(),
            student_id: "5".to_string(),
            status: ApplicationStatus::Accepted,
            cover_letter: Some("Hands-on with Docker and AWS from internships.".to_string()),
            applied_at: days_ago(40),
            updated_at: days_ago(20),
        },
        Application {
            id: "4".to_string(),
            job_id: "5".to_string(),
            student_id: "5".to_string(),
            status: ApplicationStatus::Pending,
            cover_letter: None,
            applied_at: days_ago(2),
            updated_at: days_ago(2),
        },
    ];

    let placements = vec![Placement {
        id: "1".to_string(),
        student_id: "5".to_string(),
        job_id: "3".to_string(),
        company: "DataSys Solutions".to_string(),
        package: 12.5,
        placed_date: today - Duration::days(20),
    }];

    let interviews = vec![Interview {
        id: "1".to_string(),
        application_id: "2".to_string(),
        student_id: "2".to_string(),
        employer_id: "3".to_string(),
        date: now + Duration::days(3),
        mode: InterviewMode::Online,
        location: Some("https://meet.example.com/data-analyst".to_string()),
        status: InterviewStatus::Scheduled,
    }];

    let messages = vec![
        seed_message("1", "3", "2", "Thanks for applying to the Software Engineer role.", days_ago(5), true),
        seed_message("2", "2", "3", "Thank you! Happy to share more project details.", days_ago(5) + Duration::hours(2), true),
        seed_message("3", "3", "2", "Could you send your latest transcript?", days_ago(1), false),
        seed_message("4", "4", "2", "Placement drive registration closes Friday.", days_ago(3), false),
    ];

    let notifications = vec![Notification {
        id: "1".to_string(),
        user_id: "2".to_string(),
        kind: NotificationType::Interview,
        title: "Interview scheduled".to_string(),
        message: "Your interview for Data Analyst Intern is in 3 days.".to_string(),
        timestamp: days_ago(2),
        read: false,
    }];

    let documents = vec![
        Document {
            id: "1".to_string(),
            user_id: "2".to_string(),
            name: "Priya_Sharma_Resume.pdf".to_string(),
            kind: DocumentType::Resume,
            size: 245_760,
            tags: strings(&["resume", "react", "javascript"]),
            is_public: true,
            is_favorite: true,
            download_count: 4,
            uploaded_at: days_ago(14),
        },
        Document {
            id: "2".to_string(),
            user_id: "2".to_string(),
            name: "Semester_Transcript.pdf".to_string(),
            kind: DocumentType::Transcript,
            size: 512_000,
            tags: strings(&["transcript"]),
            is_public: false,
            is_favorite: false,
            download_count: 0,
            uploaded_at: days_ago(30),
        },
    ];

    let profiles = vec![
        Profile {
            user_id: "2".to_string(),
            full_name: "Priya Sharma".to_string(),
            department: Some("Computer Science".to_string()),
            graduation_year: Some(2026),
            cgpa: Some(8.7),
            skills: strings(&["JavaScript", "React", "SQL"]),
            phone: None,
            updated_at: days_ago(14),
        },
        Profile {
            user_id: "5".to_string(),
            full_name: "Arjun Patel".to_string(),
            department: Some("Information Technology".to_string()),
            graduation_year: Some(2026),
            cgpa: Some(8.1),
            skills: strings(&["Docker", "AWS", "Python"]),
            phone: None,
            updated_at: days_ago(40),
        },
    ];

    PortalData {
        jobs,
        applications,
        placements,
        interviews,
        messages,
        notifications,
        documents,
        profiles,
    }
}

fn seed_message(
    id: &str,
    sender: &str,
    receiver: &str,
    content: &str,
    timestamp: DateTime<Utc>,
    read: bool,
) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id(sender, receiver),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        content: content.to_string(),
        timestamp,
        read,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_ids_are_unique_per_collection() {
        let data = default_data(Utc::now());
        let job_ids: HashSet<_> = data.jobs.iter().map(|j| &j.id).collect();
        assert_eq!(job_ids.len(), data.jobs.len());
        let app_ids: HashSet<_> = data.applications.iter().map(|a| &a.id).collect();
        assert_eq!(app_ids.len(), data.applications.len());
    }

    #[test]
    fn test_seed_applications_reference_seed_jobs() {
        let data = default_data(Utc::now());
        for app in &data.applications {
            assert!(data.jobs.iter().any(|j| j.id == app.job_id), "dangling {}", app.id);
        }
    }

    #[test]
    fn test_seed_messages_use_sorted_conversation_ids() {
        let data = default_data(Utc::now());
        assert!(data.messages.iter().all(|m| m.conversation_id == "2-3" || m.conversation_id == "2-4"));
    }
}

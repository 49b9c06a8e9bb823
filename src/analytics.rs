use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    Application, ApplicationStatus, Interview, InterviewStatus, PortalData, Role, User,
};
use crate::notifications;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub users_by_role: Vec<(Role, usize)>,
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    pub status_breakdown: Vec<(ApplicationStatus, usize)>,
    pub total_placements: usize,
    pub placement_rate: f64,
    pub average_package: Option<f64>,
    pub highest_package: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub total_applications: usize,
    pub status_breakdown: Vec<(ApplicationStatus, usize)>,
    pub upcoming_interviews: Vec<Interview>,
    pub documents: usize,
    pub unread_notifications: usize,
    pub placed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobApplicationCount {
    pub job_id: String,
    pub title: String,
    pub is_active: bool,
    pub applications: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployerSummary {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    pub shortlisted: usize,
    pub per_job: Vec<JobApplicationCount>,
    pub upcoming_interviews: Vec<Interview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficerSummary {
    pub total_students: usize,
    pub placed_students: usize,
    pub placement_rate: f64,
    pub average_package: Option<f64>,
    pub placements_by_company: Vec<(String, usize)>,
    pub monthly_applications: Vec<(String, usize)>,
}

pub const TREND_MONTHS: u32 = 6;

pub fn admin_overview(data: &PortalData, users: &[User]) -> AdminOverview {
    let today = Utc::now().date_naive();
    let packages: Vec<f64> = data.placements.iter().map(|p| p.package).collect();

    AdminOverview {
        users_by_role: Role::ALL
            .iter()
            .map(|role| (*role, users.iter().filter(|u| u.role == *role).count()))
            .collect(),
        total_jobs: data.jobs.len(),
        active_jobs: data.jobs.iter().filter(|j| j.is_open_on(today)).count(),
        total_applications: data.applications.len(),
        status_breakdown: status_breakdown(data.applications.iter()),
        total_placements: data.placements.len(),
        placement_rate: placement_rate(data, users),
        average_package: average(&packages),
        highest_package: packages.iter().copied().reduce(f64::max),
    }
}

pub fn student_summary(data: &PortalData, student_id: &str, now: DateTime<Utc>) -> StudentSummary {
    let mine: Vec<&Application> = data
        .applications
        .iter()
        .filter(|a| a.student_id == student_id)
        .collect();

    StudentSummary {
        total_applications: mine.len(),
        status_breakdown: status_breakdown(mine.iter().copied()),
        upcoming_interviews: upcoming(data, now, |i| i.student_id == student_id),
        documents: data.documents.iter().filter(|d| d.user_id == student_id).count(),
        unread_notifications: notifications::unread_count(data, student_id),
        placed: data.placements.iter().any(|p| p.student_id == student_id),
    }
}

pub fn employer_summary(data: &PortalData, employer_id: &str, now: DateTime<Utc>) -> EmployerSummary {
    let today = now.date_naive();
    let per_job: Vec<JobApplicationCount> = data
        .jobs
        .iter()
        .filter(|j| j.employer_id == employer_id)
        .map(|j| JobApplicationCount {
            job_id: j.id.clone(),
            title: j.title.clone(),
            is_active: j.is_open_on(today),
            applications: data.applications.iter().filter(|a| a.job_id == j.id).count(),
        })
        .collect();
    let job_ids: HashSet<&str> = per_job.iter().map(|j| j.job_id.as_str()).collect();
    let received: Vec<&Application> = data
        .applications
        .iter()
        .filter(|a| job_ids.contains(a.job_id.as_str()))
        .collect();

    EmployerSummary {
        total_jobs: per_job.len(),
        active_jobs: per_job.iter().filter(|j| j.is_active).count(),
        total_applications: received.len(),
        shortlisted: received
            .iter()
            .filter(|a| a.status == ApplicationStatus::Shortlisted)
            .count(),
        per_job,
        upcoming_interviews: upcoming(data, now, |i| i.employer_id == employer_id),
    }
}

pub fn officer_summary(data: &PortalData, users: &[User], now: DateTime<Utc>) -> OfficerSummary {
    let students: HashSet<&str> = students(users);
    let placed: HashSet<&str> = data
        .placements
        .iter()
        .map(|p| p.student_id.as_str())
        .filter(|id| students.contains(id))
        .collect();

    let mut by_company: BTreeMap<&str, usize> = BTreeMap::new();
    for p in &data.placements {
        *by_company.entry(p.company.as_str()).or_default() += 1;
    }
    let mut placements_by_company: Vec<(String, usize)> = by_company
        .into_iter()
        .map(|(company, n)| (company.to_string(), n))
        .collect();
    placements_by_company.sort_by(|a, b| b.1.cmp(&a.1));

    let packages: Vec<f64> = data.placements.iter().map(|p| p.package).collect();

    OfficerSummary {
        total_students: students.len(),
        placed_students: placed.len(),
        placement_rate: placement_rate(data, users),
        average_package: average(&packages),
        placements_by_company,
        monthly_applications: monthly_trend(&data.applications, TREND_MONTHS, now),
    }
}

/// Percentage of students with at least one placement.
pub fn placement_rate(data: &PortalData, users: &[User]) -> f64 {
    let students = students(users);
    if students.is_empty() {
        return 0.0;
    }
    let placed: HashSet<&str> = data
        .placements
        .iter()
        .map(|p| p.student_id.as_str())
        .filter(|id| students.contains(id))
        .collect();
    placed.len() as f64 * 100.0 / students.len() as f64
}

/// Applications per `YYYY-MM` for the last `months` months, oldest first.
pub fn monthly_trend(applications: &[Application], months: u32, now: DateTime<Utc>) -> Vec<(String, usize)> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..months as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            let key = format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1);
            let count = applications
                .iter()
                .filter(|a| a.applied_at.format("%Y-%m").to_string() == key)
                .count();
            (key, count)
        })
        .collect()
}

fn status_breakdown<'a>(apps: impl Iterator<Item = &'a Application>) -> Vec<(ApplicationStatus, usize)> {
    let mut counts: Vec<(ApplicationStatus, usize)> =
        ApplicationStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for app in apps {
        if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == app.status) {
            slot.1 += 1;
        }
    }
    counts.retain(|(_, n)| *n > 0);
    counts
}

fn upcoming(data: &PortalData, now: DateTime<Utc>, is_party: impl Fn(&Interview) -> bool) -> Vec<Interview> {
    let mut interviews: Vec<Interview> = data
        .interviews
        .iter()
        .filter(|i| is_party(*i))
        .filter(|i| {
            i.date >= now
                && matches!(i.status, InterviewStatus::Scheduled | InterviewStatus::Rescheduled)
        })
        .cloned()
        .collect();
    interviews.sort_by(|a, b| a.date.cmp(&b.date));
    interviews
}

fn students(users: &[User]) -> HashSet<&str> {
    users
        .iter()
        .filter(|u| u.role == Role::Student)
        .map(|u| u.id.as_str())
        .collect()
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::mock_users;
    use crate::seed::default_data;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_admin_overview_on_seed() {
        let data = default_data(Utc::now());
        let overview = admin_overview(&data, &mock_users());
        assert_eq!(overview.total_jobs, 5);
        assert_eq!(overview.active_jobs, 4);
        assert_eq!(overview.total_applications, 4);
        assert_eq!(overview.total_placements, 1);
        assert_eq!(overview.placement_rate, 50.0);
        assert_eq!(overview.average_package, Some(12.5));
        assert_eq!(overview.highest_package, Some(12.5));
        assert!(overview.users_by_role.contains(&(Role::Student, 2)));
        let counted: usize = overview.status_breakdown.iter().map(|(_, n)| n).sum();
        assert_eq!(counted, 4);
    }

    #[test]
    fn test_student_summary_on_seed() {
        let now = Utc::now();
        let data = default_data(now);
        let summary = student_summary(&data, "2", now);
        assert_eq!(summary.total_applications, 2);
        assert_eq!(summary.upcoming_interviews.len(), 1);
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.unread_notifications, 1);
        assert!(!summary.placed);
        assert!(student_summary(&data, "5", now).placed);
    }

    #[test]
    fn test_employer_summary_counts_own_jobs_only() {
        let now = Utc::now();
        let data = default_data(now);
        let summary = employer_summary(&data, "3", now);
        assert_eq!(summary.total_jobs, 3);
        assert_eq!(summary.active_jobs, 2);
        assert_eq!(summary.total_applications, 2);
        assert_eq!(summary.upcoming_interviews.len(), 1);
        assert!(employer_summary(&data, "6", now).upcoming_interviews.is_empty());
    }

    #[test]
    fn test_officer_summary_groups_companies() {
        let now = Utc::now();
        let mut data = default_data(now);
        let mut extra = data.placements[0].clone();
        extra.id = "2".to_string();
        extra.student_id = "2".to_string();
        data.placements.push(extra);

        let summary = officer_summary(&data, &mock_users(), now);
        assert_eq!(summary.placements_by_company, vec![("DataSys Solutions".to_string(), 2)]);
        assert_eq!(summary.placed_students, 2);
        assert_eq!(summary.placement_rate, 100.0);
        assert_eq!(summary.monthly_applications.len(), TREND_MONTHS as usize);
    }

    #[test]
    fn test_placement_rate_without_students_is_zero() {
        let data = default_data(Utc::now());
        assert_eq!(placement_rate(&data, &[]), 0.0);
    }

    #[test]
    fn test_monthly_trend_wraps_year_and_zero_fills() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap();
        let mut apps = default_data(now).applications;
        apps[0].applied_at = Utc.with_ymd_and_hms(2025, 12, 3, 9, 0, 0).unwrap();
        apps[1].applied_at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        apps[2].applied_at = Utc.with_ymd_and_hms(2026, 2, 10, 9, 0, 0).unwrap();
        apps[3].applied_at = now - Duration::days(400);

        let trend = monthly_trend(&apps, 3, now);
        assert_eq!(
            trend,
            vec![
                ("2025-12".to_string(), 1),
                ("2026-01".to_string(), 0),
                ("2026-02".to_string(), 2),
            ]
        );
    }
}

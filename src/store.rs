use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::DEFAULT_SESSION_TTL_MINUTES;
use crate::error::{PortalError, Result};
use crate::models::{
    Application, ApplicationStatus, Document, DocumentType, Interview, InterviewMode,
    InterviewStatus, Job, JobType, NotificationType, PortalData, Placement, Profile, Role,
};
use crate::notifications::push_notification;
use crate::seed;
use crate::storage::{DATA_KEY, Storage};

/// The whole-blob store: every mutation reads the blob, changes one
/// collection, and writes the blob back. Last writer wins.
pub struct Store {
    storage: Box<dyn Storage>,
    session_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub employer_id: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary_range: Option<String>,
    pub application_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub active_only: bool,
    pub employer_id: Option<String>,
    pub job_type: Option<JobType>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlacement {
    pub student_id: String,
    pub job_id: String,
    pub company: String,
    pub package: f64,
    pub placed_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: String,
    pub name: String,
    pub kind: DocumentType,
    pub size: u64,
    pub tags: Vec<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub tag: Option<String>,
    pub favorites_only: bool,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Store {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(crate::storage::MemoryStorage::new())
    }

    // --- Blob access ---

    pub fn get_data(&self) -> Result<PortalData> {
        match self.storage.get_item(DATA_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                error!("Failed to parse stored portal data: {e}");
                e.into()
            }),
            None => {
                let data = seed::default_data(Utc::now());
                self.save_data(&data)?;
                info!("Seeded portal data with default records");
                Ok(data)
            }
        }
    }

    pub fn save_data(&self, data: &PortalData) -> Result<()> {
        let raw = serde_json::to_string(data)
            .inspect_err(|e| error!("Failed to serialize portal data: {e}"))?;
        self.storage
            .set_item(DATA_KEY, &raw)
            .inspect_err(|e| error!("Failed to save portal data: {e}"))
    }

    pub fn reset_data(&self) -> Result<PortalData> {
        let data = seed::default_data(Utc::now());
        self.save_data(&data)?;
        info!("Reset portal data to defaults");
        Ok(data)
    }

    /// Read-modify-write of the whole blob. Nothing is written if `f` fails.
    pub(crate) fn update<T>(&self, f: impl FnOnce(&mut PortalData) -> Result<T>) -> Result<T> {
        let mut data = self.get_data()?;
        let out = f(&mut data)?;
        self.save_data(&data)?;
        Ok(out)
    }

    pub(crate) fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self
            .storage
            .get_item(key)
            .inspect_err(|e| error!("Failed to read {key}: {e}"))?;
        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).inspect_err(|e| error!("Failed to parse {key}: {e}"))?,
            )),
            None => Ok(None),
        }
    }

    pub(crate) fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .inspect_err(|e| error!("Failed to serialize {key}: {e}"))?;
        self.storage
            .set_item(key, &raw)
            .inspect_err(|e| error!("Failed to save {key}: {e}"))
    }

    pub(crate) fn remove_key(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key)
    }

    // --- Job operations ---

    pub fn add_job(&self, new: NewJob) -> Result<Job> {
        if new.title.trim().is_empty() {
            return Err(PortalError::Validation("job title is required".to_string()));
        }
        let job = Job {
            id: new_id(),
            employer_id: new.employer_id,
            title: new.title.trim().to_string(),
            description: new.description,
            requirements: new
                .requirements
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            location: new.location,
            job_type: new.job_type,
            salary_range: new.salary_range,
            application_deadline: new.application_deadline,
            is_active: true,
            created_at: Utc::now(),
        };
        self.update(|data| {
            data.jobs.push(job.clone());
            Ok(())
        })?;
        info!(job_id = %job.id, employer_id = %job.employer_id, "Added job '{}'", job.title);
        Ok(job)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let data = self.get_data()?;
        let today = Utc::now().date_naive();
        let search = filter.search.as_deref().map(str::to_lowercase);

        let mut jobs: Vec<Job> = data
            .jobs
            .into_iter()
            .filter(|j| !filter.active_only || j.is_open_on(today))
            .filter(|j| filter.employer_id.as_ref().is_none_or(|e| &j.employer_id == e))
            .filter(|j| filter.job_type.is_none_or(|t| j.job_type == t))
            .filter(|j| {
                search.as_ref().is_none_or(|s| {
                    j.title.to_lowercase().contains(s)
                        || j.location.to_lowercase().contains(s)
                        || j.requirements.iter().any(|r| r.to_lowercase().contains(s))
                })
            })
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Listed {} jobs", jobs.len());
        Ok(jobs)
    }

    pub fn get_job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.get_data()?.jobs.into_iter().find(|j| j.id == id))
    }

    pub fn set_job_active(&self, id: &str, active: bool) -> Result<Job> {
        self.update(|data| {
            let job = data
                .jobs
                .iter_mut()
                .find(|j| j.id == id)
                .ok_or_else(|| PortalError::not_found("Job", id))?;
            job.is_active = active;
            Ok(job.clone())
        })
    }

    pub fn delete_job(&self, id: &str, employer_id: &str) -> Result<()> {
        self.update(|data| {
            let idx = data
                .jobs
                .iter()
                .position(|j| j.id == id)
                .ok_or_else(|| PortalError::not_found("Job", id))?;
            if data.jobs[idx].employer_id != employer_id {
                warn!(job_id = id, "Rejected delete by non-owner {employer_id}");
                return Err(PortalError::Forbidden {
                    role: Role::Employer,
                    action: "delete a job posted by another employer".to_string(),
                });
            }
            data.jobs.remove(idx);
            Ok(())
        })?;
        info!(job_id = id, "Deleted job");
        Ok(())
    }

    // --- Application operations ---

    pub fn add_application(
        &self,
        job_id: &str,
        student_id: &str,
        cover_letter: Option<String>,
    ) -> Result<Application> {
        let settings = self.notification_settings()?;
        let now = Utc::now();

        let application = self.update(|data| {
            let job = data
                .jobs
                .iter()
                .find(|j| j.id == job_id)
                .ok_or_else(|| PortalError::not_found("Job", job_id))?;
            if !job.is_open_on(now.date_naive()) {
                return Err(PortalError::Validation(format!(
                    "job '{}' is no longer accepting applications",
                    job.title
                )));
            }
            let already_applied = data.applications.iter().any(|a| {
                a.job_id == job_id && a.student_id == student_id && !a.status.is_closed()
            });
            if already_applied {
                return Err(PortalError::Conflict(format!(
                    "student {} already applied to job {}",
                    student_id, job_id
                )));
            }

            let title = job.title.clone();
            let employer_id = job.employer_id.clone();
            let application = Application {
                id: new_id(),
                job_id: job_id.to_string(),
                student_id: student_id.to_string(),
                status: ApplicationStatus::Pending,
                cover_letter: cover_letter.filter(|c| !c.trim().is_empty()),
                applied_at: now,
                updated_at: now,
            };
            data.applications.push(application.clone());
            push_notification(
                data,
                &settings,
                &employer_id,
                NotificationType::Application,
                "New application",
                &format!("A student applied to {}", title),
                now,
            );
            Ok(application)
        })?;
        info!(application_id = %application.id, job_id, student_id, "Added application");
        Ok(application)
    }

    pub fn get_application(&self, id: &str) -> Result<Option<Application>> {
        Ok(self
            .get_data()?
            .applications
            .into_iter()
            .find(|a| a.id == id))
    }

    pub fn applications_for_student(&self, student_id: &str) -> Result<Vec<Application>> {
        let mut apps: Vec<Application> = self
            .get_data()?
            .applications
            .into_iter()
            .filter(|a| a.student_id == student_id)
            .collect();
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    pub fn applications_for_job(&self, job_id: &str) -> Result<Vec<Application>> {
        let mut apps: Vec<Application> = self
            .get_data()?
            .applications
            .into_iter()
            .filter(|a| a.job_id == job_id)
            .collect();
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    /// Applications to any job posted by `employer_id`.
    pub fn applications_for_employer(&self, employer_id: &str) -> Result<Vec<Application>> {
        let data = self.get_data()?;
        let mut apps: Vec<Application> = data
            .applications
            .iter()
            .filter(|a| {
                data.jobs
                    .iter()
                    .any(|j| j.id == a.job_id && j.employer_id == employer_id)
            })
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(apps)
    }

    pub fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let settings = self.notification_settings()?;
        let now = Utc::now();
        let application = self.update(|data| {
            let (app, title) = {
                let app = data
                    .applications
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| PortalError::not_found("Application", id))?;
                if app.status.is_closed() {
                    warn!(application_id = id, "Rejected change to a {} application", app.status);
                    return Err(PortalError::Conflict(format!(
                        "application is already {}",
                        app.status
                    )));
                }
                app.status = status;
                app.updated_at = now;
                let app = app.clone();
                let title = data
                    .jobs
                    .iter()
                    .find(|j| j.id == app.job_id)
                    .map(|j| j.title.clone())
                    .unwrap_or_else(|| "a job".to_string());
                (app, title)
            };
            push_notification(
                data,
                &settings,
                &app.student_id,
                NotificationType::Application,
                "Application status updated",
                &format!(
                    "Your application for {} is now {}",
                    title,
                    status.as_str().replace('_', " ")
                ),
                now,
            );
            Ok(app)
        })?;
        info!(application_id = id, "Application status set to {status}");
        Ok(application)
    }

    pub fn withdraw_application(&self, id: &str, student_id: &str) -> Result<Application> {
        self.update(|data| {
            let app = data
                .applications
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| PortalError::not_found("Application", id))?;
            if app.student_id != student_id {
                return Err(PortalError::Forbidden {
                    role: Role::Student,
                    action: "withdraw another student's application".to_string(),
                });
            }
            if app.status.is_closed() {
                return Err(PortalError::Conflict(format!(
                    "application is already {}",
                    app.status
                )));
            }
            app.status = ApplicationStatus::Withdrawn;
            app.updated_at = Utc::now();
            Ok(app.clone())
        })
    }

    // --- Placement operations ---

    pub fn add_placement(&self, new: NewPlacement) -> Result<Placement> {
        if !new.package.is_finite() || new.package < 0.0 {
            return Err(PortalError::Validation(
                "package must be a non-negative number".to_string(),
            ));
        }
        let settings = self.notification_settings()?;
        let now = Utc::now();
        let placement = self.update(|data| {
            if !data.jobs.iter().any(|j| j.id == new.job_id) {
                return Err(PortalError::not_found("Job", new.job_id.clone()));
            }
            let placement = Placement {
                id: new_id(),
                student_id: new.student_id.clone(),
                job_id: new.job_id.clone(),
                company: new.company.trim().to_string(),
                package: new.package,
                placed_date: new.placed_date.unwrap_or_else(|| now.date_naive()),
            };
            for app in data.applications.iter_mut().filter(|a| {
                a.student_id == placement.student_id
                    && a.job_id == placement.job_id
                    && !a.status.is_closed()
            }) {
                app.status = ApplicationStatus::Accepted;
                app.updated_at = now;
            }
            data.placements.push(placement.clone());
            push_notification(
                data,
                &settings,
                &placement.student_id,
                NotificationType::Placement,
                "Congratulations!",
                &format!(
                    "You have been placed at {} ({:.1} LPA)",
                    placement.company, placement.package
                ),
                now,
            );
            Ok(placement)
        })?;
        info!(placement_id = %placement.id, "Recorded placement at {}", placement.company);
        Ok(placement)
    }

    pub fn list_placements(&self) -> Result<Vec<Placement>> {
        let mut placements = self.get_data()?.placements;
        placements.sort_by(|a, b| b.placed_date.cmp(&a.placed_date));
        Ok(placements)
    }

    // --- Interview operations ---

    pub fn schedule_interview(
        &self,
        application_id: &str,
        date: DateTime<Utc>,
        mode: InterviewMode,
        location: Option<String>,
    ) -> Result<Interview> {
        let settings = self.notification_settings()?;
        let now = Utc::now();
        if date < now {
            return Err(PortalError::Validation(
                "interview date must be in the future".to_string(),
            ));
        }
        let interview = self.update(|data| {
            let app = data
                .applications
                .iter_mut()
                .find(|a| a.id == application_id)
                .ok_or_else(|| PortalError::not_found("Application", application_id))?;
            if app.status.is_closed() {
                return Err(PortalError::Conflict(format!(
                    "cannot schedule an interview for a {} application",
                    app.status
                )));
            }
            app.status = ApplicationStatus::InterviewScheduled;
            app.updated_at = now;
            let (student_id, job_id) = (app.student_id.clone(), app.job_id.clone());

            let job = data
                .jobs
                .iter()
                .find(|j| j.id == job_id)
                .ok_or_else(|| PortalError::not_found("Job", job_id.clone()))?;
            let interview = Interview {
                id: new_id(),
                application_id: application_id.to_string(),
                student_id,
                employer_id: job.employer_id.clone(),
                date,
                mode,
                location,
                status: InterviewStatus::Scheduled,
            };
            let message = format!(
                "Interview for {} on {}",
                job.title,
                date.format("%Y-%m-%d %H:%M UTC")
            );
            data.interviews.push(interview.clone());
            push_notification(
                data,
                &settings,
                &interview.student_id,
                NotificationType::Interview,
                "Interview scheduled",
                &message,
                now,
            );
            Ok(interview)
        })?;
        info!(interview_id = %interview.id, application_id, "Scheduled interview");
        Ok(interview)
    }

    pub fn update_interview_status(&self, id: &str, status: InterviewStatus) -> Result<Interview> {
        self.update(|data| {
            let interview = data
                .interviews
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| PortalError::not_found("Interview", id))?;
            interview.status = status;
            let interview = interview.clone();
            if status == InterviewStatus::Completed {
                if let Some(app) = data
                    .applications
                    .iter_mut()
                    .find(|a| a.id == interview.application_id)
                {
                    app.status = ApplicationStatus::Interviewed;
                    app.updated_at = Utc::now();
                }
            }
            Ok(interview)
        })
    }

    /// Interviews where `user_id` is the student or the employer, earliest first.
    pub fn interviews_for_user(
        &self,
        user_id: &str,
        upcoming_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Interview>> {
        let mut interviews: Vec<Interview> = self
            .get_data()?
            .interviews
            .into_iter()
            .filter(|i| i.student_id == user_id || i.employer_id == user_id)
            .filter(|i| !upcoming_only || is_upcoming(i, now))
            .collect();
        interviews.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(interviews)
    }

    // --- Document operations ---

    pub fn upload_document(&self, new: NewDocument) -> Result<Document> {
        if new.name.trim().is_empty() {
            return Err(PortalError::Validation("document name is required".to_string()));
        }
        let document = Document {
            id: new_id(),
            user_id: new.user_id,
            name: new.name.trim().to_string(),
            kind: new.kind,
            size: new.size,
            tags: normalize_tags(new.tags),
            is_public: new.is_public,
            is_favorite: false,
            download_count: 0,
            uploaded_at: Utc::now(),
        };
        self.update(|data| {
            data.documents.push(document.clone());
            Ok(())
        })?;
        info!(document_id = %document.id, "Uploaded document '{}'", document.name);
        Ok(document)
    }

    pub fn documents_for_user(&self, user_id: &str, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let tag = filter.tag.as_deref().map(str::to_lowercase);
        let mut docs: Vec<Document> = self
            .get_data()?
            .documents
            .into_iter()
            .filter(|d| d.user_id == user_id)
            .filter(|d| !filter.favorites_only || d.is_favorite)
            .filter(|d| tag.as_ref().is_none_or(|t| d.tags.iter().any(|dt| dt == t)))
            .collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    pub fn toggle_favorite(&self, id: &str, user_id: &str) -> Result<Document> {
        self.update_own_document(id, user_id, |doc| doc.is_favorite = !doc.is_favorite)
    }

    pub fn set_document_visibility(&self, id: &str, user_id: &str, is_public: bool) -> Result<Document> {
        self.update_own_document(id, user_id, |doc| doc.is_public = is_public)
    }

    /// Counts a download by `requester_id`; private documents are owner-only.
    pub fn record_download(&self, id: &str, requester_id: &str) -> Result<Document> {
        self.update(|data| {
            let doc = data
                .documents
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| PortalError::not_found("Document", id))?;
            if !doc.is_public && doc.user_id != requester_id {
                return Err(PortalError::not_found("Document", id));
            }
            doc.download_count += 1;
            Ok(doc.clone())
        })
    }

    pub fn delete_document(&self, id: &str, user_id: &str) -> Result<()> {
        self.update(|data| {
            let idx = data
                .documents
                .iter()
                .position(|d| d.id == id && d.user_id == user_id)
                .ok_or_else(|| PortalError::not_found("Document", id))?;
            data.documents.remove(idx);
            Ok(())
        })
    }

    fn update_own_document(
        &self,
        id: &str,
        user_id: &str,
        change: impl FnOnce(&mut Document),
    ) -> Result<Document> {
        self.update(|data| {
            let doc = data
                .documents
                .iter_mut()
                .find(|d| d.id == id && d.user_id == user_id)
                .ok_or_else(|| PortalError::not_found("Document", id))?;
            change(doc);
            Ok(doc.clone())
        })
    }

    // --- Profile operations ---

    pub fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self
            .get_data()?
            .profiles
            .into_iter()
            .find(|p| p.user_id == user_id))
    }

    pub fn upsert_profile(&self, mut profile: Profile) -> Result<Profile> {
        if let Some(cgpa) = profile.cgpa {
            if !(0.0..=10.0).contains(&cgpa) {
                return Err(PortalError::Validation("cgpa must be between 0 and 10".to_string()));
            }
        }
        profile.updated_at = Utc::now();
        self.update(|data| {
            match data.profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
                Some(existing) => *existing = profile.clone(),
                None => data.profiles.push(profile.clone()),
            }
            Ok(profile)
        })
    }
}

fn is_upcoming(interview: &Interview, now: DateTime<Utc>) -> bool {
    interview.date >= now
        && matches!(
            interview.status,
            InterviewStatus::Scheduled | InterviewStatus::Rescheduled
        )
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_job(employer_id: &str) -> NewJob {
        NewJob {
            employer_id: employer_id.to_string(),
            title: "Backend Engineer".to_string(),
            description: "APIs".to_string(),
            requirements: vec!["Rust".to_string(), " SQL ".to_string(), "".to_string()],
            location: "Chennai".to_string(),
            job_type: JobType::FullTime,
            salary_range: Some("10 LPA".to_string()),
            application_deadline: None,
        }
    }

    #[test]
    fn test_get_data_seeds_on_first_access() {
        let store = Store::in_memory();
        let data = store.get_data().unwrap();
        assert!(!data.jobs.is_empty());
        assert_eq!(store.get_data().unwrap(), data);
    }

    #[test]
    fn test_blob_round_trips_through_storage() {
        let store = Store::in_memory();
        let mut data = store.get_data().unwrap();
        data.jobs[0].title = "Renamed".to_string();
        store.save_data(&data).unwrap();
        assert_eq!(store.get_data().unwrap(), data);
    }

    #[test]
    fn test_corrupt_side_keys_surface_as_errors() {
        let store = Store::in_memory();
        store
            .storage
            .set_item(crate::storage::SETTINGS_KEY, "{not json")
            .unwrap();
        assert!(matches!(
            store.notification_settings(),
            Err(PortalError::Serialization(_))
        ));
        store.storage.set_item(crate::storage::SESSION_KEY, "[]").unwrap();
        assert!(store.current_session().is_err());
    }

    #[test]
    fn test_add_job_assigns_fresh_id_and_active() {
        let store = Store::in_memory();
        let before: HashSet<String> = store.get_data().unwrap().jobs.into_iter().map(|j| j.id).collect();
        let job = store.add_job(sample_job("3")).unwrap();
        assert!(!before.contains(&job.id));
        assert!(job.is_active);
        assert_eq!(job.requirements, vec!["Rust", "SQL"]);
        assert_eq!(store.get_job(&job.id).unwrap(), Some(job));
    }

    #[test]
    fn test_add_job_requires_title() {
        let store = Store::in_memory();
        let mut new = sample_job("3");
        new.title = "  ".to_string();
        assert!(matches!(store.add_job(new), Err(PortalError::Validation(_))));
    }

    #[test]
    fn test_list_jobs_filters() {
        let store = Store::in_memory();
        let active = store.list_jobs(&JobFilter { active_only: true, ..Default::default() }).unwrap();
        assert!(active.iter().all(|j| j.is_active));
        assert!(!active.iter().any(|j| j.id == "4"));

        let by_employer = store
            .list_jobs(&JobFilter { employer_id: Some("6".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(by_employer.len(), 2);

        let search = store
            .list_jobs(&JobFilter { search: Some("kubernetes".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].id, "3");

        let interns = store
            .list_jobs(&JobFilter { job_type: Some(JobType::Internship), ..Default::default() })
            .unwrap();
        assert!(interns.iter().all(|j| j.job_type == JobType::Internship));
    }

    #[test]
    fn test_delete_job_only_by_owner() {
        let store = Store::in_memory();
        assert!(matches!(
            store.delete_job("1", "6"),
            Err(PortalError::Forbidden { role: Role::Employer, .. })
        ));
        store.delete_job("1", "3").unwrap();
        assert_eq!(store.get_job("1").unwrap(), None);
    }

    #[test]
    fn test_add_application_defaults_to_pending_with_fresh_id() {
        let store = Store::in_memory();
        let existing: HashSet<String> = store
            .get_data()
            .unwrap()
            .applications
            .into_iter()
            .map(|a| a.id)
            .collect();
        let app = store.add_application("3", "2", Some("Keen".to_string())).unwrap();
        assert!(!existing.contains(&app.id));
        assert_eq!(app.status, ApplicationStatus::Pending);

        let employer_notes = store.get_data().unwrap().notifications;
        assert!(employer_notes.iter().any(|n| n.user_id == "6" && n.title == "New application"));
    }

    #[test]
    fn test_add_application_rejects_duplicates_and_closed_jobs() {
        let store = Store::in_memory();
        assert!(matches!(
            store.add_application("1", "2", None),
            Err(PortalError::Conflict(_))
        ));
        assert!(matches!(
            store.add_application("4", "2", None),
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            store.add_application("nope", "2", None),
            Err(PortalError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reapply_after_withdrawal() {
        let store = Store::in_memory();
        assert!(matches!(
            store.withdraw_application("1", "5"),
            Err(PortalError::Forbidden { role: Role::Student, .. })
        ));
        store.withdraw_application("1", "2").unwrap();
        assert!(store.withdraw_application("1", "2").is_err());
        let again = store.add_application("1", "2", None).unwrap();
        assert_eq!(again.status, ApplicationStatus::Pending);
    }

    fn live_applications(store: &Store, student_id: &str, job_id: &str) -> usize {
        store
            .applications_for_student(student_id)
            .unwrap()
            .iter()
            .filter(|a| a.job_id == job_id && !a.status.is_closed())
            .count()
    }

    #[test]
    fn test_withdrawn_application_cannot_be_revived_by_status_change() {
        let store = Store::in_memory();
        store.withdraw_application("1", "2").unwrap();
        store.add_application("1", "2", None).unwrap();

        assert!(matches!(
            store.update_application_status("1", ApplicationStatus::Shortlisted),
            Err(PortalError::Conflict(_))
        ));
        assert_eq!(
            store.get_application("1").unwrap().map(|a| a.status),
            Some(ApplicationStatus::Withdrawn)
        );
        assert_eq!(live_applications(&store, "2", "1"), 1);
    }

    #[test]
    fn test_rejected_application_cannot_get_an_interview() {
        let store = Store::in_memory();
        store
            .update_application_status("1", ApplicationStatus::Rejected)
            .unwrap();
        store.add_application("1", "2", None).unwrap();

        let tomorrow = Utc::now() + Duration::days(1);
        assert!(matches!(
            store.schedule_interview("1", tomorrow, InterviewMode::Online, None),
            Err(PortalError::Conflict(_))
        ));
        assert_eq!(live_applications(&store, "2", "1"), 1);
        assert!(store
            .get_data()
            .unwrap()
            .interviews
            .iter()
            .all(|i| i.application_id != "1"));
    }

    #[test]
    fn test_failed_mutation_leaves_blob_untouched() {
        let store = Store::in_memory();
        let before = store.get_data().unwrap();
        assert!(store.add_application("1", "2", None).is_err());
        assert_eq!(store.get_data().unwrap(), before);
    }

    #[test]
    fn test_update_application_status_notifies_student() {
        let store = Store::in_memory();
        let app = store
            .update_application_status("1", ApplicationStatus::Shortlisted)
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Shortlisted);
        let data = store.get_data().unwrap();
        assert!(data
            .notifications
            .iter()
            .any(|n| n.user_id == "2" && n.message.contains("shortlisted")));
    }

    #[test]
    fn test_applications_for_employer_joins_jobs() {
        let store = Store::in_memory();
        let apps = store.applications_for_employer("6").unwrap();
        let ids: HashSet<&str> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["3", "4"]));
    }

    #[test]
    fn test_add_placement_fresh_id_and_accepts_application() {
        let store = Store::in_memory();
        let placement = store
            .add_placement(NewPlacement {
                student_id: "5".to_string(),
                job_id: "5".to_string(),
                company: "DataSys Solutions".to_string(),
                package: 16.0,
                placed_date: None,
            })
            .unwrap();
        assert_ne!(placement.id, "1");
        assert_eq!(placement.placed_date, Utc::now().date_naive());
        let app = store.get_application("4").unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Accepted);
    }

    #[test]
    fn test_add_placement_validates_package_and_job() {
        let store = Store::in_memory();
        let mut new = NewPlacement {
            student_id: "2".to_string(),
            job_id: "1".to_string(),
            company: "TechCorp".to_string(),
            package: -1.0,
            placed_date: None,
        };
        assert!(store.add_placement(new.clone()).is_err());
        new.package = 9.0;
        new.job_id = "missing".to_string();
        assert!(matches!(store.add_placement(new), Err(PortalError::NotFound { .. })));
    }

    #[test]
    fn test_schedule_interview_sets_status_and_lists_upcoming() {
        let store = Store::in_memory();
        let when = Utc::now() + Duration::days(2);
        let interview = store
            .schedule_interview("1", when, InterviewMode::InPerson, Some("Room 4".to_string()))
            .unwrap();
        assert_eq!(interview.status, InterviewStatus::Scheduled);
        assert_eq!(interview.employer_id, "3");
        assert_eq!(
            store.get_application("1").unwrap().unwrap().status,
            ApplicationStatus::InterviewScheduled
        );

        let upcoming = store.interviews_for_user("2", true, Utc::now()).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].id, interview.id);

        store.update_interview_status(&interview.id, InterviewStatus::Completed).unwrap();
        assert_eq!(store.interviews_for_user("2", true, Utc::now()).unwrap().len(), 1);
        assert_eq!(
            store.get_application("1").unwrap().unwrap().status,
            ApplicationStatus::Interviewed
        );
    }

    #[test]
    fn test_schedule_interview_rejects_past_dates() {
        let store = Store::in_memory();
        let past = Utc::now() - Duration::hours(1);
        assert!(store.schedule_interview("1", past, InterviewMode::Online, None).is_err());
    }

    #[test]
    fn test_document_lifecycle() {
        let store = Store::in_memory();
        let doc = store
            .upload_document(NewDocument {
                user_id: "5".to_string(),
                name: "Arjun_CV.pdf".to_string(),
                kind: DocumentType::Resume,
                size: 1024,
                tags: vec!["Resume".to_string(), "resume".to_string(), "aws".to_string()],
                is_public: false,
            })
            .unwrap();
        assert_eq!(doc.tags, vec!["resume", "aws"]);
        assert_eq!(doc.download_count, 0);

        assert!(store.record_download(&doc.id, "2").is_err());
        assert_eq!(store.record_download(&doc.id, "5").unwrap().download_count, 1);

        assert!(store.toggle_favorite(&doc.id, "5").unwrap().is_favorite);
        let favs = store
            .documents_for_user("5", &DocumentFilter { favorites_only: true, ..Default::default() })
            .unwrap();
        assert_eq!(favs.len(), 1);

        store.set_document_visibility(&doc.id, "5", true).unwrap();
        assert_eq!(store.record_download(&doc.id, "2").unwrap().download_count, 2);

        assert!(store.delete_document(&doc.id, "2").is_err());
        store.delete_document(&doc.id, "5").unwrap();
        assert!(store.documents_for_user("5", &DocumentFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_documents_filter_by_tag() {
        let store = Store::in_memory();
        let docs = store
            .documents_for_user("2", &DocumentFilter { tag: Some("React".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "1");
    }

    #[test]
    fn test_upsert_profile_inserts_then_replaces() {
        let store = Store::in_memory();
        let profile = Profile {
            user_id: "9".to_string(),
            full_name: "New Student".to_string(),
            department: None,
            graduation_year: Some(2027),
            cgpa: Some(7.5),
            skills: vec!["Java".to_string()],
            phone: None,
            updated_at: Utc::now(),
        };
        store.upsert_profile(profile.clone()).unwrap();
        let mut changed = profile.clone();
        changed.cgpa = Some(8.0);
        store.upsert_profile(changed).unwrap();
        let stored = store.get_profile("9").unwrap().unwrap();
        assert_eq!(stored.cgpa, Some(8.0));
        assert_eq!(store.get_data().unwrap().profiles.iter().filter(|p| p.user_id == "9").count(), 1);

        let mut bad = profile;
        bad.cgpa = Some(11.0);
        assert!(store.upsert_profile(bad).is_err());
    }

    #[test]
    fn test_reset_data_restores_seed() {
        let store = Store::in_memory();
        store.delete_job("1", "3").unwrap();
        store.reset_data().unwrap();
        assert!(store.get_job("1").unwrap().is_some());
    }
}

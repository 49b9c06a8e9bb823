mod analytics;
mod auth;
mod config;
mod error;
mod matcher;
mod messaging;
mod models;
mod notifications;
mod remote;
mod seed;
mod storage;
mod store;
mod validation;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use auth::{Permission, Session, SignUpForm};
use config::Config;
use models::{
    ApplicationStatus, DocumentType, InterviewMode, InterviewStatus, JobType, NotificationType,
    Profile, Role,
};
use remote::SupabaseClient;
use storage::SqliteStorage;
use store::{DocumentFilter, JobFilter, NewDocument, NewJob, NewPlacement, Store};
use validation::Captcha;

#[derive(Parser)]
#[command(name = "placement-hub")]
#[command(about = "Campus placement portal - jobs, applications, interviews, and messaging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize local storage
    Init,

    /// Restore the demo data
    Reset,

    /// Sign in with a demo account
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Register a new account (answers a CAPTCHA on stdin)
    Signup {
        /// Email address
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Role (student, employer, placement_officer)
        #[arg(short, long, default_value = "student")]
        role: Role,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// List users
    Users,

    /// Manage job postings
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Apply to a job
    Apply {
        /// Job ID
        job_id: String,

        /// Cover letter text
        #[arg(short, long)]
        cover_letter: Option<String>,
    },

    /// Track applications
    Application {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Record and list placements
    Placement {
        #[command(subcommand)]
        command: PlacementCommands,
    },

    /// Schedule and track interviews
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Direct messages
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },

    /// Notifications and notification settings
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },

    /// Manage documents
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Student profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Suggest jobs from a resume's filename and tags
    Match {
        /// Resume filename (defaults to your latest resume document)
        filename: Option<String>,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,
    },

    /// Show the dashboard for your role
    Stats,
}

#[derive(Subcommand)]
enum JobCommands {
    /// Post a job
    Add {
        /// Job title
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Comma-separated requirements
        #[arg(short, long, default_value = "")]
        requirements: String,

        #[arg(short, long, default_value = "Remote")]
        location: String,

        /// full_time, part_time, internship, contract
        #[arg(short = 't', long, default_value = "full_time")]
        job_type: JobType,

        #[arg(short, long)]
        salary: Option<String>,

        /// Application deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },

    /// List jobs
    List {
        /// Include closed and expired jobs
        #[arg(short, long)]
        all: bool,

        /// Filter by employer ID
        #[arg(short, long)]
        employer: Option<String>,

        /// Filter by job type
        #[arg(short = 't', long)]
        job_type: Option<JobType>,

        /// Search title, location and requirements
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show job details
    Show {
        /// Job ID
        id: String,
    },

    /// Stop accepting applications
    Close {
        /// Job ID
        id: String,
    },

    /// Accept applications again
    Reopen {
        /// Job ID
        id: String,
    },

    /// Delete a posting
    Delete {
        /// Job ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// List applications visible to you
    List {
        /// Only applications to this job
        #[arg(short, long)]
        job: Option<String>,
    },

    /// Change an application's status
    Status {
        /// Application ID
        id: String,

        /// New status
        status: ApplicationStatus,
    },

    /// Withdraw your application
    Withdraw {
        /// Application ID
        id: String,
    },
}

#[derive(Subcommand)]
enum PlacementCommands {
    /// Record a placement
    Add {
        /// Student user ID
        student_id: String,

        /// Job ID
        job_id: String,

        /// Company name
        company: String,

        /// Package in LPA
        package: f64,

        /// Placement date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List placements
    List,
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Schedule an interview for an application
    Schedule {
        /// Application ID
        application_id: String,

        /// Date and time in UTC ("YYYY-MM-DD HH:MM" or RFC 3339)
        date: String,

        /// online or in_person
        #[arg(short, long, default_value = "online")]
        mode: InterviewMode,

        /// Room or meeting link
        #[arg(short, long)]
        location: Option<String>,
    },

    /// List your interviews
    List {
        /// Include past and cancelled interviews
        #[arg(short, long)]
        all: bool,
    },

    /// Change an interview's status
    Status {
        /// Interview ID
        id: String,

        /// New status
        status: InterviewStatus,
    },
}

#[derive(Subcommand)]
enum MessageCommands {
    /// Send a message
    Send {
        /// Recipient ID or email
        to: String,

        /// Message text
        content: String,
    },

    /// List conversations
    Inbox,

    /// Show a conversation and mark it read
    Thread {
        /// Other participant's ID or email
        peer: String,
    },
}

#[derive(Subcommand)]
enum NotifyCommands {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },

    /// Mark one notification read
    Read {
        /// Notification ID
        id: String,
    },

    /// Mark all notifications read
    ReadAll,

    /// Delete a notification
    Delete {
        /// Notification ID
        id: String,
    },

    /// Send an announcement to one user or everyone
    Send {
        /// Recipient ID or email, or "all"
        to: String,

        /// Notification title
        title: String,

        /// Notification text
        message: String,

        /// application, interview, message, job, placement, system
        #[arg(short, long, default_value = "system")]
        kind: NotificationType,
    },

    /// Show or change notification settings
    Settings {
        /// name=true|false (repeatable)
        #[arg(short, long)]
        set: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DocCommands {
    /// Record a document upload
    Upload {
        /// Path to the file
        file: PathBuf,

        /// resume, cover_letter, transcript, certificate, other
        #[arg(short, long, default_value = "resume")]
        kind: DocumentType,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,

        /// Visible to other users
        #[arg(long)]
        public: bool,
    },

    /// List your documents
    List {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
    },

    /// Toggle favorite
    Favorite {
        /// Document ID
        id: String,
    },

    /// Make a document public or private
    Visibility {
        /// Document ID
        id: String,

        /// true for public
        #[arg(action = clap::ArgAction::Set)]
        public: bool,
    },

    /// Download a document (counts the download)
    Download {
        /// Document ID
        id: String,
    },

    /// Delete a document
    Delete {
        /// Document ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show a profile
    Show {
        /// User ID or email (default: you)
        user: Option<String>,
    },

    /// Update your profile
    Set {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        department: Option<String>,

        #[arg(short, long)]
        year: Option<i32>,

        #[arg(short, long)]
        cgpa: Option<f64>,

        /// Comma-separated skills
        #[arg(short, long)]
        skills: Option<String>,

        #[arg(short, long)]
        phone: Option<String>,
    },
}

fn open_store(config: &Config, initialize: bool) -> Result<Store> {
    let storage = SqliteStorage::open(&config.db_path)
        .with_context(|| format!("Failed to open storage at {}", config.db_path.display()))?;
    if initialize {
        storage.init()?;
    } else {
        storage.ensure_initialized()?;
    }
    Ok(Store::new(storage).with_session_ttl(Duration::minutes(config.session_ttl_minutes)))
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), config.rust_log))
        }))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_logging(&config);

    let store = open_store(&config, matches!(cli.command, Commands::Init))?;

    match cli.command {
        Commands::Init => {
            store.get_data()?;
            println!("Storage initialized at {}", config.db_path.display());
            if config.demo_mode() {
                println!("Running in demo mode (no Supabase credentials configured).");
            }
        }

        Commands::Reset => {
            let session = store.require_session()?;
            session.require(Permission::ManageUsers)?;
            store.reset_data()?;
            println!("Demo data restored.");
        }

        Commands::Login { email, password } => {
            let session = store.sign_in(&email, &password)?;
            println!(
                "Signed in as {} ({}). Session expires {}.",
                session.user.full_name,
                session.user.role,
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }

        Commands::Logout => {
            store.sign_out()?;
            println!("Signed out.");
        }

        Commands::Whoami => match store.current_session()? {
            Some(session) => {
                println!("{} <{}>", session.user.full_name, session.user.email);
                println!("ID: {}", session.user.id);
                println!("Role: {}", session.user.role);
                println!("Expires: {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
                print_unread(&store, &session.user.id)?;
            }
            None => println!("Not signed in."),
        },

        Commands::Signup {
            email,
            name,
            role,
            password,
        } => {
            let captcha = Captcha::random();
            let answer = prompt(&captcha.question())?;
            if !captcha.verify(&answer) {
                bail!("Incorrect CAPTCHA answer");
            }
            let session = store.sign_up(SignUpForm {
                email,
                full_name: name,
                password,
                role,
            })?;
            println!(
                "Welcome, {}! Registered as {} (ID: {}).",
                session.user.full_name, session.user.role, session.user.id
            );
        }

        Commands::Users => {
            let session = store.require_session()?;
            session.require(Permission::ManageUsers)?;
            let users = match (&config.supabase_url, &config.supabase_anon_key) {
                (Some(url), Some(key)) if !config.demo_mode() => {
                    SupabaseClient::new(url, key).fetch_users()?
                }
                _ => store.all_users()?,
            };
            println!("{:<38} {:<18} {:<24} {:<30}", "ID", "ROLE", "NAME", "EMAIL");
            println!("{}", "-".repeat(112));
            for user in users {
                println!(
                    "{:<38} {:<18} {:<24} {:<30}",
                    user.id,
                    user.role,
                    truncate(&user.full_name, 22),
                    truncate(&user.email, 30)
                );
            }
        }

        Commands::Job { command } => run_job(&store, command)?,

        Commands::Apply {
            job_id,
            cover_letter,
        } => {
            let session = store.require_session()?;
            session.require(Permission::ApplyToJob)?;
            let app = store.add_application(&job_id, &session.user.id, cover_letter)?;
            println!("Applied to job #{} (application ID: {})", job_id, app.id);
        }

        Commands::Application { command } => run_application(&store, command)?,
        Commands::Placement { command } => run_placement(&store, command)?,
        Commands::Interview { command } => run_interview(&store, command)?,
        Commands::Message { command } => run_message(&store, command)?,
        Commands::Notify { command } => run_notify(&store, command)?,
        Commands::Doc { command } => run_doc(&store, command)?,
        Commands::Profile { command } => run_profile(&store, command)?,

        Commands::Match { filename, tags } => {
            let (filename, tags) = match filename {
                Some(f) => (f, tags),
                None => {
                    let session = store.require_session()?;
                    let filter = DocumentFilter {
                        tag: None,
                        favorites_only: false,
                    };
                    let resume = store
                        .documents_for_user(&session.user.id, &filter)?
                        .into_iter()
                        .find(|d| d.kind == DocumentType::Resume)
                        .ok_or_else(|| anyhow!("No resume found. Pass a filename or upload one with 'doc upload'."))?;
                    let tags = if tags.is_empty() { resume.tags.join(",") } else { tags };
                    (resume.name, tags)
                }
            };

            let jobs = store.list_jobs(&JobFilter::default())?;
            let analysis = matcher::analyze_resume(&filename, &tags, &jobs, Utc::now().date_naive());
            if analysis.used_default_skills {
                println!("No known skills detected; using defaults.");
            }
            println!("Skills: {}", analysis.skills.join(", "));
            if analysis.matches.is_empty() {
                println!("No open jobs to match.");
            } else {
                println!("\n{:<5} {:<38} {:<28} {:>6} {:>6}", "RANK", "JOB ID", "TITLE", "SCORE", "MATCH");
                println!("{}", "-".repeat(86));
                for (i, m) in analysis.matches.iter().enumerate() {
                    println!(
                        "{:<5} {:<38} {:<28} {:>6} {:>5}%",
                        i + 1,
                        m.job.id,
                        truncate(&m.job.title, 26),
                        m.score,
                        m.match_percent
                    );
                }
            }
        }

        Commands::Stats => {
            let session = store.require_session()?;
            print_dashboard(&store, &session)?;
        }
    }

    Ok(())
}

fn run_job(store: &Store, command: JobCommands) -> Result<()> {
    match command {
        JobCommands::Add {
            title,
            description,
            requirements,
            location,
            job_type,
            salary,
            deadline,
        } => {
            let session = store.require_session()?;
            session.require(Permission::PostJob)?;
            let job = store.add_job(NewJob {
                employer_id: session.user.id.clone(),
                title,
                description,
                requirements: split_list(&requirements),
                location,
                job_type,
                salary_range: salary,
                application_deadline: deadline,
            })?;
            println!("Posted job #{}", job.id);
        }

        JobCommands::List {
            all,
            employer,
            job_type,
            search,
        } => {
            let jobs = store.list_jobs(&JobFilter {
                active_only: !all,
                employer_id: employer,
                job_type,
                search,
            })?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<38} {:<7} {:<26} {:<14} {:<11} {:>10}",
                    "ID", "STATUS", "TITLE", "LOCATION", "TYPE", "DEADLINE"
                );
                println!("{}", "-".repeat(111));
                let today = Utc::now().date_naive();
                for job in jobs {
                    println!(
                        "{:<38} {:<7} {:<26} {:<14} {:<11} {:>10}",
                        job.id,
                        if job.is_open_on(today) { "open" } else { "closed" },
                        truncate(&job.title, 24),
                        truncate(&job.location, 12),
                        job.job_type,
                        job.application_deadline
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        JobCommands::Show { id } => match store.get_job(&id)? {
            Some(job) => {
                println!("Job #{}", job.id);
                println!("Title: {}", job.title);
                if let Some(employer) = store.find_user(&job.employer_id)? {
                    println!("Employer: {}", employer.full_name);
                }
                println!("Type: {}", job.job_type);
                println!("Location: {}", job.location);
                if let Some(salary) = &job.salary_range {
                    println!("Salary: {}", salary);
                }
                if let Some(deadline) = job.application_deadline {
                    println!("Deadline: {}", deadline);
                }
                println!("Active: {}", if job.is_active { "yes" } else { "no" });
                if !job.requirements.is_empty() {
                    println!("Requirements: {}", job.requirements.join(", "));
                }
                println!("Posted: {}", job.created_at.format("%Y-%m-%d"));
                if !job.description.is_empty() {
                    println!("\n{}", textwrap::fill(&job.description, 80));
                }
            }
            None => println!("Job #{} not found.", id),
        },

        JobCommands::Close { id } => {
            set_job_open(store, &id, false)?;
            println!("Closed job #{}.", id);
        }

        JobCommands::Reopen { id } => {
            set_job_open(store, &id, true)?;
            println!("Reopened job #{}.", id);
        }

        JobCommands::Delete { id } => {
            let session = store.require_session()?;
            session.require(Permission::PostJob)?;
            let job = store
                .get_job(&id)?
                .ok_or_else(|| anyhow!("Job #{} not found", id))?;
            session.require_owner(&job.employer_id, "delete a job")?;
            store.delete_job(&id, &job.employer_id)?;
            println!("Deleted job #{}.", id);
        }
    }
    Ok(())
}

fn set_job_open(store: &Store, id: &str, open: bool) -> Result<()> {
    let session = store.require_session()?;
    session.require(Permission::PostJob)?;
    let job = store
        .get_job(id)?
        .ok_or_else(|| anyhow!("Job #{} not found", id))?;
    session.require_owner(&job.employer_id, "change a job")?;
    store.set_job_active(id, open)?;
    Ok(())
}

fn run_application(store: &Store, command: ApplicationCommands) -> Result<()> {
    let session = store.require_session()?;
    match command {
        ApplicationCommands::List { job } => {
            let apps = match (session.role(), job) {
                (Role::Student, _) => store.applications_for_student(&session.user.id)?,
                (Role::Employer, None) => store.applications_for_employer(&session.user.id)?,
                (_, Some(job_id)) => {
                    session.require(Permission::ReviewApplications)?;
                    let job = store
                        .get_job(&job_id)?
                        .ok_or_else(|| anyhow!("Job #{} not found", job_id))?;
                    if session.role() == Role::Employer {
                        session.require_owner(&job.employer_id, "view applications")?;
                    }
                    store.applications_for_job(&job_id)?
                }
                (_, None) => {
                    session.require(Permission::ReviewApplications)?;
                    let mut apps = store.get_data()?.applications;
                    apps.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
                    apps
                }
            };

            if apps.is_empty() {
                println!("No applications found.");
                return Ok(());
            }
            let jobs = store.get_data()?.jobs;
            println!(
                "{:<38} {:<22} {:<26} {:<12} {:>10}",
                "ID", "STATUS", "JOB", "STUDENT", "APPLIED"
            );
            println!("{}", "-".repeat(112));
            for app in apps {
                let title = jobs
                    .iter()
                    .find(|j| j.id == app.job_id)
                    .map(|j| j.title.as_str())
                    .unwrap_or("(deleted job)");
                println!(
                    "{:<38} {:<22} {:<26} {:<12} {:>10}",
                    app.id,
                    app.status,
                    truncate(title, 24),
                    truncate(&app.student_id, 10),
                    app.applied_at.format("%Y-%m-%d")
                );
            }
        }

        ApplicationCommands::Status { id, status } => {
            session.require(Permission::ReviewApplications)?;
            let app = store
                .get_application(&id)?
                .ok_or_else(|| anyhow!("Application #{} not found", id))?;
            if session.role() == Role::Employer {
                let job = store
                    .get_job(&app.job_id)?
                    .ok_or_else(|| anyhow!("Job #{} not found", app.job_id))?;
                session.require_owner(&job.employer_id, "review an application")?;
            }
            store.update_application_status(&id, status)?;
            println!("Application #{} is now {}.", id, status);
        }

        ApplicationCommands::Withdraw { id } => {
            session.require(Permission::ApplyToJob)?;
            store.withdraw_application(&id, &session.user.id)?;
            println!("Withdrew application #{}.", id);
        }
    }
    Ok(())
}

fn run_placement(store: &Store, command: PlacementCommands) -> Result<()> {
    let session = store.require_session()?;
    match command {
        PlacementCommands::Add {
            student_id,
            job_id,
            company,
            package,
            date,
        } => {
            session.require(Permission::RecordPlacement)?;
            let placement = store.add_placement(NewPlacement {
                student_id,
                job_id,
                company,
                package,
                placed_date: date,
            })?;
            println!("Recorded placement #{} at {}.", placement.id, placement.company);
        }

        PlacementCommands::List => {
            let mut placements = store.list_placements()?;
            if session.role() == Role::Student {
                placements.retain(|p| p.student_id == session.user.id);
            } else {
                session.require(Permission::ViewPlacementAnalytics)?;
            }
            if placements.is_empty() {
                println!("No placements found.");
                return Ok(());
            }
            println!("{:<38} {:<24} {:<12} {:>8} {:>12}", "ID", "COMPANY", "STUDENT", "LPA", "DATE");
            println!("{}", "-".repeat(98));
            for p in placements {
                println!(
                    "{:<38} {:<24} {:<12} {:>8.1} {:>12}",
                    p.id,
                    truncate(&p.company, 22),
                    truncate(&p.student_id, 10),
                    p.package,
                    p.placed_date
                );
            }
        }
    }
    Ok(())
}

fn run_interview(store: &Store, command: InterviewCommands) -> Result<()> {
    let session = store.require_session()?;
    match command {
        InterviewCommands::Schedule {
            application_id,
            date,
            mode,
            location,
        } => {
            session.require(Permission::ScheduleInterview)?;
            let app = store
                .get_application(&application_id)?
                .ok_or_else(|| anyhow!("Application #{} not found", application_id))?;
            if session.role() == Role::Employer {
                let job = store
                    .get_job(&app.job_id)?
                    .ok_or_else(|| anyhow!("Job #{} not found", app.job_id))?;
                session.require_owner(&job.employer_id, "schedule an interview")?;
            }
            let when = parse_datetime(&date)?;
            let interview = store.schedule_interview(&application_id, when, mode, location)?;
            println!(
                "Scheduled interview #{} for {}.",
                interview.id,
                interview.date.format("%Y-%m-%d %H:%M UTC")
            );
        }

        InterviewCommands::List { all } => {
            let interviews = store.interviews_for_user(&session.user.id, !all, Utc::now())?;
            if interviews.is_empty() {
                println!("No interviews found.");
                return Ok(());
            }
            println!("{:<38} {:<18} {:<10} {:<12} {:<30}", "ID", "DATE", "MODE", "STATUS", "WHERE");
            println!("{}", "-".repeat(110));
            for i in interviews {
                println!(
                    "{:<38} {:<18} {:<10} {:<12} {:<30}",
                    i.id,
                    i.date.format("%Y-%m-%d %H:%M"),
                    i.mode,
                    i.status,
                    truncate(i.location.as_deref().unwrap_or("-"), 30)
                );
            }
        }

        InterviewCommands::Status { id, status } => {
            session.require(Permission::ScheduleInterview)?;
            let interview = store
                .interviews_for_user(&session.user.id, false, Utc::now())?
                .into_iter()
                .find(|i| i.id == id);
            if interview.is_none() && session.role() == Role::Employer {
                bail!("Interview #{} not found among your interviews", id);
            }
            store.update_interview_status(&id, status)?;
            println!("Interview #{} is now {}.", id, status);
        }
    }
    Ok(())
}

fn run_message(store: &Store, command: MessageCommands) -> Result<()> {
    let session = store.require_session()?;
    match command {
        MessageCommands::Send { to, content } => {
            let peer = store
                .find_user(&to)?
                .ok_or_else(|| anyhow!("User '{}' not found", to))?;
            store.send_message(&session.user.id, &peer.id, &content)?;
            println!("Message sent to {}.", peer.full_name);
        }

        MessageCommands::Inbox => {
            let conversations = store.get_conversations(&session.user.id)?;
            if conversations.is_empty() {
                println!("No conversations.");
                return Ok(());
            }
            println!(
                "{} unread message(s)\n",
                store.unread_message_count(&session.user.id)?
            );
            for conv in conversations {
                let name = store
                    .find_user(&conv.peer_id)?
                    .map(|u| u.full_name)
                    .unwrap_or_else(|| conv.peer_id.clone());
                let unread = if conv.unread_count > 0 {
                    format!(" [{} unread]", conv.unread_count)
                } else {
                    String::new()
                };
                println!(
                    "{} ({}){} - {}",
                    name,
                    conv.peer_id,
                    unread,
                    conv.last_message.timestamp.format("%Y-%m-%d %H:%M")
                );
                println!("  {}", truncate(&conv.last_message.content, 70));
            }
        }

        MessageCommands::Thread { peer } => {
            let peer = store
                .find_user(&peer)?
                .ok_or_else(|| anyhow!("User '{}' not found", peer))?;
            let messages = store.get_messages(&session.user.id, &peer.id)?;
            if messages.is_empty() {
                println!("No messages with {}.", peer.full_name);
                return Ok(());
            }
            for msg in &messages {
                let who = if msg.sender_id == session.user.id {
                    "You"
                } else {
                    peer.full_name.as_str()
                };
                println!("[{}] {}:", msg.timestamp.format("%Y-%m-%d %H:%M"), who);
                println!("{}\n", textwrap::indent(&textwrap::fill(&msg.content, 76), "  "));
            }
            store.mark_conversation_read(&session.user.id, &peer.id)?;
        }
    }
    Ok(())
}

fn run_notify(store: &Store, command: NotifyCommands) -> Result<()> {
    match command {
        NotifyCommands::List { unread } => {
            let session = store.require_session()?;
            let notes: Vec<_> = store
                .get_notifications(&session.user.id)?
                .into_iter()
                .filter(|n| !unread || !n.read)
                .collect();
            if notes.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            for note in notes {
                println!(
                    "{} {} [{}] {} ({})",
                    if note.read { " " } else { "*" },
                    note.timestamp.format("%Y-%m-%d %H:%M"),
                    note.kind,
                    note.title,
                    note.id
                );
                println!("    {}", note.message);
            }
        }

        NotifyCommands::Read { id } => {
            let session = store.require_session()?;
            store.mark_notification_read(&id, &session.user.id)?;
            println!("Marked notification read.");
        }

        NotifyCommands::ReadAll => {
            let session = store.require_session()?;
            let changed = store.mark_all_read(&session.user.id)?;
            println!("Marked {} notification(s) read.", changed);
        }

        NotifyCommands::Delete { id } => {
            let session = store.require_session()?;
            store.delete_notification(&id, &session.user.id)?;
            println!("Deleted notification.");
        }

        NotifyCommands::Send {
            to,
            title,
            message,
            kind,
        } => {
            let session = store.require_session()?;
            session.require(Permission::SendAnnouncements)?;
            let recipients = if to.eq_ignore_ascii_case("all") {
                store.all_users()?
            } else {
                vec![store
                    .find_user(&to)?
                    .ok_or_else(|| anyhow!("User '{}' not found", to))?]
            };
            let mut delivered = 0;
            for user in &recipients {
                if store.add_notification(&user.id, kind, &title, &message)? {
                    delivered += 1;
                }
            }
            if delivered == 0 {
                println!("{} notifications are muted; nothing was sent.", kind);
            } else {
                println!("Notified {} user(s).", delivered);
            }
        }

        NotifyCommands::Settings { set } => {
            let settings = update_settings(store, &set)?;
            println!("email:               {}", settings.email);
            println!("push:                {}", settings.push);
            println!("application_updates: {}", settings.application_updates);
            println!("interview_reminders: {}", settings.interview_reminders);
            println!("messages:            {}", settings.messages);
            println!("job_alerts:          {}", settings.job_alerts);
        }
    }
    Ok(())
}

/// Applies `name=true|false` entries to the global settings. Signed-in users only.
fn update_settings(store: &Store, entries: &[String]) -> Result<models::NotificationSettings> {
    store.require_session()?;
    let mut settings = store.notification_settings()?;
    if entries.is_empty() {
        return Ok(settings);
    }
    for entry in entries {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected name=true|false, got '{}'", entry))?;
        let value: bool = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", name, value))?;
        settings.set(name, value)?;
    }
    store.save_notification_settings(&settings)?;
    Ok(settings)
}

fn run_doc(store: &Store, command: DocCommands) -> Result<()> {
    let session = store.require_session()?;
    let user_id = session.user.id.as_str();
    match command {
        DocCommands::Upload {
            file,
            kind,
            tags,
            public,
        } => {
            let metadata = std::fs::metadata(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("'{}' has no file name", file.display()))?;
            let doc = store.upload_document(NewDocument {
                user_id: user_id.to_string(),
                name,
                kind,
                size: metadata.len(),
                tags: split_list(&tags),
                is_public: public,
            })?;
            println!("Uploaded '{}' ({}, ID: {})", doc.name, format_size(doc.size), doc.id);
        }

        DocCommands::List { tag, favorites } => {
            let docs = store.documents_for_user(
                user_id,
                &DocumentFilter {
                    tag,
                    favorites_only: favorites,
                },
            )?;
            if docs.is_empty() {
                println!("No documents found.");
                return Ok(());
            }
            println!(
                "{:<38} {:<28} {:<12} {:>9} {:<4} {:>5} {:<20}",
                "ID", "NAME", "TYPE", "SIZE", "FLAG", "DLS", "TAGS"
            );
            println!("{}", "-".repeat(122));
            for doc in docs {
                let flags = format!(
                    "{}{}",
                    if doc.is_favorite { "*" } else { " " },
                    if doc.is_public { "P" } else { " " }
                );
                println!(
                    "{:<38} {:<28} {:<12} {:>9} {:<4} {:>5} {:<20}",
                    doc.id,
                    truncate(&doc.name, 26),
                    doc.kind,
                    format_size(doc.size),
                    flags,
                    doc.download_count,
                    truncate(&doc.tags.join(","), 20)
                );
            }
        }

        DocCommands::Favorite { id } => {
            let doc = store.toggle_favorite(&id, user_id)?;
            println!(
                "'{}' {} favorites.",
                doc.name,
                if doc.is_favorite { "added to" } else { "removed from" }
            );
        }

        DocCommands::Visibility { id, public } => {
            let doc = store.set_document_visibility(&id, user_id, public)?;
            println!("'{}' is now {}.", doc.name, if doc.is_public { "public" } else { "private" });
        }

        DocCommands::Download { id } => {
            let doc = store.record_download(&id, user_id)?;
            println!("Downloading '{}' ({} downloads).", doc.name, doc.download_count);
        }

        DocCommands::Delete { id } => {
            store.delete_document(&id, user_id)?;
            println!("Deleted document #{}.", id);
        }
    }
    Ok(())
}

fn run_profile(store: &Store, command: ProfileCommands) -> Result<()> {
    let session = store.require_session()?;
    match command {
        ProfileCommands::Show { user } => {
            let user_id = match user {
                Some(u) => {
                    store
                        .find_user(&u)?
                        .ok_or_else(|| anyhow!("User '{}' not found", u))?
                        .id
                }
                None => session.user.id.clone(),
            };
            match store.get_profile(&user_id)? {
                Some(p) => {
                    println!("{}", p.full_name);
                    if let Some(dept) = &p.department {
                        println!("Department: {}", dept);
                    }
                    if let Some(year) = p.graduation_year {
                        println!("Graduation: {}", year);
                    }
                    if let Some(cgpa) = p.cgpa {
                        println!("CGPA: {:.2}", cgpa);
                    }
                    if !p.skills.is_empty() {
                        println!("Skills: {}", p.skills.join(", "));
                    }
                    if let Some(phone) = &p.phone {
                        println!("Phone: {}", phone);
                    }
                    println!("Updated: {}", p.updated_at.format("%Y-%m-%d"));
                }
                None => println!("No profile for user {}.", user_id),
            }
        }

        ProfileCommands::Set {
            name,
            department,
            year,
            cgpa,
            skills,
            phone,
        } => {
            session.require(Permission::ManageProfile)?;
            let mut profile = store.get_profile(&session.user.id)?.unwrap_or_else(|| Profile {
                user_id: session.user.id.clone(),
                full_name: session.user.full_name.clone(),
                department: None,
                graduation_year: None,
                cgpa: None,
                skills: Vec::new(),
                phone: None,
                updated_at: Utc::now(),
            });
            if let Some(name) = name {
                profile.full_name = name;
            }
            if department.is_some() {
                profile.department = department;
            }
            if year.is_some() {
                profile.graduation_year = year;
            }
            if cgpa.is_some() {
                profile.cgpa = cgpa;
            }
            if let Some(skills) = skills {
                profile.skills = split_list(&skills);
            }
            if phone.is_some() {
                profile.phone = phone;
            }
            store.upsert_profile(profile)?;
            println!("Profile updated.");
        }
    }
    Ok(())
}

fn print_dashboard(store: &Store, session: &Session) -> Result<()> {
    let data = store.get_data()?;
    let now = Utc::now();
    println!("Dashboard for {} ({})\n", session.user.full_name, session.user.role);

    match session.role() {
        Role::Admin => {
            let o = analytics::admin_overview(&data, &store.all_users()?);
            println!("Users:");
            for (role, n) in &o.users_by_role {
                println!("  {:<18} {}", role.as_str(), n);
            }
            println!("Jobs:          {} ({} open)", o.total_jobs, o.active_jobs);
            println!("Applications:  {}", o.total_applications);
            print_breakdown(&o.status_breakdown);
            println!("Placements:    {}", o.total_placements);
            println!("Placement rate: {:.1}%", o.placement_rate);
            if let (Some(avg), Some(max)) = (o.average_package, o.highest_package) {
                println!("Packages:      avg {:.1} LPA, highest {:.1} LPA", avg, max);
            }
        }

        Role::Student => {
            let s = analytics::student_summary(&data, &session.user.id, now);
            println!("Applications:  {}", s.total_applications);
            print_breakdown(&s.status_breakdown);
            println!("Documents:     {}", s.documents);
            println!("Placed:        {}", if s.placed { "yes" } else { "not yet" });
            print_upcoming(&s.upcoming_interviews);
        }

        Role::Employer => {
            let e = analytics::employer_summary(&data, &session.user.id, now);
            println!("Jobs:          {} ({} open)", e.total_jobs, e.active_jobs);
            println!("Applications:  {} ({} shortlisted)", e.total_applications, e.shortlisted);
            for job in &e.per_job {
                println!(
                    "  {:<28} {:>4} application(s){}",
                    truncate(&job.title, 26),
                    job.applications,
                    if job.is_active { "" } else { " [closed]" }
                );
            }
            print_upcoming(&e.upcoming_interviews);
        }

        Role::PlacementOfficer => {
            let o = analytics::officer_summary(&data, &store.all_users()?, now);
            println!(
                "Students placed: {}/{} ({:.1}%)",
                o.placed_students, o.total_students, o.placement_rate
            );
            if let Some(avg) = o.average_package {
                println!("Average package: {:.1} LPA", avg);
            }
            println!("Top companies:");
            for (company, n) in &o.placements_by_company {
                println!("  {:<28} {}", truncate(company, 26), n);
            }
            println!("Applications per month:");
            for (month, n) in &o.monthly_applications {
                println!("  {} {:>4} {}", month, n, "#".repeat(*n));
            }
        }
    }
    println!();
    print_unread(store, &session.user.id)
}

fn print_unread(store: &Store, user_id: &str) -> Result<()> {
    println!(
        "Unread: {} notification(s), {} message(s)",
        store.unread_notification_count(user_id)?,
        store.unread_message_count(user_id)?
    );
    Ok(())
}

fn print_breakdown(breakdown: &[(ApplicationStatus, usize)]) {
    for (status, n) in breakdown {
        println!("  {:<20} {}", status.as_str(), n);
    }
}

fn print_upcoming(interviews: &[models::Interview]) {
    if interviews.is_empty() {
        println!("No upcoming interviews.");
        return;
    }
    println!("Upcoming interviews:");
    for i in interviews {
        println!(
            "  {} {} ({})",
            i.date.format("%Y-%m-%d %H:%M"),
            i.mode,
            i.location.as_deref().unwrap_or("-")
        );
    }
}

fn prompt(question: &str) -> Result<String> {
    print!("{} ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}

fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Invalid date '{}': use \"YYYY-MM-DD HH:MM\" or RFC 3339", input))
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_datetime_formats() {
        let dt = parse_datetime("2026-11-03 14:30").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour(), dt.minute()), (11, 3, 14, 30));
        let rfc = parse_datetime("2026-11-03T14:30:00+05:30").unwrap();
        assert_eq!(rfc.hour(), 9);
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(split_list(" rust, sql ,,"), vec!["rust", "sql"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(245_760), "240.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Machine Learning Engineer", 10), "Machine...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_cli_parses_enum_arguments() {
        let cli = Cli::try_parse_from([
            "placement-hub",
            "application",
            "status",
            "abc",
            "interview-scheduled",
        ])
        .unwrap();
        match cli.command {
            Commands::Application {
                command: ApplicationCommands::Status { id, status },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(status, ApplicationStatus::InterviewScheduled);
            }
            _ => panic!("wrong command"),
        }
        assert!(Cli::try_parse_from(["placement-hub", "signup", "a@b.co", "-n", "A", "-p", "x", "-r", "boss"]).is_err());
    }

    #[test]
    fn test_settings_require_a_session() {
        let store = Store::in_memory();
        let mute = vec!["messages=false".to_string()];
        assert!(update_settings(&store, &mute).is_err());
        assert!(store.notification_settings().unwrap().messages);

        store.sign_in("student@placementhub.com", "student123").unwrap();
        assert!(!update_settings(&store, &mute).unwrap().messages);
        assert!(!store.notification_settings().unwrap().messages);
        assert!(update_settings(&store, &["messages".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_announcement() {
        let cli = Cli::try_parse_from([
            "placement-hub",
            "notify",
            "send",
            "all",
            "Drive on Friday",
            "Bring your transcripts",
            "--kind",
            "job",
        ])
        .unwrap();
        match cli.command {
            Commands::Notify {
                command: NotifyCommands::Send { to, kind, .. },
            } => {
                assert_eq!(to, "all");
                assert_eq!(kind, NotificationType::Job);
            }
            _ => panic!("wrong command"),
        }
    }
}

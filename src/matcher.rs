//! Resume analysis: guess skills from a document's filename and tags, then
//! rank open jobs by how many of those skills their listing mentions.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Job;

pub const SKILL_KEYWORDS: [&str; 25] = [
    "javascript",
    "typescript",
    "python",
    "java",
    "react",
    "angular",
    "vue",
    "node",
    "html",
    "css",
    "sql",
    "mongodb",
    "django",
    "flask",
    "spring",
    "aws",
    "docker",
    "kubernetes",
    "git",
    "c++",
    "machine learning",
    "data analysis",
    "excel",
    "communication",
    "leadership",
];

pub const DEFAULT_SKILLS: [&str; 3] = ["communication", "teamwork", "problem solving"];

pub const TOP_MATCHES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobMatch {
    pub job: Job,
    pub score: usize,
    pub match_percent: u32, // share of detected skills the job mentions
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeAnalysis {
    pub skills: Vec<String>,
    pub used_default_skills: bool,
    pub matches: Vec<JobMatch>,
}

/// Skills whose keyword occurs in the lower-cased filename or tag string.
pub fn detect_skills(filename: &str, tags: &str) -> Vec<String> {
    let haystack = format!("{} {}", filename.to_lowercase(), tags.to_lowercase());
    SKILL_KEYWORDS
        .iter()
        .filter(|skill| haystack.contains(*skill))
        .map(|skill| skill.to_string())
        .collect()
}

/// Number of `skills` found in the job's requirements and title.
pub fn score_job(job: &Job, skills: &[String]) -> usize {
    let text = format!("{} {}", job.requirements.join(" "), job.title).to_lowercase();
    skills.iter().filter(|s| text.contains(s.as_str())).count()
}

pub fn analyze_resume(filename: &str, tags: &str, jobs: &[Job], today: NaiveDate) -> ResumeAnalysis {
    let mut skills = detect_skills(filename, tags);
    let used_default_skills = skills.is_empty();
    if used_default_skills {
        skills = DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect();
    }

    let mut matches: Vec<JobMatch> = jobs
        .iter()
        .filter(|job| job.is_open_on(today))
        .map(|job| {
            let score = score_job(job, &skills);
            JobMatch {
                job: job.clone(),
                score,
                match_percent: ((score * 100) / skills.len()) as u32,
            }
        })
        .collect();

    // Stable: equal scores keep listing order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(TOP_MATCHES);

    ResumeAnalysis {
        skills,
        used_default_skills,
        matches,
    }
}

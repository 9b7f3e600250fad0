//! Structured profile schema produced by LLM normalization, and the
//! qualitative evaluation document produced by the scoring stage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMediaLinks {
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
    #[serde(rename = "otherSocialMediaLinks")]
    pub other_social_media_links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    /// Whole months between start and end date, rounded up. Computed by the
    /// LLM per the prompt contract; the original date strings are not kept.
    #[serde(rename = "durationMonths")]
    pub duration_months: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(rename = "durationMonths")]
    pub duration_months: i64,
    pub description: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainExperience {
    pub domain: String,
    pub months: i64,
}

/// The normalized resume document. Field names mirror the JSON schema the
/// LLM is instructed to emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeProfile {
    pub name: String,
    pub email: String,
    #[serde(rename = "socialMediaLinks")]
    pub social_media_links: SocialMediaLinks,
    #[serde(rename = "workExperience")]
    pub work_experience: Vec<WorkExperience>,
    pub projects: Vec<Project>,
    pub education: Vec<Education>,
    #[serde(rename = "skillsAndTechnologies")]
    pub skills_and_technologies: Vec<String>,
    /// Aggregated from work-experience text only, never from projects.
    #[serde(rename = "monthsOfWorkExperienceByDomain")]
    pub months_of_work_experience_by_domain: Vec<DomainExperience>,
    #[serde(rename = "otherInfo")]
    pub other_info: String,
}

impl ResumeProfile {
    /// Flattens the profile into embeddable text lines, one field or list
    /// item per line, in schema order.
    pub fn embedding_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.name.is_empty() {
            lines.push(self.name.clone());
        }
        if !self.email.is_empty() {
            lines.push(self.email.clone());
        }
        for exp in &self.work_experience {
            lines.push(format!(
                "{} at {} ({} months): {}",
                exp.title, exp.company, exp.duration_months, exp.description
            ));
        }
        for project in &self.projects {
            lines.push(format!(
                "{} ({} months): {}",
                project.name, project.duration_months, project.description
            ));
        }
        for edu in &self.education {
            lines.push(format!("{} — {}", edu.degree, edu.institution));
        }
        lines.extend(self.skills_and_technologies.iter().cloned());
        for domain in &self.months_of_work_experience_by_domain {
            lines.push(format!("{}: {} months", domain.domain, domain.months));
        }
        if !self.other_info.is_empty() {
            lines.push(self.other_info.clone());
        }
        lines
    }
}

/// Qualitative fit evaluation returned by the LLM during scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsEvaluation {
    /// Reasons the candidate is a good fit.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Reasons the candidate may not be a good fit.
    #[serde(default)]
    pub weaknesses: Vec<String>,
    /// Overall fit score from 1 to 10, higher is better.
    pub score: f64,
}

//! Prompt text for the two LLM calls: profile normalization and ATS
//! evaluation. Kept in one place so prompt changes are reviewable.

pub const NORMALIZER_SYSTEM: &str = "You are a meticulous and detail-oriented resume \
parsing AI, and also a senior recruiter. You output only valid JSON.";

pub const EVALUATOR_SYSTEM: &str = "You are a senior technical recruiter evaluating a \
candidate against a specific job post. You output only valid JSON.";

/// Builds the normalization prompt. `today` is injected so CURRENT/PRESENT
/// date ranges resolve deterministically against one calendar date.
pub fn normalizer_prompt(combined_resume_text: &str, today: &str) -> String {
    format!(
        r#"You are an expert resume parsing AI. Analyze the resume text below and produce a
fully normalized, structured JSON object. Perform all calculations and text
normalizations yourself.

HARD RULES (CRITICAL - DO NOT BREAK):

1. Output format: your entire output MUST be a single valid JSON object with exactly
   these keys: "name", "email", "socialMediaLinks" (object with "linkedin", "github",
   "portfolio", "otherSocialMediaLinks"), "workExperience" (array of objects with
   "title", "company", "durationMonths", "description"), "projects" (array of objects
   with "name", "durationMonths", "description", "link"), "education" (array of objects
   with "degree", "institution", "startDate", "endDate", "description"),
   "skillsAndTechnologies" (array of strings, including inferred soft skills),
   "monthsOfWorkExperienceByDomain" (array of objects with "domain" and "months"),
   "otherInfo" (string). No text, code fences, or explanations around the JSON.

2. Date calculation: compute the duration between start and end dates for all work
   experiences and projects. The result MUST be an integer number of months, rounded
   up for fractions, placed in "durationMonths". Do NOT include the original date
   strings. Treat 'CURRENT', 'PRESENT' or 'NOW' as {today}.
   Example: "Jan 2022 - Dec 2023" gives "durationMonths": 24.

3. Acronym expansion: expand common technical and professional acronyms in all text
   fields (AWS, GCP, ERP, CRM, SQL, CI/CD, API, DRF, HTML, CSS and similar).

4. Dynamic domain identification: for "monthsOfWorkExperienceByDomain", identify the
   key domains of expertise dynamically from the resume, considering WORK EXPERIENCE
   ONLY (not projects). Do not use a fixed list; aggregate estimated months per domain
   across the relevant entries.

5. Information integrity: do NOT invent information. If something required by the
   schema is absent, use an empty string "" or an empty array [].

6. Education: include an "education" array with at least "degree" and "institution"
   when available; empty strings when missing.

RESUME_TEXT:
---
{combined_resume_text}
---"#
    )
}

/// Builds the qualitative evaluation prompt for a normalized profile against
/// a job post.
pub fn evaluator_prompt(profile_json: &str, title: &str, description: &str, requirements: &str, responsibilities: &str) -> String {
    format!(
        r#"Evaluate the candidate profile below against the job post and return a single
valid JSON object with exactly these keys:
- "strengths": array of strings, reasons the candidate is a good fit
- "weaknesses": array of strings, reasons the candidate may not be a good fit
- "score": number from 1 to 10, higher is better

Be specific: cite skills, durations, and domains from the profile. Do not invent
experience the profile does not contain.

JOB POST:
Title: {title}
Description: {description}
Requirements: {requirements}
Responsibilities: {responsibilities}

CANDIDATE PROFILE (JSON):
{profile_json}"#
    )
}

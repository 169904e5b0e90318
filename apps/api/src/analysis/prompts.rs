// Prompt templates for the analysis tasks. Placeholders in `{braces}` are
// replaced with JSON-serialised inputs before sending.

pub const COMPATIBILITY_SYSTEM: &str = "You are an experienced technical recruiter. \
    Assess how well a candidate fits a job. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";

pub const COMPATIBILITY_PROMPT_TEMPLATE: &str = r#"Assess the candidate against the job below.

JOB:
{job}

CANDIDATE:
{candidate}

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "breakdown": {"skills": 80, "experience": 65, "education": 70, "overall": 72},
  "strengths": ["..."],
  "skill_gaps": ["..."],
  "experience_gaps": ["..."],
  "recommendations": ["..."],
  "summary": "One paragraph."
}
All numbers are between 0 and 100."#;

pub const SKILL_MATCH_PROMPT_TEMPLATE: &str = r#"Compare the candidate's skills with the job's skills.

JOB SKILLS:
{job_skills}

CANDIDATE SKILLS:
{candidate_skills}

Return a JSON object with this EXACT schema:
{
  "matching_skills": [
    {"job_skill": "React", "candidate_skill": "React.js", "match_quality": "similar"}
  ],
  "missing_skills": [
    {"skill": "GraphQL"}
  ]
}
`match_quality` is one of "exact", "similar", "partial".
Every job skill appears in exactly one of the two lists, spelled as in JOB SKILLS."#;

pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"Recommend how to learn each of these skills.

SKILLS:
{skills}

Return a JSON object with this EXACT schema:
{
  "recommendations": [
    {
      "skill": "GraphQL",
      "learning_path": "Short description of the path.",
      "resources": [{"title": "...", "kind": "course", "url": "https://..."}],
      "time_estimate": "3-4 weeks",
      "difficulty": "intermediate"
    }
  ]
}
`difficulty` is one of "beginner", "intermediate", "advanced"."#;

pub const ALIAS_PROMPT_TEMPLATE: &str = r#"Some required skills may be held by the candidate under a different name.

REQUIRED SKILLS:
{required}

CANDIDATE SKILLS:
{held}

Return a JSON object with this EXACT schema:
{
  "aliases": [
    {"required": "React", "held": "React.js"}
  ]
}
Only include pairs that name the same skill. Use the spellings from the input lists."#;

pub const EXTRACT_SKILLS_PROMPT_TEMPLATE: &str = r#"Extract the skills this job asks for.

JOB:
{job}

Return a JSON object with this EXACT schema:
{
  "skills": [
    {"name": "Rust", "importance": "required", "min_level": "Advanced"}
  ]
}
`importance` is one of "required", "preferred", "nice_to_have".
`min_level` is one of "Beginner", "Intermediate", "Advanced", "Expert" or null."#;

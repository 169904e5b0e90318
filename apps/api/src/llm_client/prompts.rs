// Shared prompt fragments. Each task-specific prompt lives next to the code
// that issues it (see analysis/prompts.rs).

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every skill-related prompt so name variants resolve consistently.
pub const SYNONYM_INSTRUCTION: &str = "\
    Treat common name variants of the same technology as the same skill \
    (for example 'React' and 'React.js', 'Postgres' and 'PostgreSQL'). \
    Matching is case-insensitive. Never invent skills that are not in the input.";

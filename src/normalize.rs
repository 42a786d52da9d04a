//! Skill normalization
//!
//! Maps raw skill tokens onto canonical names through an alias table. Lookups
//! are case-insensitive; unknown tokens pass through trimmed. The table is a
//! value, so callers can extend it (see `skills.aliases` in the config) without
//! touching ranking code.

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

/// Built-in aliases: canonical name followed by its lowercase spellings
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    // JavaScript ecosystem
    ("JavaScript", &["javascript", "js", "ecmascript", "es6"]),
    ("TypeScript", &["typescript", "ts"]),
    ("React", &["react", "react.js", "reactjs", "react js"]),
    ("Node.js", &["node.js", "nodejs", "node js", "node"]),
    ("Express", &["express", "express.js", "expressjs"]),
    ("Vue.js", &["vue", "vue.js", "vuejs"]),
    ("Angular", &["angular", "angular.js", "angularjs"]),
    ("Next.js", &["next.js", "nextjs"]),
    ("NestJS", &["nest.js", "nestjs"]),
    // Python
    ("Python", &["python", "python3", "python 3"]),
    ("Django", &["django"]),
    ("FastAPI", &["fastapi", "fast api"]),
    ("Flask", &["flask"]),
    // JVM and .NET
    ("Java", &["java"]),
    ("Spring", &["spring", "spring framework"]),
    ("Spring Boot", &["spring boot", "springboot"]),
    ("C#", &["c#", "csharp", "c sharp"]),
    (".NET", &[".net", "dotnet", "dot net"]),
    // Web basics
    ("HTML", &["html", "html5"]),
    ("CSS", &["css", "css3"]),
    // Databases
    ("SQL", &["sql"]),
    ("PL/SQL", &["pl/sql", "plsql"]),
    ("PostgreSQL", &["postgresql", "postgres", "psql"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    // Cloud and ops
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("AWS", &["aws", "amazon web services"]),
    ("Azure", &["azure", "microsoft azure"]),
    ("GCP", &["gcp", "google cloud", "google cloud platform"]),
    ("Git", &["git"]),
    ("Bash", &["bash"]),
    // Process
    ("Scrum", &["scrum"]),
    ("Agile", &["agile"]),
    ("Jira", &["jira"]),
    // Misc languages
    ("R", &["r"]),
    ("Rust", &["rust", "rustlang"]),
    ("Go", &["go", "golang"]),
];

/// Alias → canonical lookup table
#[derive(Debug, Clone)]
pub struct SkillAliases {
    table: HashMap<String, String>,
}

impl SkillAliases {
    /// Table with no aliases: every token passes through
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut aliases = Self::empty();
        for (canonical, spellings) in BUILTIN_ALIASES {
            for spelling in *spellings {
                aliases.insert(spelling, canonical);
            }
        }
        aliases
    }

    /// Add or replace an alias; the key is matched case-insensitively
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let key = alias.trim().to_lowercase();
        if !key.is_empty() {
            self.table.insert(key, canonical.trim().to_string());
        }
    }

    /// Merge extra aliases over the current table
    pub fn with_overrides<'a, I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (alias, canonical) in extra {
            self.insert(alias, canonical);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Canonical name for one raw token
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.table
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Normalize a token list, dropping blanks and case-insensitive duplicates.
    /// First occurrence wins and order is preserved.
    pub fn normalize_all<I, S>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut skills = Vec::new();
        for token in raw {
            let canonical = self.normalize(token.as_ref());
            if canonical.is_empty() {
                continue;
            }
            if seen.insert(canonical.to_lowercase()) {
                skills.push(canonical);
            }
        }
        skills
    }
}

impl Default for SkillAliases {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_react_spellings_collapse() {
        let aliases = SkillAliases::builtin();
        assert_eq!(aliases.normalize("React.js"), "React");
        assert_eq!(aliases.normalize("reactjs"), "React");
        assert_eq!(aliases.normalize("  REACT  "), "React");
    }

    #[test]
    fn test_unknown_passes_through_trimmed() {
        let aliases = SkillAliases::builtin();
        assert_eq!(aliases.normalize("  Elixir "), "Elixir");
    }

    #[test]
    fn test_normalize_all_dedups_case_insensitively() {
        let aliases = SkillAliases::builtin();
        let skills = aliases.normalize_all(["React.js", "reactjs", "Elixir", "elixir", " ", "k8s"]);
        assert_eq!(skills, vec!["React", "Elixir", "Kubernetes"]);
    }

    #[test]
    fn test_overrides_extend_table() {
        let mut extra = std::collections::HashMap::new();
        extra.insert("TF".to_string(), "Terraform".to_string());
        extra.insert("js".to_string(), "JS".to_string());

        let aliases = SkillAliases::builtin().with_overrides(&extra);
        assert_eq!(aliases.normalize("tf"), "Terraform");
        assert_eq!(aliases.normalize("JS"), "JS");
    }

    #[test]
    fn test_empty_table_only_trims() {
        let aliases = SkillAliases::empty();
        assert!(aliases.is_empty());
        assert_eq!(aliases.normalize(" reactjs "), "reactjs");
    }
}

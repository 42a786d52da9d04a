//! Profile repository: transactional upsert, lookups and the two candidate finders

use super::vector::{decode_vector, encode_vector, nearest};
use super::Database;
use crate::error::{Result, SkillMatchError};
use crate::profile::{
    Activity, CandidateProfile, CvRecord, Education, Language, Project, Publication, Skill,
    WorkExperience,
};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::Serialize;

/// Everything needed to write one profile.
///
/// `record` is expected to be post-processed already: skills normalized and
/// deduplicated, work-experience durations recomputed.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub record: CvRecord,
    pub experience_score: f64,
    pub embedding: Vec<f32>,
    pub cv_document: Option<String>,
    pub cv_fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub profile_id: i64,
    pub created: bool,
    /// Previous CV document, superseded by this write and safe to delete
    pub replaced_document: Option<String>,
}

/// One row of the profile listing
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub experience_score: f64,
    pub skill_count: usize,
}

impl Database {
    /// Create or update the profile identified by the draft's email.
    ///
    /// Scalars are overwritten and every relation collection is deleted and
    /// re-inserted inside a single `BEGIN IMMEDIATE` transaction, so concurrent
    /// ingestions of the same email serialize and no partial profile is visible.
    /// Drafts without an email always create a new profile.
    pub fn upsert_profile(&self, draft: &ProfileDraft) -> Result<UpsertOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let info = &draft.record.personal_info;
        let email = info.email();
        let (name, surname) = info.split_name();
        let description = draft.record.summary.clone().unwrap_or_default();
        let embedding = encode_vector(&draft.embedding);
        let now = Utc::now();

        let existing: Option<(i64, Option<String>)> = match email {
            Some(email) => tx
                .query_row(
                    "SELECT id, cv_document FROM profiles WHERE email = ?1",
                    [email],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?,
            None => None,
        };

        let outcome = match existing {
            Some((profile_id, previous_document)) => {
                tx.execute(
                    "UPDATE profiles SET
                        name = ?1, surname = ?2, phone = ?3, linkedin_url = ?4,
                        github_url = ?5, description = ?6, experience_score = ?7,
                        embedding = ?8,
                        cv_document = COALESCE(?9, cv_document),
                        cv_fingerprint = COALESCE(?10, cv_fingerprint),
                        updated_at = ?11
                     WHERE id = ?12",
                    params![
                        name,
                        surname,
                        info.phone,
                        info.linkedin,
                        info.github,
                        description,
                        draft.experience_score,
                        embedding,
                        draft.cv_document,
                        draft.cv_fingerprint,
                        now,
                        profile_id,
                    ],
                )?;

                let replaced_document = match (&draft.cv_document, previous_document) {
                    (Some(new), Some(old)) if *new != old => Some(old),
                    _ => None,
                };
                UpsertOutcome {
                    profile_id,
                    created: false,
                    replaced_document,
                }
            }
            None => {
                tx.execute(
                    "INSERT INTO profiles (
                        name, surname, email, phone, linkedin_url, github_url, description,
                        experience_score, embedding, cv_document, cv_fingerprint,
                        created_at, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                    params![
                        name,
                        surname,
                        email,
                        info.phone,
                        info.linkedin,
                        info.github,
                        description,
                        draft.experience_score,
                        embedding,
                        draft.cv_document,
                        draft.cv_fingerprint,
                        now,
                    ],
                )?;
                UpsertOutcome {
                    profile_id: tx.last_insert_rowid(),
                    created: true,
                    replaced_document: None,
                }
            }
        };

        replace_relations(&tx, outcome.profile_id, &draft.record)?;
        tx.commit()?;

        tracing::debug!(
            "Wrote profile {} ({} skills, {} work entries, {} projects)",
            outcome.profile_id,
            draft.record.skills.len(),
            draft.record.work_experience.len(),
            draft.record.projects.len()
        );
        Ok(outcome)
    }

    /// Load a full profile, or `NotFound`
    pub fn get_profile(&self, id: i64) -> Result<CandidateProfile> {
        let conn = self.get_conn()?;
        load_profile(&conn, id)?.ok_or_else(|| SkillMatchError::not_found("profile", id))
    }

    /// Load several profiles, preserving the order of `ids` and skipping missing ones
    pub fn get_profiles(&self, ids: &[i64]) -> Result<Vec<CandidateProfile>> {
        let conn = self.get_conn()?;
        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = load_profile(&conn, *id)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    pub fn find_profile_id_by_email(&self, email: &str) -> Result<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM profiles WHERE email = ?1",
                [email.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Most recent profile written from a given document fingerprint
    pub fn find_profile_id_by_fingerprint(&self, fingerprint: &str) -> Result<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM profiles WHERE cv_fingerprint = ?1 ORDER BY id DESC LIMIT 1",
                [fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn profile_exists(&self, id: i64) -> Result<bool> {
        let conn = self.get_conn()?;
        profile_exists(&conn, id)
    }

    /// Name of the stored CV document behind a profile
    pub fn cv_document(&self, profile_id: i64) -> Result<Option<String>> {
        let conn = self.get_conn()?;
        let document: Option<Option<String>> = conn
            .query_row(
                "SELECT cv_document FROM profiles WHERE id = ?1",
                [profile_id],
                |row| row.get(0),
            )
            .optional()?;
        document.ok_or_else(|| SkillMatchError::not_found("profile", profile_id))
    }

    /// Page through profiles ordered by surname, name.
    ///
    /// `filter` matches name or surname as a case-insensitive substring.
    /// Returns the page and the total number of matching profiles.
    pub fn list_profiles(
        &self,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ProfileSummary>, usize)> {
        let conn = self.get_conn()?;
        let pattern = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(like_pattern);

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM profiles
             WHERE ?1 IS NULL OR name LIKE ?1 ESCAPE '\\' OR surname LIKE ?1 ESCAPE '\\'",
            [&pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.surname, p.email, p.experience_score,
                    (SELECT COUNT(*) FROM profile_skills ps WHERE ps.profile_id = p.id)
             FROM profiles p
             WHERE ?1 IS NULL OR p.name LIKE ?1 ESCAPE '\\' OR p.surname LIKE ?1 ESCAPE '\\'
             ORDER BY p.surname COLLATE NOCASE, p.name COLLATE NOCASE, p.id
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64, offset as i64], |row| {
            Ok(ProfileSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                surname: row.get(2)?,
                email: row.get(3)?,
                experience_score: row.get(4)?,
                skill_count: row.get::<_, i64>(5)? as usize,
            })
        })?;

        let page = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((page, total as usize))
    }

    /// Profiles matching every token, either in the description or in a skill name.
    ///
    /// Matching is a case-insensitive substring test. An empty token list
    /// matches nothing.
    pub fn keyword_candidates(&self, tokens: &[String]) -> Result<Vec<i64>> {
        let patterns: Vec<String> = tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(like_pattern)
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<String> = (1..=patterns.len())
            .map(|i| {
                format!(
                    "(p.description LIKE ?{i} ESCAPE '\\' OR EXISTS (
                        SELECT 1 FROM profile_skills ps JOIN skills s ON s.id = ps.skill_id
                        WHERE ps.profile_id = p.id AND s.name LIKE ?{i} ESCAPE '\\'))"
                )
            })
            .collect();
        let sql = format!(
            "SELECT p.id FROM profiles p WHERE {} ORDER BY p.id",
            clauses.join(" AND ")
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(patterns.iter()), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// The `limit` profiles closest to `query` by L2 distance, ascending
    pub fn nearest_profiles(&self, query: &[f32], limit: usize) -> Result<Vec<(i64, f32)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, embedding FROM profiles WHERE embedding IS NOT NULL")?;
        let rows = stmt
            .query_map([], |row| {
                let bytes: Vec<u8> = row.get(1)?;
                Ok((row.get::<_, i64>(0)?, decode_vector(&bytes)))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(nearest(query, &rows, limit))
    }
}

fn profile_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM profiles WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(super) fn ensure_profile(conn: &Connection, id: i64) -> Result<()> {
    if profile_exists(conn, id)? {
        Ok(())
    } else {
        Err(SkillMatchError::not_found("profile", id))
    }
}

/// `%token%` with LIKE wildcards escaped
fn like_pattern(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() + 2);
    escaped.push('%');
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn tags_json(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| SkillMatchError::Json {
        source: e,
        context: "Failed to encode technology tags".to_string(),
    })
}

fn tags_from_json(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_default()
}

/// Delete every owned row of the profile, then insert the fresh set
fn replace_relations(conn: &Connection, profile_id: i64, record: &CvRecord) -> Result<()> {
    for table in [
        "profile_skills",
        "work_experiences",
        "education",
        "projects",
        "languages",
        "publications",
        "activities",
    ] {
        conn.execute(
            &format!("DELETE FROM {} WHERE profile_id = ?1", table),
            [profile_id],
        )?;
    }

    {
        let mut create = conn.prepare("INSERT INTO skills (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")?;
        let mut lookup = conn.prepare("SELECT id FROM skills WHERE name = ?1")?;
        let mut link = conn.prepare(
            "INSERT OR IGNORE INTO profile_skills (profile_id, skill_id, ordinal) VALUES (?1, ?2, ?3)",
        )?;
        for (ordinal, skill) in record.skills.iter().enumerate() {
            create.execute([skill])?;
            let skill_id: i64 = lookup.query_row([skill], |row| row.get(0))?;
            link.execute(params![profile_id, skill_id, ordinal as i64])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO work_experiences (
                profile_id, ordinal, position, company, start_date, end_date,
                duration_months, description, technologies_used
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for (ordinal, exp) in record.work_experience.iter().enumerate() {
            stmt.execute(params![
                profile_id,
                ordinal as i64,
                exp.position,
                exp.company,
                exp.start_date,
                exp.end_date,
                exp.duration_months,
                exp.description,
                tags_json(&exp.technologies_used)?,
            ])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO education (profile_id, ordinal, institution, degree, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (ordinal, edu) in record.education.iter().enumerate() {
            stmt.execute(params![
                profile_id,
                ordinal as i64,
                edu.institution,
                edu.degree,
                edu.start_date,
                edu.end_date,
            ])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO projects (profile_id, ordinal, name, description, technologies_used)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (ordinal, project) in record.projects.iter().enumerate() {
            stmt.execute(params![
                profile_id,
                ordinal as i64,
                project.name,
                project.description,
                tags_json(&project.technologies_used)?,
            ])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO languages (profile_id, ordinal, name, level) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (ordinal, language) in record.languages.iter().enumerate() {
            stmt.execute(params![profile_id, ordinal as i64, language.name, language.level])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO publications (profile_id, ordinal, title, outlet, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (ordinal, publication) in record.publications.iter().enumerate() {
            stmt.execute(params![
                profile_id,
                ordinal as i64,
                publication.title,
                publication.outlet,
                publication.date,
            ])?;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO activities (profile_id, ordinal, name, role, start_date, end_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (ordinal, activity) in record.activities.iter().enumerate() {
            stmt.execute(params![
                profile_id,
                ordinal as i64,
                activity.name,
                activity.role,
                activity.start_date,
                activity.end_date,
                activity.description,
            ])?;
        }
    }

    Ok(())
}

fn load_profile(conn: &Connection, id: i64) -> Result<Option<CandidateProfile>> {
    let profile = conn
        .query_row(
            "SELECT id, name, surname, email, phone, linkedin_url, github_url, description,
                    experience_score, embedding, cv_document, cv_fingerprint
             FROM profiles WHERE id = ?1",
            [id],
            |row| {
                let embedding: Option<Vec<u8>> = row.get(9)?;
                Ok(CandidateProfile {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    surname: row.get(2)?,
                    email: row.get(3)?,
                    phone: row.get(4)?,
                    linkedin_url: row.get(5)?,
                    github_url: row.get(6)?,
                    description: row.get(7)?,
                    experience_score: row.get(8)?,
                    embedding: embedding.as_deref().map(decode_vector).unwrap_or_default(),
                    cv_document: row.get(10)?,
                    cv_fingerprint: row.get(11)?,
                    skills: Vec::new(),
                    work_experiences: Vec::new(),
                    education: Vec::new(),
                    projects: Vec::new(),
                    languages: Vec::new(),
                    publications: Vec::new(),
                    activities: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut profile) = profile else {
        return Ok(None);
    };

    profile.skills = query_children(
        conn,
        "SELECT s.id, s.name FROM profile_skills ps JOIN skills s ON s.id = ps.skill_id
         WHERE ps.profile_id = ?1 ORDER BY ps.ordinal",
        id,
        |row| {
            Ok(Skill {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )?;
    profile.work_experiences = query_children(
        conn,
        "SELECT position, company, start_date, end_date, duration_months, description,
                technologies_used
         FROM work_experiences WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(WorkExperience {
                position: row.get(0)?,
                company: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                duration_months: row.get(4)?,
                description: row.get(5)?,
                technologies_used: tags_from_json(row.get(6)?),
            })
        },
    )?;
    profile.education = query_children(
        conn,
        "SELECT institution, degree, start_date, end_date
         FROM education WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(Education {
                institution: row.get(0)?,
                degree: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
            })
        },
    )?;
    profile.projects = query_children(
        conn,
        "SELECT name, description, technologies_used
         FROM projects WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(Project {
                name: row.get(0)?,
                description: row.get(1)?,
                technologies_used: tags_from_json(row.get(2)?),
            })
        },
    )?;
    profile.languages = query_children(
        conn,
        "SELECT name, level FROM languages WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(Language {
                name: row.get(0)?,
                level: row.get(1)?,
            })
        },
    )?;
    profile.publications = query_children(
        conn,
        "SELECT title, outlet, date FROM publications WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(Publication {
                title: row.get(0)?,
                outlet: row.get(1)?,
                date: row.get(2)?,
            })
        },
    )?;
    profile.activities = query_children(
        conn,
        "SELECT name, role, start_date, end_date, description
         FROM activities WHERE profile_id = ?1 ORDER BY ordinal",
        id,
        |row| {
            Ok(Activity {
                name: row.get(0)?,
                role: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
                description: row.get(4)?,
            })
        },
    )?;

    Ok(Some(profile))
}

fn query_children<T, F>(conn: &Connection, sql: &str, profile_id: i64, map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([profile_id], map)?
        .collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PersonalInfo;
    use tempfile::TempDir;

    fn database() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        (temp_dir, db)
    }

    fn draft(email: Option<&str>, skills: &[&str], summary: &str) -> ProfileDraft {
        ProfileDraft {
            record: CvRecord {
                personal_info: PersonalInfo {
                    name: Some("Anna Nowak".to_string()),
                    email: email.map(str::to_string),
                    ..Default::default()
                },
                summary: Some(summary.to_string()),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                work_experience: vec![WorkExperience {
                    company: Some("Acme".to_string()),
                    technologies_used: vec!["Rust".to_string()],
                    duration_months: Some(12),
                    ..Default::default()
                }],
                ..Default::default()
            },
            experience_score: 1.0,
            embedding: vec![1.0, 0.0],
            cv_document: None,
            cv_fingerprint: None,
        }
    }

    #[test]
    fn test_upsert_creates_then_updates_by_email() {
        let (_dir, db) = database();

        let first = db
            .upsert_profile(&draft(Some("anna@example.com"), &["Rust"], "first"))
            .unwrap();
        assert!(first.created);

        let second = db
            .upsert_profile(&draft(Some("ANNA@example.com"), &["Go"], "second"))
            .unwrap();
        assert!(!second.created);
        assert_eq!(first.profile_id, second.profile_id);

        let profile = db.get_profile(first.profile_id).unwrap();
        assert_eq!(profile.description, "second");
        assert_eq!(profile.skill_names(), vec!["Go"]);
        assert_eq!(profile.work_experiences.len(), 1);
        assert_eq!(profile.work_experiences[0].technologies_used, vec!["Rust"]);
        assert_eq!(profile.work_experiences[0].duration_months, Some(12));
    }

    #[test]
    fn test_profiles_without_email_stand_alone() {
        let (_dir, db) = database();

        let a = db.upsert_profile(&draft(None, &[], "a")).unwrap();
        let b = db.upsert_profile(&draft(None, &[], "b")).unwrap();
        assert!(a.created && b.created);
        assert_ne!(a.profile_id, b.profile_id);
    }

    #[test]
    fn test_skills_shared_case_insensitively() {
        let (_dir, db) = database();

        let a = db
            .upsert_profile(&draft(Some("a@example.com"), &["React"], ""))
            .unwrap();
        let b = db
            .upsert_profile(&draft(Some("b@example.com"), &["react"], ""))
            .unwrap();

        let a = db.get_profile(a.profile_id).unwrap();
        let b = db.get_profile(b.profile_id).unwrap();
        assert_eq!(a.skills[0].id, b.skills[0].id);
        assert_eq!(b.skills[0].name, "React");
        assert_eq!(db.stats().unwrap().skill_count, 1);
    }

    #[test]
    fn test_replaced_document_reported() {
        let (_dir, db) = database();

        let mut first = draft(Some("a@example.com"), &[], "");
        first.cv_document = Some("old.pdf".to_string());
        db.upsert_profile(&first).unwrap();

        let mut second = draft(Some("a@example.com"), &[], "");
        second.cv_document = Some("new.pdf".to_string());
        let outcome = db.upsert_profile(&second).unwrap();
        assert_eq!(outcome.replaced_document.as_deref(), Some("old.pdf"));

        // A write without a document keeps the current one
        let outcome = db
            .upsert_profile(&draft(Some("a@example.com"), &[], ""))
            .unwrap();
        assert_eq!(outcome.replaced_document, None);
        assert_eq!(
            db.cv_document(outcome.profile_id).unwrap().as_deref(),
            Some("new.pdf")
        );
    }

    #[test]
    fn test_keyword_candidates_require_every_token() {
        let (_dir, db) = database();

        let both = db
            .upsert_profile(&draft(Some("a@example.com"), &["Python"], "Django backend work"))
            .unwrap();
        db.upsert_profile(&draft(Some("b@example.com"), &["Python"], "data analysis"))
            .unwrap();

        let tokens = vec!["python".to_string(), "django".to_string()];
        assert_eq!(db.keyword_candidates(&tokens).unwrap(), vec![both.profile_id]);
        assert!(db.keyword_candidates(&[]).unwrap().is_empty());
        assert!(db.keyword_candidates(&["  ".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_wildcards_are_literal() {
        let (_dir, db) = database();
        db.upsert_profile(&draft(Some("a@example.com"), &["Rust"], "plain"))
            .unwrap();

        assert!(db.keyword_candidates(&["%".to_string()]).unwrap().is_empty());
        assert!(db.keyword_candidates(&["_".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_list_profiles_filters_and_pages() {
        let (_dir, db) = database();
        for (i, email) in ["a@example.com", "b@example.com", "c@example.com"]
            .iter()
            .enumerate()
        {
            let mut d = draft(Some(email), &[], "");
            d.record.personal_info.name = Some(format!("Jan Kowalski{}", i));
            db.upsert_profile(&d).unwrap();
        }

        let (page, total) = db.list_profiles(None, 1, 1).unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].surname, "Kowalski1");

        let (page, total) = db.list_profiles(Some("kowalski2"), 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].surname, "Kowalski2");
    }

    #[test]
    fn test_get_profile_not_found() {
        let (_dir, db) = database();
        assert!(matches!(
            db.get_profile(42),
            Err(SkillMatchError::NotFound { entity: "profile", .. })
        ));
        assert!(db.cv_document(42).is_err());
    }

    #[test]
    fn test_nearest_profiles() {
        let (_dir, db) = database();
        let mut far = draft(Some("far@example.com"), &[], "");
        far.embedding = vec![0.0, 1.0];
        let far = db.upsert_profile(&far).unwrap();
        let near = db
            .upsert_profile(&draft(Some("near@example.com"), &[], ""))
            .unwrap();

        let ranked = db.nearest_profiles(&[1.0, 0.0], 10).unwrap();
        assert_eq!(ranked[0].0, near.profile_id);
        assert_eq!(ranked[1].0, far.profile_id);
        assert!(ranked[0].1 < ranked[1].1);
    }
}

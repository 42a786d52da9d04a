//! Recruitment projects, their ordered member lists, and search feedback

use super::profiles::ensure_profile;
use super::Database;
use crate::error::{Result, SkillMatchError};
use crate::profile::{FeedbackEntry, MemberStatus, ProjectMember, Rating, RecruitmentProject};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

impl Database {
    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<RecruitmentProject> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SkillMatchError::Validation(
                "project name must not be empty".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO recruitment_projects (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, created_at],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!("Created recruitment project {} ({})", id, name);
        Ok(RecruitmentProject {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at,
        })
    }

    pub fn list_projects(&self) -> Result<Vec<RecruitmentProject>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at FROM recruitment_projects ORDER BY id",
        )?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<RecruitmentProject> {
        let conn = self.get_conn()?;
        load_project(&conn, id)?.ok_or_else(|| SkillMatchError::not_found("project", id))
    }

    /// Append a profile to the project's member list.
    ///
    /// Re-adding an existing member leaves it untouched.
    pub fn add_member(&self, project_id: i64, profile_id: i64) -> Result<ProjectMember> {
        let conn = self.get_conn()?;
        ensure_project(&conn, project_id)?;
        ensure_profile(&conn, profile_id)?;

        conn.execute(
            "INSERT OR IGNORE INTO project_members (project_id, profile_id, position, status, added_at)
             VALUES (?1, ?2,
                     (SELECT COALESCE(MAX(position), 0) + 1 FROM project_members WHERE project_id = ?1),
                     ?3, ?4)",
            params![project_id, profile_id, MemberStatus::New.as_str(), Utc::now()],
        )?;

        load_member(&conn, project_id, profile_id)?
            .ok_or_else(|| SkillMatchError::not_found("member", profile_id))
    }

    /// Change a member's status and, when given, replace its notes
    pub fn update_member(
        &self,
        project_id: i64,
        profile_id: i64,
        status: Option<MemberStatus>,
        notes: Option<&str>,
    ) -> Result<ProjectMember> {
        let conn = self.get_conn()?;
        ensure_project(&conn, project_id)?;

        let updated = conn.execute(
            "UPDATE project_members
             SET status = COALESCE(?3, status), notes = COALESCE(?4, notes)
             WHERE project_id = ?1 AND profile_id = ?2",
            params![project_id, profile_id, status.map(|s| s.as_str()), notes],
        )?;
        if updated == 0 {
            return Err(SkillMatchError::not_found("member", profile_id));
        }

        load_member(&conn, project_id, profile_id)?
            .ok_or_else(|| SkillMatchError::not_found("member", profile_id))
    }

    pub fn remove_member(&self, project_id: i64, profile_id: i64) -> Result<()> {
        let conn = self.get_conn()?;
        ensure_project(&conn, project_id)?;

        let removed = conn.execute(
            "DELETE FROM project_members WHERE project_id = ?1 AND profile_id = ?2",
            params![project_id, profile_id],
        )?;
        if removed == 0 {
            return Err(SkillMatchError::not_found("member", profile_id));
        }
        Ok(())
    }

    /// Members in the order they were added
    pub fn list_members(&self, project_id: i64) -> Result<Vec<ProjectMember>> {
        let conn = self.get_conn()?;
        ensure_project(&conn, project_id)?;

        let mut stmt = conn.prepare(
            "SELECT project_id, profile_id, position, status, notes, added_at
             FROM project_members WHERE project_id = ?1 ORDER BY position",
        )?;
        let members = stmt
            .query_map([project_id], member_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Append one rating to the feedback log
    pub fn record_feedback(&self, query: &str, profile_id: i64, rating: Rating) -> Result<FeedbackEntry> {
        let conn = self.get_conn()?;
        ensure_profile(&conn, profile_id)?;

        let recorded_at = Utc::now();
        conn.execute(
            "INSERT INTO search_feedback (query, profile_id, rating, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![query, profile_id, rating.as_str(), recorded_at],
        )?;

        Ok(FeedbackEntry {
            id: conn.last_insert_rowid(),
            query: query.to_string(),
            profile_id,
            rating,
            recorded_at,
        })
    }
}

fn ensure_project(conn: &Connection, id: i64) -> Result<()> {
    match load_project(conn, id)? {
        Some(_) => Ok(()),
        None => Err(SkillMatchError::not_found("project", id)),
    }
}

fn load_project(conn: &Connection, id: i64) -> Result<Option<RecruitmentProject>> {
    let project = conn
        .query_row(
            "SELECT id, name, description, created_at FROM recruitment_projects WHERE id = ?1",
            [id],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

fn load_member(conn: &Connection, project_id: i64, profile_id: i64) -> Result<Option<ProjectMember>> {
    let member = conn
        .query_row(
            "SELECT project_id, profile_id, position, status, notes, added_at
             FROM project_members WHERE project_id = ?1 AND profile_id = ?2",
            params![project_id, profile_id],
            member_from_row,
        )
        .optional()?;
    Ok(member)
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<RecruitmentProject> {
    Ok(RecruitmentProject {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectMember> {
    let status: String = row.get(3)?;
    Ok(ProjectMember {
        project_id: row.get(0)?,
        profile_id: row.get(1)?,
        position: row.get(2)?,
        status: status.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
        })?,
        notes: row.get(4)?,
        added_at: row.get(5)?,
    })
}

mod common;

use common::{record, seed_profile};
use skillmatch::profile::{MemberStatus, Rating};
use skillmatch::storage::{StorageManager, StorageStats};
use skillmatch::SkillMatchError;
use tempfile::TempDir;

#[test]
fn test_storage_layout_and_stats() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::new(temp.path().join("data"), 16).unwrap();

    assert!(temp.path().join("data/skillmatch.sqlite").exists());
    assert!(temp.path().join("data/documents").exists());

    // Above the threshold: stored compressed, read back verbatim
    let cv = "Jan Kowalski\nPython developer\n".repeat(20);
    let name = storage.documents.store(cv.as_bytes(), Some("TXT")).unwrap();
    assert!(name.ends_with(".txt"));
    assert_eq!(storage.documents.read(&name).unwrap(), cv.as_bytes());

    seed_profile(&storage, record("Jan Kowalski", None, &["Python"]), vec![0.0, 1.0]);

    let stats = storage.stats().unwrap();
    assert_eq!(stats.db.profile_count, 1);
    assert_eq!(stats.db.skill_count, 1);
    assert_eq!(stats.document_count, 1);
    assert!(stats.total_size_bytes > 0);
    assert_eq!(StorageStats::format_size(2048), "2.00 KB");
}

#[test]
fn test_document_for_profile_without_upload() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::new(temp.path().to_path_buf(), 1024).unwrap();
    let id = seed_profile(&storage, record("Anna Nowak", None, &[]), vec![1.0, 0.0]);

    assert!(matches!(
        storage.document_for(id),
        Err(SkillMatchError::NotFound { entity: "document", .. })
    ));
    assert!(matches!(
        storage.document_for(id + 1),
        Err(SkillMatchError::NotFound { entity: "profile", .. })
    ));
}

#[test]
fn test_recruitment_workflow() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::new(temp.path().to_path_buf(), 1024).unwrap();
    let db = &storage.database;

    let anna = seed_profile(&storage, record("Anna Nowak", Some("anna@example.com"), &["Python"]), vec![1.0, 0.0]);
    let jan = seed_profile(&storage, record("Jan Kowalski", Some("jan@example.com"), &["Java"]), vec![0.0, 1.0]);

    let project = db.create_project("Backend hiring", Some("Q3")).unwrap();
    db.add_member(project.id, jan).unwrap();
    db.add_member(project.id, anna).unwrap();
    // Re-adding keeps the original position
    let again = db.add_member(project.id, jan).unwrap();
    assert_eq!(again.position, 1);

    db.update_member(project.id, anna, Some(MemberStatus::Interview), Some("strong Python"))
        .unwrap();

    let members = db.list_members(project.id).unwrap();
    let order: Vec<i64> = members.iter().map(|m| m.profile_id).collect();
    assert_eq!(order, vec![jan, anna]);
    assert_eq!(members[0].status, MemberStatus::New);
    assert_eq!(members[1].status, MemberStatus::Interview);
    assert_eq!(members[1].notes.as_deref(), Some("strong Python"));

    db.remove_member(project.id, jan).unwrap();
    assert_eq!(db.list_members(project.id).unwrap().len(), 1);

    assert!(matches!(
        db.add_member(project.id, 999),
        Err(SkillMatchError::NotFound { entity: "profile", .. })
    ));
    assert!(matches!(
        db.add_member(999, anna),
        Err(SkillMatchError::NotFound { entity: "project", .. })
    ));

    let entry = db.record_feedback("python dev", anna, Rating::Relevant).unwrap();
    assert_eq!(entry.rating, Rating::Relevant);
    assert_eq!(db.stats().unwrap().feedback_count, 1);
}

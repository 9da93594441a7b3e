//! End-to-end conflict handling against the libSQL store.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tally_core::draft::{ArgumentInput, DecisionData, DraftSnapshot};
use tally_core::enums::SavePhase;
use tally_core::identity::{StaticIdentity, UserIdentity};
use tally_db::TallyDb;
use tally_db::conflict::{Conflict, DuplicateTitleError};
use tally_db::retry::RetryConfig;
use tally_db::store::DecisionStore;
use tally_db::upsert::upsert;
use tally_sync::{AutoSaveSettings, AutoSaver, DraftCell, SilentPolicy, persist_with_policy};

fn draft(title: &str) -> DraftSnapshot {
    DraftSnapshot::new(
        DecisionData::new(title, None),
        vec![
            ArgumentInput::new("cheaper", 4).unwrap(),
            ArgumentInput::new("farther", -1).unwrap(),
        ],
    )
}

#[tokio::test]
async fn silent_policy_resolves_duplicate_title_in_one_retry() {
    let db = TallyDb::open_local(":memory:").await.unwrap();
    let user = UserIdentity::new("alice");
    let taken = upsert(&db, &user, &DecisionData::new("My Plan", None), &[], None)
        .await
        .unwrap();

    let policy = SilentPolicy::default();
    let mut resolutions = Vec::new();
    let current = draft("My Plan");
    let persisted = persist_with_policy(
        &db,
        &policy,
        &RetryConfig::none(),
        &user,
        None,
        || current.clone(),
        |phase| resolutions.push(phase),
    )
    .await
    .unwrap();

    assert_eq!(persisted.upserted.decision.title, "My Plan (2)");
    assert_ne!(persisted.upserted.decision.id, taken.decision.id);
    assert_eq!(
        resolutions
            .iter()
            .filter(|p| **p == SavePhase::ConflictResolving)
            .count(),
        1
    );
    assert_eq!(db.list_decisions("alice", 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_conflict_names_the_holder() {
    let db = TallyDb::open_local(":memory:").await.unwrap();
    let user = UserIdentity::new("alice");
    let taken = upsert(&db, &user, &DecisionData::new("My Plan", None), &[], None)
        .await
        .unwrap();

    let err = upsert(&db, &user, &DecisionData::new("My Plan", None), &[], None)
        .await
        .unwrap_err();
    assert_eq!(
        err.conflict(),
        Some(&Conflict::DuplicateTitle(DuplicateTitleError {
            existing_id: Some(taken.decision.id),
            conflicting_title: "My Plan".into(),
        }))
    );
}

#[tokio::test]
async fn auto_save_against_libsql() {
    let db = Arc::new(TallyDb::open_local(":memory:").await.unwrap());
    let saver = AutoSaver::new(
        Arc::clone(&db),
        Arc::new(StaticIdentity(Some(UserIdentity::new("alice")))),
        AutoSaveSettings {
            debounce: Duration::from_millis(250),
            ..AutoSaveSettings::default()
        },
    );
    let cell = DraftCell::new(draft("Relocate"));
    let handle = saver.attach(cell.clone(), None);

    handle.notify_changed();
    let status = handle.wait_idle().await;
    let id = status.decision_id.unwrap();

    cell.push_argument(ArgumentInput::new("near family", 7).unwrap());
    handle.notify_changed();
    let status = handle.wait_idle().await;
    assert_eq!(status.version, Some(2));

    let stored = db.get_decision(&id).await.unwrap();
    assert_eq!(stored.arguments.len(), 3);
    assert_eq!(stored.score.positive_score, 11);
    assert_eq!(stored.score.negative_score, 1);
}

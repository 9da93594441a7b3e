//! File-backed store: data survives reopening and conflicts classify the
//! same way as in memory.

use pretty_assertions::assert_eq;
use tally_core::draft::{ArgumentInput, DecisionData};
use tally_core::enums::Recommendation;
use tally_core::identity::UserIdentity;
use tally_db::TallyDb;
use tally_db::conflict::SaveErrorKind;
use tally_db::store::DecisionStore;
use tally_db::upsert::{ExistingRecord, upsert};

fn arguments() -> Vec<ArgumentInput> {
    vec![
        ArgumentInput::new("Better salary", 8).unwrap(),
        ArgumentInput::new("Longer commute", -3).unwrap(),
    ]
}

#[tokio::test]
async fn decision_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let path = path.to_str().unwrap();
    let user = UserIdentity::new("alice");

    let id = {
        let db = TallyDb::open_local(path).await.unwrap();
        let saved = upsert(
            &db,
            &user,
            &DecisionData::new("New job", Some("Offer from Acme".into())),
            &arguments(),
            None,
        )
        .await
        .unwrap();
        saved.decision.id
    };

    let db = TallyDb::open_local(path).await.unwrap();
    let loaded = db.get_decision(&id).await.unwrap();
    assert_eq!(loaded.title, "New job");
    assert_eq!(loaded.description.as_deref(), Some("Offer from Acme"));
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.arguments.len(), 2);
    assert_eq!(loaded.arguments[0].text, "Better salary");
    assert_eq!(loaded.score.positive_score, 8);
    assert_eq!(loaded.score.negative_score, 3);
    assert_eq!(loaded.score.recommendation, Recommendation::Favorable);
}

#[tokio::test]
async fn two_writers_one_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let db = TallyDb::open_local(path.to_str().unwrap()).await.unwrap();
    let user = UserIdentity::new("alice");

    let created = upsert(&db, &user, &DecisionData::new("Move", None), &[], None)
        .await
        .unwrap();
    let seen = ExistingRecord::from(&created.decision);

    let first = upsert(&db, &user, &DecisionData::new("Move", None), &arguments(), Some(&seen)).await;
    let second = upsert(&db, &user, &DecisionData::new("Move!", None), &[], Some(&seen)).await;

    assert_eq!(first.unwrap().decision.version, 2);
    assert_eq!(second.unwrap_err().kind(), SaveErrorKind::OptimisticLock);
    let stored = db.get_decision(&created.decision.id).await.unwrap();
    assert_eq!(stored.title, "Move");
    assert_eq!(stored.arguments.len(), 2);
}

//! Integration tests for the session registry

use std::collections::BTreeSet;
use std::thread;

use scout_doe::analysis::{ModelType, RegressionEngine};
use scout_doe::roles::FactorRoles;
use scout_doe::session::{SessionId, SessionStore};
use scout_doe::table::Dataset;
use scout_doe::Error;

fn data(offset: f64) -> Dataset {
    Dataset::new()
        .with_numeric("NaCl", vec![50.0, 100.0, 150.0, 200.0])
        .unwrap()
        .with_numeric("Tm", vec![50.0 + offset, 51.0 + offset, 53.0 + offset, 52.5 + offset])
        .unwrap()
}

#[test]
fn test_sessions_are_isolated() {
    let store = SessionStore::new();
    let first = store.create(RegressionEngine::new());
    let second = store.create(RegressionEngine::new());
    assert_ne!(first, second);

    store
        .with_session_mut(first, |engine| {
            engine.set_data(&data(0.0), FactorRoles::numeric(["NaCl"]).unwrap(), "Tm")?;
            engine.fit(ModelType::Linear).map(|_| ())
        })
        .unwrap()
        .unwrap();

    assert!(store.with_session(first, |e| e.model().is_some()).unwrap());
    assert!(!store.with_session(second, RegressionEngine::has_data).unwrap());
}

#[test]
fn test_unknown_session() {
    let store: SessionStore<RegressionEngine> = SessionStore::new();
    let id = store.create(RegressionEngine::new());
    store.remove(id).unwrap();

    assert!(!store.contains(id));
    let err = store.with_session(id, |_| ()).unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(ref name) if name == &id.to_string()));
    assert!(matches!(store.remove(id), Err(Error::SessionNotFound(_))));
}

#[test]
fn test_ids_not_reused_after_clear() {
    let store = SessionStore::new();
    let before = store.create(0_u32);
    store.clear();
    assert!(store.is_empty());
    let after = store.create(1_u32);
    assert!(after.get() > before.get());
    assert_eq!(format!("{after}"), format!("session-{}", after.get()));
}

#[test]
fn test_concurrent_sessions() {
    let store = SessionStore::new();
    let ids: Vec<SessionId> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = &store;
                scope.spawn(move || {
                    let id = store.create(RegressionEngine::new());
                    store
                        .with_session_mut(id, |engine| {
                            engine.set_data(
                                &data(f64::from(i)),
                                FactorRoles::numeric(["NaCl"]).unwrap(),
                                "Tm",
                            )?;
                            engine.fit(ModelType::Linear).map(|_| ())
                        })
                        .unwrap()
                        .unwrap();
                    id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(store.len(), 8);
    assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), 8);
    for id in ids {
        let fitted = store
            .with_session(id, |engine| engine.model().map(|m| m.statistics().observations))
            .unwrap();
        assert_eq!(fitted, Some(4));
    }
}

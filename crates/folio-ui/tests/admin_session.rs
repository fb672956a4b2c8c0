use folio_test_support::fixtures::{baseline, pdf_file, session_until};
use folio_test_support::mocks::{Call, ScriptedTransport, http_error};
use folio_ui::core::auth::{AuthError, Credential, EXPIRES_KEY, SessionStore, TOKEN_KEY};
use folio_ui::core::clock::{Clock, ManualClock};
use folio_ui::core::navigation::{DisplayMode, Navigator, Route, SessionTransition};
use folio_ui::core::storage::{KeyValueStore, MemoryStore};
use folio_ui::features::library::actions::{
    CoordinatorSettings, MutationCoordinator, MutationError,
};
use folio_ui::features::library::state::ReconciliationEngine;
use std::cell::RefCell;
use std::rc::Rc;
use yew_router::Routable;

const NOW: i64 = 1_700_000_000_000;

struct Harness {
    storage: Rc<MemoryStore>,
    clock: Rc<ManualClock>,
    session: Rc<SessionStore>,
    transport: ScriptedTransport,
}

fn harness() -> Harness {
    harness_with(Rc::new(MemoryStore::new()))
}

fn harness_with(storage: Rc<MemoryStore>) -> Harness {
    let clock = Rc::new(ManualClock::new(NOW));
    let shared_storage: Rc<dyn KeyValueStore> = storage.clone();
    let shared_clock: Rc<dyn Clock> = clock.clone();
    Harness {
        session: Rc::new(SessionStore::new(shared_storage, shared_clock)),
        storage,
        clock,
        transport: ScriptedTransport::new(),
    }
}

fn navigator(h: &Harness) -> Navigator {
    Navigator::new(Rc::clone(&h.session), Some(Credential::new("open-sesame")))
}

#[tokio::test]
async fn entering_admin_acquires_once_and_leaving_revokes() {
    let h = harness();
    h.transport
        .script_authorize(Ok(session_until("tok", NOW + 3_600_000)));
    let nav = navigator(&h);

    let entered = nav.on_navigate("/admin", &h.transport).await;
    assert_eq!(entered.session, SessionTransition::Acquired);
    assert_eq!(entered.mode, DisplayMode::Library);
    assert_eq!(entered.route, Route::AdminLibrary);
    assert!(h.session.is_authorized());
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("tok"));
    assert_eq!(
        h.storage.get(EXPIRES_KEY),
        Some((NOW + 3_600_000).to_string())
    );

    let within = nav.on_navigate("/admin/recent", &h.transport).await;
    assert_eq!(within.session, SessionTransition::Unchanged);
    assert_eq!(
        h.transport.calls(),
        vec![Call::Authorize {
            credential: "open-sesame".into()
        }]
    );

    let left = nav.on_navigate("/recent", &h.transport).await;
    assert_eq!(left.session, SessionTransition::Revoked);
    assert_eq!(left.mode, DisplayMode::Recent);
    assert!(!h.session.is_authorized());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn shell_links_inside_admin_keep_the_session() {
    let h = harness();
    let nav = navigator(&h);

    let entered = nav.on_navigate("/admin", &h.transport).await;
    assert_eq!(entered.session, SessionTransition::Acquired);

    let recent = Route::for_section(DisplayMode::Recent, true).to_path();
    let outcome = nav.on_navigate(&recent, &h.transport).await;
    assert_eq!(outcome.session, SessionTransition::Unchanged);
    assert_eq!(outcome.mode, DisplayMode::Recent);

    let detail = Route::document("srv-1", true).to_path();
    let outcome = nav.on_navigate(&detail, &h.transport).await;
    assert_eq!(outcome.route, Route::AdminDocument { id: "srv-1".into() });
    assert_eq!(outcome.mode, DisplayMode::Recent);

    let about = Route::for_section(DisplayMode::About, true).to_path();
    assert_eq!(nav.on_navigate(&about, &h.transport).await.mode, DisplayMode::About);
    let library = Route::for_section(DisplayMode::Library, true).to_path();
    assert_eq!(nav.on_navigate(&library, &h.transport).await.mode, DisplayMode::Library);

    assert!(h.session.is_authorized());
    assert_eq!(h.transport.call_count(), 1);

    let exit = Route::Library.to_path();
    let left = nav.on_navigate(&exit, &h.transport).await;
    assert_eq!(left.session, SessionTransition::Revoked);
    assert!(!h.session.is_authorized());
}

#[tokio::test]
async fn plain_navigation_never_touches_the_session() {
    let h = harness();
    let nav = navigator(&h);
    for path in ["/", "/about", "/pdf/42", "/recent"] {
        let outcome = nav.on_navigate(path, &h.transport).await;
        assert_eq!(outcome.session, SessionTransition::Unchanged);
    }
    assert_eq!(nav.mode(), DisplayMode::Recent);
    assert_eq!(h.transport.call_count(), 0);
}

#[tokio::test]
async fn rejected_exchange_leaves_client_unauthorized() {
    let h = harness();
    h.transport
        .script_authorize(Err(http_error(401, "Invalid credential")));
    let nav = navigator(&h);

    let outcome = nav.on_navigate("/admin", &h.transport).await;

    assert_eq!(
        outcome.session,
        SessionTransition::Rejected(AuthError::Rejected {
            message: "Invalid credential".into()
        })
    );
    assert!(h.session.current().is_none());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn expired_grant_is_rejected() {
    let h = harness();
    h.transport.script_authorize(Ok(session_until("tok", NOW - 1)));
    let nav = navigator(&h);

    let outcome = nav.on_navigate("/admin", &h.transport).await;

    assert!(matches!(
        outcome.session,
        SessionTransition::Rejected(AuthError::Rejected { .. })
    ));
    assert!(!h.session.is_authorized());
}

#[tokio::test]
async fn missing_credential_is_reported() {
    let h = harness();
    let nav = Navigator::new(Rc::clone(&h.session), None);

    let outcome = nav.on_navigate("/admin", &h.transport).await;

    assert_eq!(
        outcome.session,
        SessionTransition::Rejected(AuthError::MissingCredential)
    );
    assert_eq!(h.transport.call_count(), 0);
}

#[tokio::test]
async fn expiry_is_detected_lazily_and_observed_once() {
    let h = harness();
    h.transport.script_authorize(Ok(session_until("tok", NOW + 1_000)));
    let flips = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&flips);
    h.session.subscribe(move |authorized| sink.borrow_mut().push(authorized));
    let nav = navigator(&h);

    nav.on_navigate("/admin", &h.transport).await;
    assert!(h.session.current().is_some());
    assert!(h.session.current().is_some());

    h.clock.advance(1_000);
    assert!(h.session.current().is_none());
    assert!(h.session.current().is_none());

    assert_eq!(*flips.borrow(), vec![true, false]);
}

#[tokio::test]
async fn storage_failure_keeps_session_in_memory() {
    let h = harness_with(Rc::new(MemoryStore::read_only()));
    h.transport
        .script_authorize(Ok(session_until("tok", NOW + 60_000)));
    let nav = navigator(&h);

    let outcome = nav.on_navigate("/admin", &h.transport).await;

    assert_eq!(outcome.session, SessionTransition::Acquired);
    assert!(h.session.is_authorized());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn persisted_session_survives_a_reload() {
    let storage = Rc::new(MemoryStore::new());
    {
        let h = harness_with(Rc::clone(&storage));
        h.transport
            .script_authorize(Ok(session_until("tok", NOW + 60_000)));
        navigator(&h).on_navigate("/admin", &h.transport).await;
    }

    let reloaded = harness_with(storage);
    assert!(!reloaded.session.is_authorized());
    assert!(reloaded.session.restore());
    assert_eq!(
        reloaded.session.current().map(|session| session.token),
        Some("tok".to_string())
    );
}

#[tokio::test]
async fn mutations_follow_the_admin_route() {
    let h = harness();
    let transport = Rc::new(ScriptedTransport::new());
    let shared_clock: Rc<dyn Clock> = h.clock.clone();
    let coordinator = MutationCoordinator::new(
        Rc::clone(&transport),
        shared_clock,
        ReconciliationEngine::new(vec![baseline("baseline-1", "Guide")]),
        CoordinatorSettings::default(),
    );
    let nav = navigator(&h);

    nav.on_navigate("/admin", transport.as_ref()).await;
    let stored = coordinator
        .upload(&pdf_file("notes.pdf", 64), h.session.current().as_ref())
        .await
        .unwrap();
    assert_eq!(coordinator.view()[0].id, stored.id);

    nav.on_navigate("/", transport.as_ref()).await;
    let err = coordinator
        .upload(&pdf_file("more.pdf", 64), h.session.current().as_ref())
        .await
        .unwrap_err();
    assert_eq!(err, MutationError::Unauthorized);
    assert_eq!(coordinator.view().len(), 2);
}

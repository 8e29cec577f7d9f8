//! E2E tests for the remote-service flows.
//!
//! Every test runs against a local mockito server and an in-memory session
//! database, so no real service or on-disk state is touched.
//!
//! | Area    | Covered                                                        |
//! |---------|----------------------------------------------------------------|
//! | Auth    | email login, credentials login, register, logout               |
//! | Friends | list, request, resend, remove (confirmed), 404 handling        |
//! | Alarms  | list/buckets, create (self/friend), pre-network checks, delete |
//! | Overlap | duplicate resend/delete of the same record while one is running |

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDateTime;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use wakapp_core::{
    AlarmDraft, AlarmService, ApiClient, Auth, Bucket, CoreError, Database, FriendService,
    Friendship, FriendshipStatus, Identity, LoginInput, MediaRef, Registration,
    RegistrationOutcome, SelectionError, Session, TargetType, TransportError, ValidationError,
    WakeMethod,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn client(server: &ServerGuard) -> ApiClient {
    ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap()
}

fn sam() -> Identity {
    Identity {
        id: "u1".into(),
        username: "sam".into(),
        email: "sam@example.com".into(),
        phone: "555-1212".into(),
    }
}

fn signed_in() -> Session {
    let mut session = Session::new(Database::open_memory().unwrap());
    session.establish(sam()).unwrap();
    session
}

fn signed_out() -> Session {
    Session::new(Database::open_memory().unwrap())
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn accepted_friend() -> Friendship {
    Friendship {
        id: "f1".into(),
        requester_id: "u1".into(),
        friend_id: "u2".into(),
        status: FriendshipStatus::Accepted,
        friend_name: "Alex".into(),
        friend_phone: "555-3434".into(),
        username: Some("alex".into()),
    }
}

fn voice_memo() -> MediaRef {
    MediaRef {
        name: "morning.m4a".into(),
        uri: "file:///tmp/morning.m4a".into(),
        mime_type: Some("audio/mp4".into()),
        size: Some(2048),
    }
}

const USERS: &str = r#"[
    {"id": 1, "username": "sam", "email": "Sam@Example.com", "phone": "555-1212"},
    {"id": 2, "username": "alex", "email": "alex@example.com", "phone": "555-3434"}
]"#;

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_with_email_establishes_session() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("GET", "/users")
        .with_header("content-type", "application/json")
        .with_body(USERS)
        .create_async()
        .await;

    let api = client(&server);
    let mut session = signed_out();
    let identity = Auth::new(&api)
        .login_with_email(&mut session, "  sam@example.COM ")
        .await
        .unwrap();

    users.assert_async().await;
    assert_eq!(identity.id, "1");
    assert_eq!(session.current().map(|i| i.username.as_str()), Some("sam"));
    assert_eq!(session.remembered_email().as_deref(), Some("sam@example.COM"));

    // Restoring from the same storage yields the same identity.
    let mut reopened = Session::new(Database::open_memory().unwrap());
    assert!(reopened.restore().is_none());
    assert_eq!(session.restore().cloned(), Some(identity));
}

#[tokio::test]
async fn test_login_with_unknown_email_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users")
        .with_body(USERS)
        .create_async()
        .await;

    let api = client(&server);
    let mut session = signed_out();
    let err = Auth::new(&api)
        .login_with_email(&mut session, "nobody@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { kind: "user", .. }));
    assert!(!session.is_authenticated());
    assert_eq!(session.remembered_email(), None);
}

#[tokio::test]
async fn test_blank_email_never_reaches_the_service() {
    let mut server = Server::new_async().await;
    let users = server.mock("GET", "/users").expect(0).create_async().await;

    let api = client(&server);
    let err = Auth::new(&api)
        .login_with_email(&mut signed_out(), "   ")
        .await
        .unwrap_err();

    users.assert_async().await;
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::EmptyField { field: "email" })
    ));
}

#[tokio::test]
async fn test_credentials_login_resolves_by_username() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users")
        .with_body(USERS)
        .create_async()
        .await;

    let api = client(&server);
    let mut session = signed_out();
    let identity = Auth::new(&api)
        .login(
            &mut session,
            LoginInput::Credentials {
                username: "alex".into(),
                password: "ignored".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(identity.id, "2");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_identity_login_skips_lookup() {
    let mut server = Server::new_async().await;
    let users = server.mock("GET", "/users").expect(0).create_async().await;

    let api = client(&server);
    let mut session = signed_out();
    Auth::new(&api)
        .login(&mut session, LoginInput::Identity(sam()))
        .await
        .unwrap();

    users.assert_async().await;
    assert_eq!(session.current(), Some(&sam()));
}

#[tokio::test]
async fn test_register_signs_in_when_identity_returned() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/users")
        .match_body(Matcher::Json(json!({
            "username": "kim",
            "email": "kim@example.com",
            "phone": "555-9999"
        })))
        .with_status(201)
        .with_body(r#"{"id": 7, "username": "kim", "email": "kim@example.com", "phone": "555-9999"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let mut session = signed_out();
    let registration = Registration::new(" kim ", "kim@example.com", "555-9999").unwrap();
    let outcome = Auth::new(&api)
        .register(&mut session, registration)
        .await
        .unwrap();

    create.assert_async().await;
    match outcome {
        RegistrationOutcome::SignedIn(identity) => assert_eq!(identity.id, "7"),
        other => panic!("expected sign-in, got {other:?}"),
    }
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_register_without_identity_requires_login() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/users")
        .with_status(201)
        .with_body(r#"{"message": "created"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let mut session = signed_out();
    let registration = Registration::new("kim", "kim@example.com", "555-9999").unwrap();
    let outcome = Auth::new(&api)
        .register(&mut session, registration)
        .await
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::Registered);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let server = Server::new_async().await;
    let api = client(&server);
    let mut session = signed_in();

    Auth::new(&api).logout(&mut session).unwrap();

    assert!(!session.is_authenticated());
    assert!(session.restore().is_none());
}

// ============================================================================
// Friends
// ============================================================================

#[tokio::test]
async fn test_friend_list_drops_removed_and_self_records() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/users/u1/friends")
        .with_body(
            json!([
                {"id": 1, "requester_id": "u1", "friend_id": "u2", "status": "accepted", "friend_name": "Alex", "friend_phone": "555-3434"},
                {"id": 2, "requester_id": "u3", "friend_id": "u1", "status": "sms_invited", "friend_name": "Jo", "friend_phone": "555-0101"},
                {"id": 3, "requester_id": "u1", "friend_id": "u4", "status": "removed", "friend_name": "Old", "friend_phone": "555-0000"},
                {"id": 4, "requester_id": "u1", "friend_id": "u1", "status": "accepted", "friend_name": "Me", "friend_phone": "555-1212"},
                {"id": 5, "requester_id": "u1", "friend_id": "u5", "status": "blocked", "friend_name": "Pat", "friend_phone": "555-7777"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let api = client(&server);
    let friends = FriendService::new(&api).list(&signed_in()).await.unwrap();

    list.assert_async().await;
    let ids: Vec<&str> = friends.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "5"]);
    assert_eq!(friends[1].status.label(), "Invited");
    assert_eq!(friends[2].status, FriendshipStatus::Unknown);

    let candidates = wakapp_core::wake_up_candidates(&friends);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].display_name(), "Alex");
}

#[tokio::test]
async fn test_friend_list_requires_session() {
    let server = Server::new_async().await;
    let api = client(&server);
    let err = FriendService::new(&api)
        .list(&signed_out())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: "session", .. }));
}

#[tokio::test]
async fn test_friend_request_sends_trimmed_payload() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/friend-requests")
        .match_body(Matcher::Json(json!({
            "user_id": "u1",
            "phone": "555-1212",
            "nickname": "Sam"
        })))
        .with_body(r#"{"id": 42, "friend_id": 9}"#)
        .create_async()
        .await;

    let api = client(&server);
    let friendship = FriendService::new(&api)
        .request(&signed_in(), "  Sam ", " 555-1212")
        .await
        .unwrap();

    create.assert_async().await;
    assert_eq!(friendship.id, "42");
    assert_eq!(friendship.friend_id, "9");
    assert_eq!(friendship.status, FriendshipStatus::Pending);
    assert_eq!(friendship.friend_name, "Sam");
}

#[tokio::test]
async fn test_friend_request_uses_server_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/friend-requests")
        .with_body(r#"{"id": 43, "status": "sms_invited"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let friendship = FriendService::new(&api)
        .request(&signed_in(), "Robin", "555-4444")
        .await
        .unwrap();
    assert_eq!(friendship.status, FriendshipStatus::SmsInvited);
}

#[tokio::test]
async fn test_friend_request_validates_before_sending() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/friend-requests")
        .expect(0)
        .create_async()
        .await;

    let api = client(&server);
    let service = FriendService::new(&api);
    let session = signed_in();

    let err = service.request(&session, "", "555-1212").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::EmptyField { field: "name" })
    ));
    let err = service.request(&session, "Sam", "  ").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::EmptyField { field: "phone" })
    ));

    create.assert_async().await;
}

#[tokio::test]
async fn test_resend_only_from_pending_states() {
    let mut server = Server::new_async().await;
    let resend = server
        .mock("POST", "/friends/f1/resend")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server);
    let service = FriendService::new(&api);

    let mut pending = accepted_friend();
    pending.status = FriendshipStatus::Pending;
    service.resend(&pending).await.unwrap();

    let err = service.resend(&accepted_friend()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidTransition {
            action: "resend",
            from: FriendshipStatus::Accepted
        }
    ));

    resend.assert_async().await;
}

#[tokio::test]
async fn test_resend_missing_record_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/friends/f1/resend")
        .with_status(404)
        .with_body(r#"{"detail": "Friendship not found"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let mut invited = accepted_friend();
    invited.status = FriendshipStatus::SmsInvited;
    let err = FriendService::new(&api).resend(&invited).await.unwrap_err();

    match err {
        CoreError::NotFound { kind, id } => {
            assert_eq!(kind, "friendship");
            assert_eq!(id, "f1");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remove_goes_through_confirmation() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/friends/f1")
        .with_status(204)
        .create_async()
        .await;

    let api = client(&server);
    let service = FriendService::new(&api);

    let confirmation = service.propose_removal(&accepted_friend()).unwrap();
    assert_eq!(confirmation.title(), "Remove Friend");
    assert_eq!(confirmation.target().id, "f1");

    let removed = service.remove(confirmation).await.unwrap();
    delete.assert_async().await;
    assert_eq!(removed.status, FriendshipStatus::Removed);

    // Terminal: no second removal.
    assert!(matches!(
        service.propose_removal(&removed),
        Err(CoreError::InvalidTransition { action: "remove", .. })
    ));
}

#[tokio::test]
async fn test_server_error_detail_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/friends/f1")
        .with_status(409)
        .with_body(r#"{"detail": "Friendship is locked"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let service = FriendService::new(&api);
    let confirmation = service.propose_removal(&accepted_friend()).unwrap();
    let err = service.remove(confirmation).await.unwrap_err();

    assert!(err.is_transport());
    match err {
        CoreError::Transport(TransportError::Status { status, detail }) => {
            assert_eq!(status, 409);
            assert_eq!(detail, "Friendship is locked");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

// ============================================================================
// Alarms
// ============================================================================

#[tokio::test]
async fn test_alarm_buckets_from_listing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/users/u1/alarms")
        .with_body(
            json!([
                {"id": 1, "alarm_date": "2026-10-21", "alarm_time": "07:00:00", "target_user": "u1", "created_by": "u1", "wake_methods": ["voice"], "is_active": true, "is_approved": true},
                {"id": 2, "alarm_date": "2026-10-20", "alarm_time": "06:30:00", "target_user": "u1", "created_by": "u2", "wake_methods": ["song"], "is_active": false, "is_approved": false},
                {"id": 3, "alarm_date": "2026-10-18", "alarm_time": "07:00:00", "target_user": "u2", "created_by": "u1", "wake_methods": ["puzzle"], "is_active": true, "is_approved": true},
                {"id": 4, "alarm_date": null, "alarm_time": null, "target_user": "u1", "created_by": "u1", "wake_methods": ["video", "hologram"], "is_active": null, "is_approved": null}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let api = client(&server);
    let buckets = AlarmService::new(&api)
        .buckets(&signed_in(), at("2026-10-19 21:00"))
        .await
        .unwrap();

    let ids = |b: Bucket| -> Vec<String> { buckets.get(b).iter().map(|a| a.id.clone()).collect() };
    assert_eq!(ids(Bucket::Active), ["1"]);
    assert_eq!(ids(Bucket::Pending), ["2", "4"]);
    assert_eq!(ids(Bucket::Past), ["3"]);

    let undated = &buckets.get(Bucket::Pending)[1];
    assert_eq!(undated.wake_methods, BTreeSet::from([WakeMethod::Video]));
}

#[tokio::test]
async fn test_create_alarm_for_friend() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/alarms")
        .match_body(Matcher::PartialJson(json!({
            "user_id": "u1",
            "target_user": "u2",
            "alarm_date": "2026-10-20T06:45",
            "wake_methods": ["voice"],
            "uploaded_files": {"voice": {"name": "morning.m4a", "type": "audio/mp4"}}
        })))
        .with_status(201)
        .with_body(r#"{"id": 77, "alarm_date": "2026-10-20", "alarm_time": "06:45:00", "is_active": false, "is_approved": false}"#)
        .create_async()
        .await;

    let api = client(&server);
    let mut draft = AlarmDraft::for_friend(accepted_friend(), at("2026-10-20 06:45"));
    draft.toggle_method(WakeMethod::Voice);
    draft.attach_media(WakeMethod::Voice, voice_memo());

    let alarm = AlarmService::new(&api)
        .create(&signed_in(), &draft)
        .await
        .unwrap();

    create.assert_async().await;
    assert_eq!(alarm.id, "77");
    assert_eq!(alarm.target_user, "u2");
    assert_eq!(alarm.created_by, "u1");
    assert_eq!(alarm.alarm_time.as_deref(), Some("06:45:00"));
    assert!(!alarm.is_active);
    assert_eq!(alarm.author_label("u1"), "Created by you");
    assert_eq!(alarm.author_label("u2"), "Created for you");
}

#[tokio::test]
async fn test_create_alarm_with_empty_receipt_uses_draft() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/alarms")
        .with_status(201)
        .create_async()
        .await;

    let api = client(&server);
    let mut draft = AlarmDraft::new(TargetType::Myself, at("2026-10-22 05:15"));
    draft.toggle_method(WakeMethod::Voice);
    draft.attach_media(WakeMethod::Voice, voice_memo());

    let alarm = AlarmService::new(&api)
        .create(&signed_in(), &draft)
        .await
        .unwrap();

    assert_eq!(alarm.target_user, "u1");
    assert_eq!(alarm.alarm_date.as_deref(), Some("2026-10-22"));
    assert_eq!(alarm.alarm_time.as_deref(), Some("05:15"));
    assert!(!alarm.is_approved);
}

#[tokio::test]
async fn test_create_alarm_with_malformed_receipt_fails() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/alarms")
        .with_status(200)
        .with_body(r#"{"id": 42, "is_active": "yes"}"#)
        .create_async()
        .await;

    let api = client(&server);
    let mut draft = AlarmDraft::new(TargetType::Myself, at("2026-10-22 05:15"));
    draft.toggle_method(WakeMethod::Voice);
    draft.attach_media(WakeMethod::Voice, voice_memo());

    let err = AlarmService::new(&api)
        .create(&signed_in(), &draft)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Transport(TransportError::Decode(_))
    ));
}

#[tokio::test]
async fn test_friend_request_with_non_json_receipt_fails() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/friend-requests")
        .with_status(201)
        .with_header("content-type", "text/html")
        .with_body("<html>proxy page</html>")
        .create_async()
        .await;

    let api = client(&server);
    let err = FriendService::new(&api)
        .request(&signed_in(), "Robin", "555-4444")
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(
        err,
        CoreError::Transport(TransportError::Decode(_))
    ));
}

#[tokio::test]
async fn test_create_alarm_checks_run_before_network() {
    let mut server = Server::new_async().await;
    let create = server.mock("POST", "/alarms").expect(0).create_async().await;

    let api = client(&server);
    let service = AlarmService::new(&api);
    let session = signed_in();
    let now = at("2026-10-20 06:45");

    // Nothing selected and no friend: validation is reported first.
    let draft = AlarmDraft::new(TargetType::Friend, now);
    assert!(matches!(
        service.create(&session, &draft).await,
        Err(CoreError::Validation(ValidationError::NoMethodSelected))
    ));

    let mut draft = AlarmDraft::new(TargetType::Friend, now);
    draft.toggle_method(WakeMethod::Voice);
    draft.toggle_method(WakeMethod::Puzzle);
    draft.attach_media(WakeMethod::Voice, voice_memo());
    assert!(matches!(
        service.create(&session, &draft).await,
        Err(CoreError::Validation(ValidationError::MissingMedia(ref m))) if m == &vec![WakeMethod::Puzzle]
    ));

    draft.toggle_method(WakeMethod::Puzzle);
    assert!(matches!(
        service.create(&session, &draft).await,
        Err(CoreError::Selection(SelectionError::NoFriendSelected))
    ));

    let mut pending = accepted_friend();
    pending.status = FriendshipStatus::Pending;
    draft.select_friend(pending);
    assert!(matches!(
        service.create(&session, &draft).await,
        Err(CoreError::Selection(SelectionError::FriendNotAccepted { .. }))
    ));

    create.assert_async().await;
}

#[tokio::test]
async fn test_delete_alarm_sends_owner() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/alarms/a1")
        .match_query(Matcher::UrlEncoded("user_id".into(), "u1".into()))
        .with_status(204)
        .create_async()
        .await;

    let api = client(&server);
    let service = AlarmService::new(&api);
    let alarm: wakapp_core::Alarm = serde_json::from_value(json!({
        "id": "a1",
        "alarm_date": "2026-10-21",
        "alarm_time": "07:00",
        "target_user": "u1",
        "created_by": "u1",
        "wake_methods": ["voice"],
        "is_active": true,
        "is_approved": true
    }))
    .unwrap();

    let confirmation = service.propose_delete(&alarm);
    assert_eq!(confirmation.title(), "Delete Alarm");
    let deleted = service.delete(&signed_in(), confirmation).await.unwrap();

    delete.assert_async().await;
    assert_eq!(deleted.id, "a1");
}

#[tokio::test]
async fn test_delete_missing_alarm_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/alarms/a9")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let api = client(&server);
    let service = AlarmService::new(&api);
    let alarm: wakapp_core::Alarm = serde_json::from_value(json!({
        "id": "a9",
        "target_user": "u1",
        "created_by": "u1"
    }))
    .unwrap();

    let err = service
        .delete(&signed_in(), service.propose_delete(&alarm))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: "alarm", .. }));
}

// ============================================================================
// Overlapping operations
// ============================================================================

#[tokio::test]
async fn test_concurrent_resend_of_same_friendship_is_rejected() {
    let mut server = Server::new_async().await;
    let resend = server
        .mock("POST", "/friends/f1/resend")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server);
    let service = FriendService::new(&api);
    let mut invited = accepted_friend();
    invited.status = FriendshipStatus::SmsInvited;

    let (a, b) = tokio::join!(service.resend(&invited), service.resend(&invited));
    let busy = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(CoreError::Busy { action: "resend", .. })))
        .count();
    assert_eq!(busy, 1);
    assert!(a.is_ok() || b.is_ok());
    resend.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_delete_of_same_alarm_is_rejected() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/alarms/a1")
        .match_query(Matcher::Any)
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server);
    let service = AlarmService::new(&api);
    let session = signed_in();
    let alarm: wakapp_core::Alarm = serde_json::from_value(json!({
        "id": "a1",
        "target_user": "u1",
        "created_by": "u1"
    }))
    .unwrap();

    let (a, b) = tokio::join!(
        service.delete(&session, service.propose_delete(&alarm)),
        service.delete(&session, service.propose_delete(&alarm)),
    );
    let busy = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(CoreError::Busy { action: "delete", .. })))
        .count();
    assert_eq!(busy, 1);
    delete.assert_async().await;
}

//! Full-stack tests: real router, real flat-file stores, virtual hardware.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use karotz_adapter_homeauto::HttpNotifier;
use karotz_adapter_http_axum::{AppState, create_router};
use karotz_adapter_statefs::{FsRecordingStore, FsStateStore};
use karotz_adapter_virtual::VirtualGateway;
use karotz_app::dispatcher::ActionDispatcher;
use karotz_app::lock_manager::LockManager;
use karotz_app::notifications::NotificationFanout;
use karotz_app::rfid_machine::{RfidMachine, RfidSettings};

struct TestApp {
    router: axum::Router,
    gateway: VirtualGateway,
    dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("rfid")).unwrap();

    let gateway = VirtualGateway::manual();
    let shared = Arc::new(gateway.clone());
    let locks = Arc::new(LockManager::new(
        FsStateStore::new(dir.path().join("state.json")),
        Duration::from_secs(45),
    ));
    let notifier = HttpNotifier::new(Duration::from_secs(1)).unwrap();
    let fanout = NotificationFanout::new(notifier, Vec::new());

    let dispatcher = ActionDispatcher::new(
        Arc::clone(&shared),
        Arc::clone(&locks),
        fanout.clone(),
        Duration::from_secs(5),
    );
    let rfid = RfidMachine::new(
        shared,
        locks,
        FsRecordingStore::new(dir.path().join("rfid")),
        fanout,
        RfidSettings::default(),
    );

    TestApp {
        router: create_router(AppState { dispatcher, rfid }),
        gateway,
        dir,
    }
}

async fn get_json(router: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn should_answer_health_probe() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn should_set_led_and_answer_with_return_zero() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/cgi-bin/leds?color=green").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["return"], "0");
    assert!(app.gateway.journal().contains(&"LED 00FF00".to_string()));
}

#[tokio::test]
async fn should_reject_leds_without_color_but_still_return_http_200() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/cgi-bin/leds").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["return"], "1");
    assert!(body["msg"].as_str().unwrap().contains("missing parameter"));
}

#[tokio::test]
async fn should_report_busy_for_overlapping_sounds_and_recover_on_quit() {
    let app = test_app();

    let (_, first) = get_json(&app.router, "/cgi-bin/sound?id=bip.mp3").await;
    assert_eq!(first["return"], "0");

    let (_, second) = get_json(&app.router, "/cgi-bin/sound?id=pop.mp3").await;
    assert_eq!(second["return"], "1");
    assert!(second["msg"].as_str().unwrap().contains("busy"));

    let (_, quit) = get_json(&app.router, "/cgi-bin/sound_control?cmd=quit").await;
    assert_eq!(quit["return"], "0");

    let (_, replay) = get_json(&app.router, "/cgi-bin/sound?id=pop.mp3").await;
    assert_eq!(replay["return"], "0");
}

#[tokio::test]
async fn should_reject_unknown_sound_control_command() {
    let app = test_app();
    let (_, body) = get_json(&app.router, "/cgi-bin/sound_control?cmd=louder").await;
    assert_eq!(body["return"], "1");
}

#[tokio::test]
async fn should_return_not_found_for_unrecorded_tag() {
    let app = test_app();
    let (status, body) = get_json(&app.router, "/cgi-bin/rfid_play?tag=FFFF").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["return"], "1");
    assert!(body["msg"].as_str().unwrap().contains("not found"));
    // no hardware was touched
    assert!(app.gateway.journal().is_empty());
}

#[tokio::test]
async fn should_record_commit_and_play_back_a_tag() {
    let app = test_app();

    let (_, started) = get_json(&app.router, "/cgi-bin/rfid_start_record?tag=0123ABCD").await;
    assert_eq!(started["return"], "0");

    // the virtual gateway journals the capture instead of writing audio
    std::fs::write(app.dir.path().join("rfid/0123ABCD.wav.part"), b"audio").unwrap();

    let (_, stopped) = get_json(&app.router, "/cgi-bin/rfid_stop_record?tag=0123ABCD").await;
    assert_eq!(stopped["return"], "0");
    assert!(app.dir.path().join("rfid/0123ABCD.wav").exists());

    let (_, played) = get_json(&app.router, "/cgi-bin/rfid_play?tag=0123ABCD").await;
    assert_eq!(played["return"], "0");

    let (_, stopped_play) = get_json(&app.router, "/cgi-bin/rfid_stop_play").await;
    assert_eq!(stopped_play["return"], "0");
}

#[tokio::test]
async fn should_reject_stop_record_for_wrong_tag() {
    let app = test_app();
    get_json(&app.router, "/cgi-bin/rfid_start_record?tag=AAAA").await;

    let (_, body) = get_json(&app.router, "/cgi-bin/rfid_stop_record?tag=BBBB").await;
    assert_eq!(body["return"], "1");
}

#[tokio::test]
async fn should_expose_session_in_status() {
    let app = test_app();

    let (_, idle) = get_json(&app.router, "/cgi-bin/status").await;
    assert_eq!(idle["return"], "0");
    assert_eq!(idle["busy"].as_array().unwrap().len(), 0);
    assert!(idle["rfid_session"].is_null());

    get_json(&app.router, "/cgi-bin/rfid_start_record?tag=0123ABCD").await;
    let (_, recording) = get_json(&app.router, "/cgi-bin/status").await;
    assert_eq!(recording["rfid_session"]["tag"], "0123ABCD");
    assert_eq!(recording["rfid_session"]["mode"], "recording");
    assert!(!recording["busy"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn should_answer_every_command_endpoint_with_the_canonical_shape() {
    let app = test_app();
    let uris = [
        "/cgi-bin/leds?color=red",
        "/cgi-bin/ears?gesture=up",
        "/cgi-bin/sound",
        "/cgi-bin/sound_control",
        "/cgi-bin/rfid_start_record",
        "/cgi-bin/rfid_stop_record?tag=XYZ",
        "/cgi-bin/rfid_play?tag=XYZ",
        "/cgi-bin/rfid_stop_play",
    ];
    for uri in uris {
        let (status, body) = get_json(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        let code = body["return"].as_str().unwrap();
        assert!(code == "0" || code == "1", "{uri}: {body}");
        assert!(body["msg"].is_string(), "{uri}: {body}");
    }
}

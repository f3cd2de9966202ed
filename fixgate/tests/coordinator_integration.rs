//! Integration tests for the location acquisition service.
//!
//! These tests drive a `CoordinatorService` end-to-end through its handle,
//! with scripted backend/platform collaborators and a `ChannelHost`:
//! - Permission prompt → settings check → subscription → fix delivery
//! - Mock developer flag suppressing every fix
//! - Declined settings resolution re-prompting
//! - Configuration file → coordinator update request
//!
//! Run with: `cargo test --test coordinator_integration`

mod common;

use std::time::Duration;

use fixgate::acquisition::{
    AccuracyTier, ChannelHost, Coordinator, CoordinatorService, Fix, FixSource, HostEvent,
    Notification, Priority, Readiness, SettingsOutcome, SettingsResolution, SettingsSurface,
};
use fixgate::config::{CoordinatorConfig, FileConfig};

use common::{
    next_host_event, next_notification, wait_for_subscription, ScriptedBackend, ScriptedPlatform,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Zurich main station.
const ZURICH: (f64, f64) = (47.3779, 8.5403);

fn zurich_fix() -> Fix {
    Fix::new(ZURICH.0, ZURICH.1, FixSource::Fused)
        .with_accuracy(12.0)
        .with_mock_flag(false)
}

fn start_service(
    config: CoordinatorConfig,
    backend: ScriptedBackend,
    platform: ScriptedPlatform,
) -> CoordinatorService {
    let (coordinator, events) =
        Coordinator::new(config, backend, platform).expect("valid configuration");
    CoordinatorService::start(coordinator, events)
}

// ============================================================================
// Permission → Fix Flow
// ============================================================================

/// A fresh install: no permission, the user grants it, fixes start flowing.
#[tokio::test]
async fn test_permission_grant_leads_to_fix_delivery() {
    let backend = ScriptedBackend::default();
    let platform = ScriptedPlatform::default();
    let config = CoordinatorConfig::new(AccuracyTier::High, Duration::from_millis(5000), false);
    let service = start_service(config, backend.clone(), platform.clone());
    let handle = service.handle();

    let (host, mut host_rx) = ChannelHost::new();
    handle.register(Box::new(host)).await.unwrap();
    handle.start().await.unwrap();

    assert_eq!(next_notification(&mut host_rx).await, Notification::NeedPermission);

    handle.request_permission().await.unwrap();
    let prompt = match next_host_event(&mut host_rx).await {
        HostEvent::PermissionPrompt(completion) => completion,
        other => panic!("expected permission prompt, got {:?}", other),
    };
    platform.set_permission(true);
    prompt.complete(true);

    let sink = wait_for_subscription(&backend).await;
    let request = backend.last_request().unwrap();
    assert_eq!(request.priority, Priority::HighAccuracy);
    assert_eq!(request.interval, Duration::from_millis(5000));
    assert_eq!(handle.readiness().await.unwrap(), Readiness::Ready);

    let fix = zurich_fix();
    assert!(sink.deliver(Some(fix.clone())));

    assert_eq!(next_notification(&mut host_rx).await, Notification::NewFix(fix.clone()));
    assert_eq!(handle.best_fix().await.unwrap(), Some(fix));

    // Exactly one prompt and one fix
    assert!(host_rx.try_recv().is_err());

    service.shutdown().await;
}

/// Stopping drops the subscription; late fixes from it are ignored.
#[tokio::test]
async fn test_stop_ignores_late_fixes() {
    let backend = ScriptedBackend::default();
    let service = start_service(
        CoordinatorConfig::default(),
        backend.clone(),
        ScriptedPlatform::granted(),
    );
    let handle = service.handle();

    let (host, mut host_rx) = ChannelHost::new();
    handle.register(Box::new(host)).await.unwrap();
    handle.start().await.unwrap();
    let sink = wait_for_subscription(&backend).await;

    handle.stop().await.unwrap();
    // Gates are cleared; permission is re-read on the next evaluation
    assert_eq!(handle.readiness().await.unwrap(), Readiness::NeedPermission);

    sink.deliver(Some(zurich_fix()));
    assert_eq!(handle.best_fix().await.unwrap(), None);
    assert!(host_rx.try_recv().is_err());

    service.shutdown().await;
}

// ============================================================================
// Mock Detection
// ============================================================================

/// With the mock developer option on, every fix is withheld.
#[tokio::test]
async fn test_mock_developer_flag_withholds_fixes() {
    let backend = ScriptedBackend::default();
    let platform = ScriptedPlatform::granted();
    platform.script.lock().unwrap().mock_locations = true;
    let service = start_service(CoordinatorConfig::default(), backend.clone(), platform);
    let handle = service.handle();

    let (host, mut host_rx) = ChannelHost::new();
    handle.register(Box::new(host)).await.unwrap();
    handle.start().await.unwrap();

    let expected = Notification::MockDetected {
        surface: SettingsSurface::DeveloperOptions,
    };
    assert_eq!(next_notification(&mut host_rx).await, expected);

    let sink = wait_for_subscription(&backend).await;
    sink.deliver(Some(zurich_fix()));

    assert_eq!(next_notification(&mut host_rx).await, expected);
    assert_eq!(handle.best_fix().await.unwrap(), None);

    service.shutdown().await;
}

// ============================================================================
// Settings Resolution
// ============================================================================

/// Declining the in-app settings dialog brings the prompt back.
#[tokio::test]
async fn test_declined_settings_resolution_prompts_again() {
    let backend = ScriptedBackend::with_settings(SettingsOutcome::ResolutionRequired(
        SettingsResolution {
            id: 42,
            reason: "high accuracy mode off".to_string(),
        },
    ));
    let service = start_service(
        CoordinatorConfig::default(),
        backend.clone(),
        ScriptedPlatform::granted(),
    );
    let handle = service.handle();

    let (host, mut host_rx) = ChannelHost::new();
    handle.register(Box::new(host)).await.unwrap();
    handle.start().await.unwrap();

    assert_eq!(
        next_notification(&mut host_rx).await,
        Notification::NeedSettingsChange
    );

    handle.request_settings_resolution().await.unwrap();
    let completion = match next_host_event(&mut host_rx).await {
        HostEvent::SettingsResolution {
            resolution,
            completion,
        } => {
            assert_eq!(resolution.id, 42);
            completion
        }
        other => panic!("expected settings resolution, got {:?}", other),
    };
    completion.complete(false);

    assert_eq!(
        next_notification(&mut host_rx).await,
        Notification::NeedSettingsChange
    );
    assert_eq!(
        handle.readiness().await.unwrap(),
        Readiness::NeedSettingsResolution
    );
    assert_eq!(backend.settings_checks(), 1);

    service.shutdown().await;
}

// ============================================================================
// Configuration
// ============================================================================

/// Values from the `[location]` section reach the backend request.
#[tokio::test]
async fn test_config_file_drives_update_request() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("fixgate.ini");
    std::fs::write(
        &path,
        "[location]\naccuracy = low\nupdate_interval_ms = 60000\n",
    )
    .unwrap();
    let config = FileConfig::load_from(&path).unwrap();

    let backend = ScriptedBackend::default();
    let service = start_service(config.location, backend.clone(), ScriptedPlatform::granted());
    let handle = service.handle();
    handle.start().await.unwrap();

    wait_for_subscription(&backend).await;
    let request = backend.last_request().unwrap();
    assert_eq!(request.priority, Priority::LowPower);
    assert_eq!(request.interval, Duration::from_secs(60));

    service.shutdown().await;
}

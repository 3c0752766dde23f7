use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::config::Config;
use crate::container_engine::fake::FakeEngine;
use crate::container_engine::types::{ResourceSpec, TaggedContainer};
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::ManagerError;
use crate::instance_management::{InstanceView, LifecycleState, VpsManager};

fn test_config(max_count: usize) -> Config {
    let mut config = Config::default();
    config.instances.max_count = max_count;
    config
}

async fn manager_with(engine: &Arc<FakeEngine>, config: Config) -> VpsManager {
    let engine: Arc<dyn ContainerEngine> = Arc::clone(engine) as Arc<dyn ContainerEngine>;
    VpsManager::new(engine, config).await
}

/// Polls `get_info` under paused time until the predicate holds.
async fn wait_for(
    manager: &VpsManager,
    name: &str,
    what: &str,
    predicate: impl Fn(&InstanceView) -> bool,
) -> InstanceView {
    for _ in 0..200 {
        if let Some(view) = manager.get_info(name).await {
            if predicate(&view) {
                return view;
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("instance {} never reached: {}", name, what);
}

fn tagged(
    name: &str,
    engine_ref: &str,
    running: bool,
    ram_gb: u64,
    cpu_cores: u64,
    disk_gb: u64,
) -> TaggedContainer {
    TaggedContainer {
        engine_ref: engine_ref.to_string(),
        name: name.to_string(),
        running,
        labels: ResourceSpec {
            ram_gb,
            cpu_cores,
            disk_gb,
        }
        .to_labels(),
        created_at: Some(Utc::now()),
    }
}

#[tokio::test(start_paused = true)]
async fn create_rejects_out_of_bounds_resources() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    for (ram, cpu, disk) in [(0, 4, 30), (33, 4, 30), (8, 17, 30), (8, 4, 501), (8, 4, 4)] {
        match manager.create(ram, cpu, disk).await {
            Err(ManagerError::InvalidResources) => {}
            other => panic!("expected InvalidResources for {:?}, got {:?}", (ram, cpu, disk), other),
        }
    }
    // nothing was registered
    assert!(manager.list().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn create_rejects_when_at_capacity() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(1)).await;

    manager.create(2, 1, 10).await.unwrap();

    match manager.create(2, 1, 10).await {
        Err(ManagerError::CapacityExceeded) => {}
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }
    assert_eq!(manager.list().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn created_instance_reaches_running_with_session() {
    let engine = Arc::new(FakeEngine::new());
    engine.push_display(0, "ssh abcdef@nyc1.tmate.io");
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(8, 4, 30).await.unwrap();
    assert_eq!(view.state, LifecycleState::Creating);
    assert_eq!(
        view.resources,
        ResourceSpec {
            ram_gb: 8,
            cpu_cores: 4,
            disk_gb: 30
        }
    );

    let view = wait_for(&manager, &view.name, "running with session", |v| {
        v.state == LifecycleState::Running && v.session.is_some()
    })
    .await;

    assert_eq!(view.session.as_deref(), Some("ssh abcdef@nyc1.tmate.io"));
}

#[tokio::test(start_paused = true)]
async fn failed_container_creation_marks_record_error() {
    let engine = Arc::new(FakeEngine::new());
    engine.set_fail_create("no space left on device");
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    let view = wait_for(&manager, &view.name, "error state", |v| {
        v.state == LifecycleState::Error
    })
    .await;

    assert!(view.session.is_none());
    // session establishment was never attempted
    assert!(engine.exec_log().is_empty());
    // the record has no container to stop
    match manager.stop(&view.name).await {
        Err(ManagerError::NoContainer) => {}
        other => panic!("expected NoContainer, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn session_exhaustion_leaves_instance_running() {
    let engine = Arc::new(FakeEngine::new());
    // no display results queued: every poll and the fallback miss
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    let view = wait_for(&manager, &view.name, "running", |v| {
        v.state == LifecycleState::Running
    })
    .await;

    // give the background task time to exhaust its budget
    tokio::time::sleep(Duration::from_secs(30)).await;
    let view = manager.get_info(&view.name).await.unwrap();
    assert!(view.session.is_none());
    assert_eq!(view.state, LifecycleState::Running);
    assert_eq!(engine.display_poll_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn delete_unknown_name_is_not_found() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    match manager.delete("vps-nope").await {
        Err(ManagerError::NotFound) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn delete_unregisters_and_removes_container_once() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "running", |v| {
        v.state == LifecycleState::Running
    })
    .await;

    manager.delete(&view.name).await.unwrap();

    assert!(manager.list().await.is_empty());
    assert_eq!(engine.remove_calls().len(), 1);
    match manager.delete(&view.name).await {
        Err(ManagerError::NotFound) => {}
        other => panic!("expected NotFound on second delete, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn delete_tolerates_container_removal_failure() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "running", |v| {
        v.state == LifecycleState::Running
    })
    .await;
    engine.set_fail_remove(true);

    // removal failure must not block unregistering
    manager.delete(&view.name).await.unwrap();
    assert!(manager.list().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_transitions_running_to_stopped() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    match manager.stop("vps-nope").await {
        Err(ManagerError::NotFound) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "running", |v| {
        v.state == LifecycleState::Running
    })
    .await;

    let stopped = manager.stop(&view.name).await.unwrap();
    assert_eq!(stopped.state, LifecycleState::Stopped);
    assert_eq!(engine.stop_calls().len(), 1);

    // the read-through status agrees with the engine afterwards
    let info = manager.get_info(&view.name).await.unwrap();
    assert_eq!(info.state, LifecycleState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn status_query_failure_reports_unknown() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "running", |v| {
        v.state == LifecycleState::Running
    })
    .await;

    engine.set_fail_status(true);
    let info = manager.get_info(&view.name).await.unwrap();
    assert_eq!(info.state, LifecycleState::Unknown);
}

#[tokio::test(start_paused = true)]
async fn refresh_failure_preserves_previous_session() {
    let engine = Arc::new(FakeEngine::new());
    engine.push_display(0, "ssh first@nyc1.tmate.io");
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "session established", |v| {
        v.session.is_some()
    })
    .await;

    // nothing queued: the refresh's polling pass comes up empty
    match manager.refresh_session(&view.name).await {
        Err(ManagerError::Session(_)) => {}
        other => panic!("expected Session error, got {:?}", other),
    }

    let info = manager.get_info(&view.name).await.unwrap();
    assert_eq!(info.session.as_deref(), Some("ssh first@nyc1.tmate.io"));
}

#[tokio::test(start_paused = true)]
async fn refresh_success_overwrites_session() {
    let engine = Arc::new(FakeEngine::new());
    engine.push_display(0, "ssh first@nyc1.tmate.io");
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "session established", |v| {
        v.session.is_some()
    })
    .await;

    engine.push_display(0, "ssh second@sf2.tmate.io");
    let refreshed = manager.refresh_session(&view.name).await.unwrap();
    assert_eq!(refreshed.session.as_deref(), Some("ssh second@sf2.tmate.io"));
}

#[tokio::test(start_paused = true)]
async fn refresh_on_unknown_or_containerless_instance_fails() {
    let engine = Arc::new(FakeEngine::new());
    engine.set_fail_create("boom");
    let manager = manager_with(&engine, test_config(10)).await;

    match manager.refresh_session("vps-nope").await {
        Err(ManagerError::NotFound) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }

    let view = manager.create(2, 1, 10).await.unwrap();
    wait_for(&manager, &view.name, "error state", |v| {
        v.state == LifecycleState::Error
    })
    .await;
    match manager.refresh_session(&view.name).await {
        Err(ManagerError::NoContainer) => {}
        other => panic!("expected NoContainer, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn startup_reconciliation_rebuilds_records_from_labels() {
    let engine = Arc::new(FakeEngine::with_tagged(vec![
        tagged("vps-100", "ref-a", true, 4, 2, 20),
        tagged("vps-101", "ref-b", false, 1, 1, 10),
        tagged("intruder-1", "ref-c", true, 8, 8, 80),
    ]));
    let manager = manager_with(&engine, test_config(10)).await;

    let views = manager.list().await;
    assert_eq!(views.len(), 2);

    let running = views.iter().find(|v| v.name == "vps-100").unwrap();
    assert_eq!(running.state, LifecycleState::Running);
    assert_eq!(
        running.resources,
        ResourceSpec {
            ram_gb: 4,
            cpu_cores: 2,
            disk_gb: 20
        }
    );

    let stopped = views.iter().find(|v| v.name == "vps-101").unwrap();
    assert_eq!(stopped.state, LifecycleState::Stopped);
    assert_eq!(
        stopped.resources,
        ResourceSpec {
            ram_gb: 1,
            cpu_cores: 1,
            disk_gb: 10
        }
    );
}

#[tokio::test(start_paused = true)]
async fn list_is_idempotent_without_mutation() {
    let engine = Arc::new(FakeEngine::with_tagged(vec![
        tagged("vps-100", "ref-a", true, 4, 2, 20),
        tagged("vps-101", "ref-b", false, 1, 1, 10),
    ]));
    let manager = manager_with(&engine, test_config(10)).await;

    let first = manager.list().await;
    let second = manager.list().await;
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn generated_names_never_collide() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    // all created within the same clock second under paused time
    let a = manager.create(2, 1, 10).await.unwrap();
    let b = manager.create(2, 1, 10).await.unwrap();
    let c = manager.create(2, 1, 10).await.unwrap();

    assert_ne!(a.name, b.name);
    assert_ne!(b.name, c.name);
    assert_ne!(a.name, c.name);
    assert!(a.name.starts_with("vps-"));
    assert_eq!(manager.list().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn delete_racing_in_flight_creation_leaves_no_container_behind() {
    let engine = Arc::new(FakeEngine::new());
    let manager = manager_with(&engine, test_config(10)).await;

    let view = manager.create(2, 1, 10).await.unwrap();
    // delete before the background task has registered the container
    manager.delete(&view.name).await.unwrap();
    assert!(manager.list().await.is_empty());

    // let the setup task finish; it must clean up the orphan it created
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(manager.list().await.is_empty());
    assert_eq!(engine.remove_calls().len(), 1);
}

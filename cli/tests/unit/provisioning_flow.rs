//! Provisioning stages against scripted collaborators, on a paused clock so
//! the linear backoff costs no wall time.

#![allow(clippy::expect_used)]

use abx_cli::application::ports::ApplianceStore;
use abx_cli::application::services::provision::{MachineOptions, Provisioner};
use abx_cli::domain::provisioning::{
    CONTAINER_INSPECT_COMMAND, MAX_STAGE_ATTEMPTS, SERVICE_STATUS_COMMAND,
};
use abx_cli::domain::{ApplianceError, AuthFailure, ProvisioningState, Stage};
use abx_cli::infra::store::ApplianceDir;
use tempfile::TempDir;

use crate::mocks::{ReadinessShell, RecordingReporter, ScriptedProbe, ScriptedService};

fn options() -> MachineOptions {
    MachineOptions {
        name: "acrobox".to_string(),
        region: "nyc1".to_string(),
        size: "s-1vcpu-1gb-intel".to_string(),
        data_size: 1,
        access_token: None,
        port: 22,
    }
}

#[tokio::test(start_paused = true)]
async fn provision_walks_every_stage_in_order() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::new(2);
    let sessions = ReadinessShell::failing(CONTAINER_INSPECT_COMMAND, 3);
    let probe = ScriptedProbe::open_after(1);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let state = provisioner.provision(&options()).await.expect("provision");

    assert_eq!(state, ProvisioningState::ServiceReady);
    assert_eq!(service.polls.get(), 3, "network ready on the third poll");
    assert_eq!(probe.probes.get(), 2);
    assert_eq!(sessions.calls_to(CONTAINER_INSPECT_COMMAND), 4);
    assert_eq!(sessions.calls_to(SERVICE_STATUS_COMMAND), 1);
    assert_eq!(
        reporter.steps(),
        vec![
            "Creating a new key pair.",
            "Provisioning machine and associated resources.",
            "Writing machine configuration.",
            "Waiting for SSH connectivity.",
            "Waiting for machine setup.",
            "Waiting for service setup.",
            "ok: Acrobox is ready.",
        ]
    );

    assert!(store.exists());
    assert_eq!(store.machine_id().await.expect("machine id"), "m-1");
    let request = service.requests.borrow()[0].clone();
    assert_eq!(request.product, "Indie Hacker");
    assert_eq!(request.name, "acrobox");
    let stored_public = std::fs::read_to_string(home.path().join("acrobox/id_ed25519.pub"))
        .expect("public key file");
    assert_eq!(stored_public, request.public_key);
}

#[tokio::test(start_paused = true)]
async fn network_timeout_stops_before_any_later_stage() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::new(u32::MAX);
    let sessions = ReadinessShell::default();
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let err = provisioner.provision(&options()).await.expect_err("no address");

    assert!(matches!(err, ApplianceError::Timeout(Stage::NetworkAssigned)));
    assert_eq!(service.polls.get(), MAX_STAGE_ATTEMPTS);
    assert_eq!(probe.probes.get(), 0);
    assert!(sessions.log.borrow().calls.is_empty());
    assert!(!store.exists(), "nothing is written before an address exists");
}

#[tokio::test(start_paused = true)]
async fn container_timeout_never_checks_the_service() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::new(0);
    let sessions = ReadinessShell::failing(CONTAINER_INSPECT_COMMAND, u32::MAX);
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let started = tokio::time::Instant::now();
    let err = provisioner.provision(&options()).await.expect_err("container never appears");

    assert!(matches!(err, ApplianceError::Timeout(Stage::ServiceContainerPresent)));
    assert_eq!(
        sessions.calls_to(CONTAINER_INSPECT_COMMAND),
        MAX_STAGE_ATTEMPTS as usize
    );
    assert_eq!(sessions.calls_to(SERVICE_STATUS_COMMAND), 0);
    // 1 s before the first network poll, then 1 + 2 + ... + 28 s of backoff.
    assert_eq!(started.elapsed().as_secs(), 1 + 406);
    assert_eq!(
        err.to_string(),
        Stage::ServiceContainerPresent.timeout_message()
    );
}

#[tokio::test(start_paused = true)]
async fn host_key_mismatch_aborts_without_retrying() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::new(0);
    let sessions = ReadinessShell {
        host_key_mismatch: true,
        ..ReadinessShell::default()
    };
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let started = tokio::time::Instant::now();
    let err = provisioner.provision(&options()).await.expect_err("wrong host key");

    assert!(matches!(
        err,
        ApplianceError::Auth(AuthFailure::HostKeyMismatch { .. })
    ));
    // Only the network stage's initial delay elapsed; no backoff was spent.
    assert_eq!(started.elapsed().as_secs(), 1);
}

#[tokio::test]
async fn existing_state_is_refused_before_any_request() {
    let home = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(home.path().join("acrobox")).expect("mkdir");
    std::fs::write(home.path().join("acrobox/IPv4"), "203.0.113.10").expect("write");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::new(0);
    let sessions = ReadinessShell::default();
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let err = provisioner.provision(&options()).await.expect_err("already exists");

    assert!(matches!(err, ApplianceError::AlreadyExists(_)));
    assert!(service.requests.borrow().is_empty());
    assert!(reporter.steps().is_empty());
}

#[tokio::test]
async fn refused_request_surfaces_the_service_message() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService::refusing(402);
    let sessions = ReadinessShell::default();
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    let err = provisioner.provision(&options()).await.expect_err("refused");

    assert!(matches!(err, ApplianceError::Service { status: 402, .. }));
    assert_eq!(service.polls.get(), 0);
    assert!(!store.exists());
}

#[tokio::test(start_paused = true)]
async fn padded_address_is_pinned_and_stored_trimmed() {
    let home = TempDir::new().expect("tempdir");
    let store = ApplianceDir::new(home.path(), "acrobox");
    let service = ScriptedService {
        address: " 127.0.0.1\n".to_string(),
        ..ScriptedService::new(0)
    };
    let sessions = ReadinessShell::default();
    let probe = ScriptedProbe::open_after(0);
    let reporter = RecordingReporter::default();
    let provisioner = Provisioner {
        service: &service,
        sessions: &sessions,
        probe: &probe,
        store: &store,
        reporter: &reporter,
    };

    provisioner.provision(&options()).await.expect("provision");

    let endpoint = store.endpoint(22).await.expect("endpoint");
    assert_eq!(endpoint.address, "127.0.0.1");
    assert_eq!(endpoint.identity.host, "127.0.0.1");
}

//! Application service: appliance provisioning use-case.
//!
//! Requests a machine, pins its identity once the network is assigned, then
//! polls each readiness stage in order. Stages never run concurrently and
//! never roll back; an interrupted run starts over from the first stage.

use tracing::info;

use crate::application::ports::{
    ApplianceRecord, ApplianceStore, NetworkProbe, ProgressReporter, ProvisioningService,
    SessionFactory,
};
use crate::application::services::executor::CommandExecutor;
use crate::application::services::retry::poll_until;
use crate::domain::machine::{Machine, MachineRequest, PRODUCT};
use crate::domain::provisioning::{CONTAINER_INSPECT_COMMAND, SERVICE_STATUS_COMMAND};
use crate::domain::{
    ApplianceError, HostIdentity, KeyPair, ProvisioningState, RemoteEndpoint, Stage,
};

/// Machine parameters chosen by the user.
#[derive(Debug, Clone)]
pub struct MachineOptions {
    pub name: String,
    pub region: String,
    pub size: String,
    pub data_size: u32,
    pub access_token: Option<String>,
    /// SSH port the appliance listens on.
    pub port: u16,
}

/// Collaborators needed to bring an appliance up.
pub struct Provisioner<'a, S, F, P, T, R> {
    pub service: &'a S,
    pub sessions: &'a F,
    pub probe: &'a P,
    pub store: &'a T,
    pub reporter: &'a R,
}

impl<S, F, P, T, R> Provisioner<'_, S, F, P, T, R>
where
    S: ProvisioningService,
    F: SessionFactory,
    P: NetworkProbe,
    T: ApplianceStore,
    R: ProgressReporter,
{
    /// Run the whole flow: key pair, machine request, network assignment,
    /// local state, then the SSH, container and service stages.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if local state is present, `Service` if the request is
    /// refused, `Timeout(stage)` when a stage runs out of attempts, and `Auth`
    /// as soon as the appliance presents the wrong host key.
    pub async fn provision(&self, opts: &MachineOptions) -> Result<ProvisioningState, ApplianceError> {
        if self.store.exists() {
            return Err(ApplianceError::AlreadyExists(self.store.dir()));
        }
        self.reporter.step("Creating a new key pair.");
        let key_pair = KeyPair::generate()?;

        let request = MachineRequest {
            product: PRODUCT.to_string(),
            name: opts.name.clone(),
            region: opts.region.clone(),
            size: opts.size.clone(),
            data_size: opts.data_size,
            public_key: key_pair.authorized_key().to_string(),
            access_token: opts.access_token.clone(),
        };
        let id = self.service.request_machine(&request).await?;
        info!(machine_id = %id, "machine requested");
        let mut state = ProvisioningState::Requested;

        let machine = self.wait_for_network(&id).await?;
        state = state.max(Stage::NetworkAssigned.reached());

        self.reporter.step("Writing machine configuration.");
        let address = machine.ipv4.trim();
        let identity = HostIdentity::new(address, opts.port, &machine.public_key)?;
        self.store
            .save(&ApplianceRecord {
                machine_id: machine.id.clone(),
                address: address.to_string(),
                identity,
                key_pair,
            })
            .await?;
        let endpoint = self.store.endpoint(opts.port).await?;

        state = state.max(self.await_ready(&endpoint).await?);
        self.reporter.success("Acrobox is ready.");
        Ok(state)
    }

    /// Run the stages that follow network assignment against `endpoint`.
    ///
    /// # Errors
    ///
    /// See [`Provisioner::provision`].
    pub async fn await_ready(
        &self,
        endpoint: &RemoteEndpoint,
    ) -> Result<ProvisioningState, ApplianceError> {
        self.wait_for_ssh(endpoint).await?;
        self.wait_for_container(endpoint).await?;
        self.wait_for_service(endpoint).await?;
        Ok(Stage::ServiceReady.reached())
    }

    /// Poll the provisioning service until it reports an address.
    ///
    /// # Errors
    ///
    /// `Timeout(NetworkAssigned)` after the last attempt; service errors
    /// other than transport failures abort at once.
    pub async fn wait_for_network(&self, id: &str) -> Result<Machine, ApplianceError> {
        let stage = Stage::NetworkAssigned;
        self.reporter.step(stage.description());
        poll_until(stage, stage.policy(), |_| async move {
            let machine = self.service.get_machine(id).await?;
            Ok(machine.has_address().then_some(machine))
        })
        .await
    }

    /// Poll until a TCP connection to the SSH port succeeds.
    ///
    /// # Errors
    ///
    /// `Timeout(SshReachable)` after the last attempt.
    pub async fn wait_for_ssh(&self, endpoint: &RemoteEndpoint) -> Result<(), ApplianceError> {
        let stage = Stage::SshReachable;
        self.reporter.step(stage.description());
        poll_until(stage, stage.policy(), |_| async move {
            let reachable = self
                .probe
                .check_tcp_connectivity(&endpoint.address, endpoint.port)
                .await?;
            Ok(reachable.then_some(()))
        })
        .await
    }

    /// Poll until the daemon container exists.
    ///
    /// # Errors
    ///
    /// `Timeout(ServiceContainerPresent)` after the last attempt, `Auth` at once.
    pub async fn wait_for_container(&self, endpoint: &RemoteEndpoint) -> Result<(), ApplianceError> {
        self.wait_for_command(Stage::ServiceContainerPresent, endpoint, CONTAINER_INSPECT_COMMAND)
            .await
    }

    /// Poll until the daemon reports its status.
    ///
    /// # Errors
    ///
    /// `Timeout(ServiceReady)` after the last attempt, `Auth` at once.
    pub async fn wait_for_service(&self, endpoint: &RemoteEndpoint) -> Result<(), ApplianceError> {
        self.wait_for_command(Stage::ServiceReady, endpoint, SERVICE_STATUS_COMMAND)
            .await
    }

    /// Each attempt opens its own session through the executor.
    async fn wait_for_command(
        &self,
        stage: Stage,
        endpoint: &RemoteEndpoint,
        command: &str,
    ) -> Result<(), ApplianceError> {
        self.reporter.step(stage.description());
        let executor = CommandExecutor::new(self.sessions, endpoint);
        let executor = &executor;
        poll_until(stage, stage.policy(), |_| async move {
            executor.run(command).await.map(|_| Some(()))
        })
        .await
    }
}

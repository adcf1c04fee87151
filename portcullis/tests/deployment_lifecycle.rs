use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use portcullis::deploy::{DeploymentContext, FilterChainBuilder};
use portcullis::{
    ContributorRegistry, Gateway, GatewayServices, ProviderContributor,
};
use portcullis_sdk::{DeploymentError, LifecycleStage, Provider, Service, Topology};

// ---------------------------------------------------------------------------
// Test contributors
// ---------------------------------------------------------------------------

/// Records every lifecycle invocation into a shared log.
struct RecordingContributor {
    role: &'static str,
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProviderContributor for RecordingContributor {
    fn role(&self) -> &str {
        self.role
    }

    fn name(&self) -> &str {
        self.name
    }

    async fn initialize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        self.log.lock().unwrap().push(format!("{}:initialize", self.role));
        Ok(())
    }

    async fn contribute_provider(
        &self,
        _ctx: &mut DeploymentContext,
        _provider: &Provider,
    ) -> Result<(), DeploymentError> {
        self.log.lock().unwrap().push(format!("{}:provider", self.role));
        Ok(())
    }

    async fn contribute_filter(
        &self,
        _ctx: &mut DeploymentContext,
        _provider: &Provider,
        service: &Service,
        chain: &mut FilterChainBuilder,
    ) -> Result<(), DeploymentError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:filter:{}", self.role, service.role()));
        chain.add_filter(self.role, self.name, Default::default());
        Ok(())
    }

    async fn finalize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        self.log.lock().unwrap().push(format!("{}:finalize", self.role));
        Ok(())
    }
}

/// Fails at a chosen lifecycle stage.
struct FailingContributor {
    fail_at: LifecycleStage,
}

#[async_trait]
impl ProviderContributor for FailingContributor {
    fn role(&self) -> &str {
        "authorization"
    }

    fn name(&self) -> &str {
        "failing"
    }

    async fn initialize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        if self.fail_at == LifecycleStage::Initialize {
            return Err(DeploymentError::lifecycle(
                LifecycleStage::Initialize,
                self.role(),
                "deliberate failure",
            ));
        }
        Ok(())
    }

    async fn finalize_contribution(
        &self,
        _ctx: &mut DeploymentContext,
    ) -> Result<(), DeploymentError> {
        if self.fail_at == LifecycleStage::Finalize {
            return Err(DeploymentError::lifecycle(
                LifecycleStage::Finalize,
                self.role(),
                "deliberate failure",
            ));
        }
        Ok(())
    }
}

fn recording_registry(log: &Arc<Mutex<Vec<String>>>) -> Arc<ContributorRegistry> {
    let registry = ContributorRegistry::builder()
        .register(Arc::new(RecordingContributor {
            role: "authentication",
            name: "recording",
            log: log.clone(),
        }))
        .unwrap()
        .register(Arc::new(RecordingContributor {
            role: "identity-assertion",
            name: "recording",
            log: log.clone(),
        }))
        .unwrap()
        .register(Arc::new(RecordingContributor {
            role: "authorization",
            name: "recording",
            log: log.clone(),
        }))
        .unwrap()
        .build();
    Arc::new(registry)
}

fn recording_topology(name: &str) -> Topology {
    Topology::builder(name)
        .provider(Provider::new("authentication", "recording"))
        .provider(Provider::new("identity-assertion", "recording"))
        .provider(Provider::new("authorization", "recording"))
        .service(Service::new("WEATHER").with_url("http://backend-1:8000/weather"))
        .service(Service::new("METRICS").with_url("http://backend-2:9000/metrics"))
        .build()
}

// ---------------------------------------------------------------------------
// Stage ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stages_complete_for_all_providers_before_the_next_begins() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = Gateway::new(recording_registry(&log), GatewayServices::builder().build());

    gateway.deploy(recording_topology("order")).await.unwrap();

    let log = log.lock().unwrap();
    let position = |entry: &str| {
        log.iter()
            .position(|l| l == entry)
            .unwrap_or_else(|| panic!("missing log entry {entry}"))
    };

    // Every initialize precedes every contribute; every contribute precedes
    // every finalize.
    let last_initialize = position("authorization:initialize");
    let first_provider = position("authentication:provider");
    assert!(last_initialize < first_provider);

    let last_filter = position("authorization:filter:METRICS");
    let first_finalize = position("authentication:finalize");
    assert!(last_filter < first_finalize);

    // Within a stage, providers run in topology-declared order.
    assert!(position("authentication:initialize") < position("identity-assertion:initialize"));
    assert!(position("identity-assertion:initialize") < position("authorization:initialize"));
    assert!(position("authentication:finalize") < position("identity-assertion:finalize"));

    // contribute_filter runs once per (provider, service) pairing.
    assert!(position("authentication:filter:WEATHER") < position("authentication:filter:METRICS"));
}

#[tokio::test]
async fn filter_chains_are_sorted_by_pipeline_position() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = Gateway::new(recording_registry(&log), GatewayServices::builder().build());

    // Declare providers in scrambled order; the compiled chain must not care.
    let topology = Topology::builder("scrambled")
        .provider(Provider::new("authorization", "recording"))
        .provider(Provider::new("authentication", "recording"))
        .provider(Provider::new("identity-assertion", "recording"))
        .service(Service::new("WEATHER"))
        .build();

    let pipeline = gateway.deploy(topology).await.unwrap();
    let roles: Vec<&str> = pipeline
        .filter_chain("WEATHER")
        .unwrap()
        .iter()
        .map(|f| f.role.as_str())
        .collect();
    assert_eq!(
        roles,
        vec!["authentication", "identity-assertion", "authorization"]
    );
}

// ---------------------------------------------------------------------------
// Publication semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_compilation_publishes_exactly_one_version() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = Gateway::new(recording_registry(&log), GatewayServices::builder().build());

    let deployed = gateway.deploy(recording_topology("cluster")).await.unwrap();

    assert_eq!(gateway.topologies(), vec!["cluster".to_string()]);
    assert_eq!(
        gateway.pipeline("cluster").unwrap().version(),
        deployed.version()
    );
}

#[tokio::test]
async fn discovery_failure_publishes_nothing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = Gateway::new(recording_registry(&log), GatewayServices::builder().build());

    let topology = Topology::builder("cluster")
        .provider(Provider::new("authentication", "recording"))
        .provider(Provider::new("federation", "unregistered"))
        .build();

    let err = gateway.deploy(topology).await.unwrap_err();
    assert!(matches!(err, DeploymentError::DiscoveryFailure { .. }));
    assert!(gateway.pipeline("cluster").is_none());

    // Discovery runs before any lifecycle stage: zero side effects.
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_recompilation_keeps_prior_pipeline_in_service() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = Gateway::new(recording_registry(&log), GatewayServices::builder().build());

    let first = gateway.deploy(recording_topology("cluster")).await.unwrap();

    // Next descriptor version references a provider nobody registered.
    let broken = Topology::builder("cluster")
        .provider(Provider::new("authentication", "no-such-impl"))
        .build();
    gateway.deploy(broken).await.unwrap_err();

    let live = gateway.pipeline("cluster").unwrap();
    assert_eq!(live.version(), first.version());
}

#[tokio::test]
async fn lifecycle_failure_at_each_stage_aborts_the_pass() {
    for stage in [LifecycleStage::Initialize, LifecycleStage::Finalize] {
        let registry = ContributorRegistry::builder()
            .register(Arc::new(FailingContributor { fail_at: stage }))
            .unwrap()
            .build();
        let gateway = Gateway::new(Arc::new(registry), GatewayServices::builder().build());

        let topology = Topology::builder("cluster")
            .provider(Provider::new("authorization", "failing"))
            .build();

        let err = gateway.deploy(topology).await.unwrap_err();
        assert!(
            matches!(err, DeploymentError::LifecycleFailure { stage: s, .. } if s == stage),
            "stage {stage}"
        );
        assert!(gateway.pipeline("cluster").is_none());
    }
}

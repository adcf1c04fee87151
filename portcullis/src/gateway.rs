use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use portcullis_sdk::{DeploymentError, Topology};
use tracing::info;

use crate::deploy::{CompiledPipeline, ContributorRegistry, DeploymentCompiler};
use crate::services::GatewayServices;

type PipelineTable = HashMap<String, Arc<CompiledPipeline>>;

/// Entry point tying the compiler, the contribution registry, and the
/// published-pipeline table together.
///
/// Publication is an atomic pointer swap over the whole table: requests
/// already holding a pipeline run to completion against it, new requests see
/// the replacement, and no request ever observes a partially compiled
/// pipeline. A failed compilation leaves the previously published version in
/// service untouched.
pub struct Gateway {
    compiler: DeploymentCompiler,
    services: Arc<GatewayServices>,
    pipelines: ArcSwap<PipelineTable>,
}

impl Gateway {
    #[must_use]
    pub fn new(registry: Arc<ContributorRegistry>, services: Arc<GatewayServices>) -> Self {
        Self {
            compiler: DeploymentCompiler::new(registry, services.clone()),
            services,
            pipelines: ArcSwap::from_pointee(PipelineTable::new()),
        }
    }

    #[must_use]
    pub fn services(&self) -> &Arc<GatewayServices> {
        &self.services
    }

    /// Compile and publish one topology version. Redeploying an existing
    /// topology swaps the new pipeline in atomically.
    ///
    /// # Errors
    /// Propagates the compiler's `DeploymentError`; on error nothing is
    /// published and any prior pipeline for the topology stays live.
    pub async fn deploy(&self, topology: Topology) -> Result<Arc<CompiledPipeline>, DeploymentError> {
        let name = topology.name().to_string();
        let pipeline = Arc::new(self.compiler.compile(topology).await?);

        self.pipelines.rcu(|table| {
            let mut table = PipelineTable::clone(table);
            table.insert(name.clone(), pipeline.clone());
            table
        });

        info!(
            topology = %name,
            version = %pipeline.version(),
            "Published pipeline"
        );
        Ok(pipeline)
    }

    /// The currently published pipeline for a topology, if any.
    #[must_use]
    pub fn pipeline(&self, topology_name: &str) -> Option<Arc<CompiledPipeline>> {
        self.pipelines.load().get(topology_name).cloned()
    }

    /// Retire a topology's published pipeline. Returns `false` if none was
    /// published.
    pub fn undeploy(&self, topology_name: &str) -> bool {
        let mut removed = false;
        self.pipelines.rcu(|table| {
            let mut table = PipelineTable::clone(table);
            removed = table.remove(topology_name).is_some();
            table
        });
        if removed {
            info!(topology = topology_name, "Retired pipeline");
        }
        removed
    }

    /// Names of all currently published topologies.
    #[must_use]
    pub fn topologies(&self) -> Vec<String> {
        self.pipelines.load().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_sdk::Service;

    fn gateway() -> Gateway {
        Gateway::new(
            Arc::new(ContributorRegistry::with_builtins().unwrap()),
            GatewayServices::builder().build(),
        )
    }

    #[tokio::test]
    async fn deploy_publishes_exactly_one_version() {
        let gw = gateway();
        let topology = Topology::builder("cluster-a")
            .service(Service::new("WEATHER").with_url("http://backend:8000"))
            .build();

        let deployed = gw.deploy(topology).await.unwrap();
        let published = gw.pipeline("cluster-a").unwrap();
        assert_eq!(published.version(), deployed.version());
        assert_eq!(gw.topologies(), vec!["cluster-a".to_string()]);
    }

    #[tokio::test]
    async fn redeploy_swaps_versions_atomically() {
        let gw = gateway();
        let build = || {
            Topology::builder("cluster-a")
                .service(Service::new("WEATHER").with_url("http://backend:8000"))
                .build()
        };

        let first = gw.deploy(build()).await.unwrap();
        let held = gw.pipeline("cluster-a").unwrap();

        let second = gw.deploy(build()).await.unwrap();
        assert_ne!(first.version(), second.version());

        // A request dispatched before the redeploy keeps its pipeline.
        assert_eq!(held.version(), first.version());
        assert_eq!(gw.pipeline("cluster-a").unwrap().version(), second.version());
    }

    #[tokio::test]
    async fn undeploy_retires_pipeline() {
        let gw = gateway();
        let topology = Topology::builder("cluster-a").build();
        gw.deploy(topology).await.unwrap();

        assert!(gw.undeploy("cluster-a"));
        assert!(gw.pipeline("cluster-a").is_none());
        assert!(!gw.undeploy("cluster-a"));
    }
}

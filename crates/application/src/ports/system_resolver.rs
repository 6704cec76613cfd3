use async_trait::async_trait;
use hostres_domain::{HostEntry, Hostname, QueryTypeSet, StageError};

#[async_trait]
pub trait SystemResolver: Send + Sync {
    async fn resolve(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError>;
}

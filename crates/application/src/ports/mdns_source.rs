use async_trait::async_trait;
use hostres_domain::{HostEntry, Hostname, QueryTypeSet, StageError};

#[async_trait]
pub trait MdnsSource: Send + Sync {
    async fn query(
        &self,
        host: &Hostname,
        query_types: QueryTypeSet,
    ) -> Result<HostEntry, StageError>;
}

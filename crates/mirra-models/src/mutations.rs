//! Mutation gateway
//!
//! Permission checks and execution are independent: a check never runs
//! the mutation and execution never consults the check.

use std::sync::Arc;

use mirra_core::{MirraResult, MutationDescriptor, MutationOptions, PermissionCheckResult};
use mirra_state::BaseStore;
use tracing::{debug, warn};

use crate::Host;

#[derive(Clone)]
pub struct MutationGateway {
    host: Arc<dyn Host>,
    store: BaseStore,
}

impl MutationGateway {
    pub fn new(host: Arc<dyn Host>, store: BaseStore) -> Self {
        MutationGateway { host, store }
    }

    /// Ask the host oracle, against the current snapshot, whether
    /// `descriptor` would be allowed
    pub fn check(&self, descriptor: &MutationDescriptor) -> PermissionCheckResult {
        let result = self
            .store
            .read(|data| self.host.check_permissions_for_mutation(descriptor, data));
        if !result.has_permission {
            debug!(
                kind = ?descriptor.kind(),
                target = descriptor.target_id(),
                reason = ?result.reason_display_string,
                "mutation not permitted"
            );
        }
        result
    }

    /// Forward `descriptor` to the host. The host's outcome is returned
    /// unmodified; no retry.
    pub async fn apply(
        &self,
        descriptor: MutationDescriptor,
        options: Option<MutationOptions>,
    ) -> MirraResult<()> {
        let kind = descriptor.kind();
        let target = descriptor.target_id().to_owned();
        debug!(?kind, %target, ?options, "applying mutation");

        let result = self.host.apply_mutation(descriptor, options).await;
        if let Err(err) = &result {
            warn!(?kind, %target, error = %err, "mutation failed");
        }
        result
    }
}

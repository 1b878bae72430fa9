//! Encryption key checks run before any snapshot is taken.

use tracing::{info, warn};

use super::{Account, MigrationError, MigrationOrchestrator, MigrationPlan, MigrationStep};
use crate::backend::ClusterBackend;
use crate::fault::{Classify, FaultKind};
use crate::keys::KeyBackend;

impl<B> MigrationOrchestrator<B>
where
    B: ClusterBackend + KeyBackend + Sync,
{
    /// Confirms the migration key exists in the source account and the
    /// destination key exists in the destination account.
    pub(super) async fn verify_keys(
        &self,
        plan: &MigrationPlan,
    ) -> Result<(), MigrationError<B::Error>> {
        self.checkpoint(MigrationStep::VerifyKeys)?;
        verify_key(&self.source, Account::Source, &plan.migration_key_alias).await?;
        verify_key(
            &self.destination,
            Account::Destination,
            &plan.destination_key_alias,
        )
        .await
    }
}

async fn verify_key<B>(
    backend: &B,
    account: Account,
    alias: &str,
) -> Result<(), MigrationError<B::Error>>
where
    B: KeyBackend,
{
    let step = MigrationStep::VerifyKeys;
    match backend.describe_key(alias).await {
        Ok(key) if key.enabled => {
            info!(
                %account,
                alias,
                key_id = %key.key_id,
                key_arn = key.arn.as_deref().unwrap_or("unreported"),
                "encryption key found"
            );
            Ok(())
        }
        Ok(_) => Err(MigrationError::KeyDisabled {
            account,
            alias: alias.to_owned(),
        }),
        Err(err) if err.fault() == FaultKind::NotFound => {
            warn!(%account, alias, "encryption key alias not found");
            let available = backend
                .list_key_aliases()
                .await
                .map_err(|source| MigrationError::Step { step, source })?;
            Err(MigrationError::KeyUnavailable {
                account,
                alias: alias.to_owned(),
                available,
            })
        }
        Err(source) => Err(MigrationError::Step { step, source }),
    }
}

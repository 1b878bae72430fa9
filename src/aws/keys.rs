//! KMS key lookups.

use aws_sdk_kms::types::AliasListEntry;
use tracing::debug;

use super::types::{alias_name, key_description};
use super::{AwsBackend, AwsBackendError};
use crate::backend::BackendFuture;
use crate::keys::{KeyBackend, KeyDescription, alias_key_id};

const DESCRIBE: &str = "DescribeKey";
const LIST_ALIASES: &str = "ListAliases";

impl AwsBackend {
    async fn describe_alias(&self, alias: &str) -> Result<KeyDescription, AwsBackendError> {
        let output = self
            .kms
            .describe_key()
            .key_id(alias_key_id(alias))
            .send()
            .await
            .map_err(|err| AwsBackendError::from_sdk(DESCRIBE, &err))?;
        let metadata = output
            .key_metadata()
            .ok_or_else(|| AwsBackendError::missing(DESCRIBE, "KeyMetadata"))?;
        Ok(key_description(metadata))
    }

    async fn all_aliases(&self) -> Result<Vec<String>, AwsBackendError> {
        let mut aliases = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .kms
                .list_aliases()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|err| AwsBackendError::from_sdk(LIST_ALIASES, &err))?;
            aliases.extend(
                output
                    .aliases()
                    .iter()
                    .filter_map(AliasListEntry::alias_name)
                    .map(alias_name),
            );
            match output.next_marker() {
                Some(next) if output.truncated() => marker = Some(next.to_owned()),
                _ => break,
            }
        }
        debug!(account = %self.account, count = aliases.len(), "listed key aliases");
        Ok(aliases)
    }
}

impl KeyBackend for AwsBackend {
    fn describe_key<'a>(
        &'a self,
        alias: &'a str,
    ) -> BackendFuture<'a, KeyDescription, Self::Error> {
        Box::pin(async move { self.describe_alias(alias).await })
    }

    fn list_key_aliases(&self) -> BackendFuture<'_, Vec<String>, Self::Error> {
        Box::pin(async move { self.all_aliases().await })
    }
}

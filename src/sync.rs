use thiserror::Error;

use crate::{
    config::{ConfigError, InputSource, SyncConfig},
    template_sync::{
        content::FileError,
        template_store::{SesSettings, StoreError, TemplateStore},
        Reconciliation, TemplateReconciler,
    },
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads inputs, reads the template files and reconciles the template.
///
/// Configuration is validated in full before any file is read, and files are
/// read before `connect` is called, so a bad input never reaches SES.
#[tracing::instrument(level = "debug", skip(inputs, connect), err)]
pub async fn run<I, C, S>(inputs: &I, connect: C) -> Result<Reconciliation, SyncError>
where
    I: InputSource + ?Sized,
    C: FnOnce(&SesSettings) -> Result<S, StoreError>,
    S: TemplateStore,
{
    let SyncConfig {
        template_name,
        files,
        ses,
    } = SyncConfig::load(inputs)?;
    tracing::debug!(message = "loaded config", %template_name, ?files, region = ?ses.region);

    let spec = files.load(&template_name).await?;
    let store = connect(&ses)?;
    let reconciler = TemplateReconciler::new(store);
    let reconciliation = reconciler.reconcile(&spec).await?;

    tracing::debug!(message = "reconciled template", %template_name, action = ?reconciliation.action);
    Ok(reconciliation)
}

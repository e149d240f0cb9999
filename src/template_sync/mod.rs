pub mod content;
pub mod template;
pub mod template_store;

use self::{
    template::{TemplateContent, TemplateSpec},
    template_store::{StoreError, TemplateStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Outcome of one reconcile. `before` is only fetched on the update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub action: ReconcileAction,
    pub before: Option<TemplateContent>,
    pub after: TemplateContent,
}

/// Creates or overwrites a single template in the store.
///
/// The create-or-update decision is made from the listing alone, without
/// comparing content: a found template is always overwritten. There is no
/// locking between listing and writing, so a concurrent run against the same
/// name may fail with [`StoreError::AlreadyExists`] or [`StoreError::NotFound`]
/// or lose an update. Errors are never retried and a completed write is never
/// rolled back.
pub struct TemplateReconciler<S>
where
    S: TemplateStore,
{
    store: S,
}

impl<S> TemplateReconciler<S>
where
    S: TemplateStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(level = "debug", skip(self, spec), fields(template = %spec.name), err)]
    pub async fn reconcile(&self, spec: &TemplateSpec) -> Result<Reconciliation, StoreError> {
        let store = &self.store;

        let (action, before) = if store.exists(&spec.name).await? {
            let before = store.get_template(&spec.name).await?;
            tracing::info!("Template on AWS SES before updating: {}", before);
            store.update_template(spec).await?;
            (ReconcileAction::Updated, Some(before))
        } else {
            store.create_template(spec).await?;
            (ReconcileAction::Created, None)
        };

        let after = store.get_template(&spec.name).await?;
        tracing::info!("Template on AWS SES after updating: {}", after);

        Ok(Reconciliation {
            action,
            before,
            after,
        })
    }
}

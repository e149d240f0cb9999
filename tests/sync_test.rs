use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ses_template_sync::{
    config::{StaticInputs, AWS_ACCESS_KEY, TEMPLATE_NAME},
    sync::{run, SyncError},
    template_sync::{
        template::{TemplateContent, TemplateMetadata, TemplateSpec},
        template_store::{SesSettings, StoreError, TemplateStore},
        ReconcileAction,
    },
};

#[derive(Clone, Default)]
struct InMemoryStore {
    templates: Arc<Mutex<HashMap<String, TemplateContent>>>,
    writes: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn list_templates(&self) -> Result<Vec<TemplateMetadata>, StoreError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .keys()
            .map(|name| TemplateMetadata { name: name.clone() })
            .collect())
    }

    async fn get_template(&self, name: &str) -> Result<TemplateContent, StoreError> {
        self.templates
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn create_template(&self, spec: &TemplateSpec) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(format!("create {}", spec.name));
        self.templates
            .lock()
            .unwrap()
            .insert(spec.name.clone(), spec.into());
        Ok(())
    }

    async fn update_template(&self, spec: &TemplateSpec) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(format!("update {}", spec.name));
        self.templates
            .lock()
            .unwrap()
            .insert(spec.name.clone(), spec.into());
        Ok(())
    }
}

fn write_template_files(dir: &Path) {
    std::fs::write(dir.join("subject.txt"), "Your account was deleted").unwrap();
    std::fs::write(
        dir.join("email.txt"),
        "Hello {{name}},\nyour account was deleted.\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("email.html"),
        "<html>\n  <body>\n    <p>Hello {{name}},</p>\n    <p>your account was deleted.</p>\n  </body>\n</html>\n",
    )
    .unwrap();
}

fn inputs_for(dir: &Path) -> Vec<(String, String)> {
    let path = |file: &str| dir.join(file).to_string_lossy().into_owned();
    vec![
        ("templateName".to_string(), "UserAccountDeleted".to_string()),
        ("subjectFilePath".to_string(), path("subject.txt")),
        ("htmlBodyFilePath".to_string(), path("email.html")),
        ("rawBodyFilePath".to_string(), path("email.txt")),
        ("sesRegion".to_string(), "us-east-1".to_string()),
        ("awsAccessKey".to_string(), "AKIAEXAMPLE".to_string()),
        ("awsSecretKey".to_string(), "secret".to_string()),
    ]
}

#[tokio::test]
async fn test_run_creates_then_updates() {
    let dir = tempfile::tempdir().unwrap();
    write_template_files(dir.path());
    let inputs = StaticInputs::new(inputs_for(dir.path()));
    let store = InMemoryStore::default();

    let first = run(&inputs, |_: &SesSettings| Ok(store.clone()))
        .await
        .unwrap();
    let second = run(&inputs, |_: &SesSettings| Ok(store.clone()))
        .await
        .unwrap();

    assert_eq!(first.action, ReconcileAction::Created);
    assert_eq!(second.action, ReconcileAction::Updated);
    assert_eq!(
        *store.writes.lock().unwrap(),
        vec![
            "create UserAccountDeleted".to_string(),
            "update UserAccountDeleted".to_string(),
        ]
    );

    let stored = store.get_template("UserAccountDeleted").await.unwrap();
    assert_eq!(stored, second.after);
    assert_eq!(stored.subject_part.as_deref(), Some("Your account was deleted"));
    assert_eq!(
        stored.text_part.as_deref(),
        Some("Hello {{name}},\nyour account was deleted.\n")
    );
    let html = stored.html_part.unwrap();
    assert!(!html.contains('\n'));
    assert!(html.contains("{{name}}"));
}

#[tokio::test]
async fn test_run_passes_settings_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    write_template_files(dir.path());
    let inputs = StaticInputs::new(inputs_for(dir.path()));
    let mut seen_settings = None;

    run(&inputs, |settings: &SesSettings| {
        seen_settings = Some(settings.clone());
        Ok(InMemoryStore::default())
    })
    .await
    .unwrap();

    let settings = seen_settings.unwrap();
    assert_eq!(settings.region, rusoto_core::Region::UsEast1);
    assert_eq!(settings.credentials.unwrap().access_key, "AKIAEXAMPLE");
}

#[tokio::test]
async fn test_missing_input_fails_before_any_io() {
    // None of the template files exist, so reading any of them would surface
    // as a file error instead of a config error.
    let dir = tempfile::tempdir().unwrap();
    for missing in [TEMPLATE_NAME, AWS_ACCESS_KEY].iter() {
        let inputs = StaticInputs::new(
            inputs_for(dir.path())
                .into_iter()
                .filter(|(key, _)| key.as_str() != *missing),
        );
        let mut connected = false;

        let err = run(&inputs, |_: &SesSettings| {
            connected = true;
            Ok(InMemoryStore::default())
        })
        .await
        .unwrap_err();

        assert!(!connected);
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().starts_with(&format!("Invalid {}:", missing)));
    }
}

#[tokio::test]
async fn test_unreadable_file_fails_before_connect() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = StaticInputs::new(inputs_for(dir.path()));
    let mut connected = false;

    let err = run(&inputs, |_: &SesSettings| {
        connected = true;
        Ok(InMemoryStore::default())
    })
    .await
    .unwrap_err();

    assert!(!connected);
    assert!(matches!(err, SyncError::File(_)));
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_template_files(dir.path());
    let inputs = StaticInputs::new(inputs_for(dir.path()));

    let err = run(&inputs, |_: &SesSettings| -> Result<InMemoryStore, _> {
        Err(StoreError::remote("connect to SES", "no TLS roots"))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Store(StoreError::Remote { .. })));
    assert_eq!(err.to_string(), "unable to connect to SES: no TLS roots");
}

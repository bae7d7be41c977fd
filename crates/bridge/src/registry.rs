//! The dispatch table: one backend per [`ToolKind`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use vibeforge_core::error::ToolError;
use vibeforge_core::tool::{
    ToolBridge, ToolCall, ToolInvocation, ToolKind, ToolOutput, ToolResult,
};

use crate::assets::AssetStore;
use crate::flow::FlowTrigger;
use crate::notify::Notifier;
use crate::pages::PageStore;
use crate::templates::TemplateSearch;

/// Executes tool calls against the configured backends.
///
/// Page and asset storage are optional; calls to a missing backend fail with
/// a "not configured" error instead of reaching anything.
#[derive(Clone)]
pub struct ToolRegistry {
    templates: Arc<dyn TemplateSearch>,
    pages: Option<Arc<dyn PageStore>>,
    assets: Option<Arc<dyn AssetStore>>,
    notifier: Arc<dyn Notifier>,
    flows: Arc<dyn FlowTrigger>,
}

impl ToolRegistry {
    pub fn new(
        templates: Arc<dyn TemplateSearch>,
        notifier: Arc<dyn Notifier>,
        flows: Arc<dyn FlowTrigger>,
    ) -> Self {
        Self {
            templates,
            pages: None,
            assets: None,
            notifier,
            flows,
        }
    }

    pub fn with_pages(mut self, pages: Arc<dyn PageStore>) -> Self {
        info!(store = pages.name(), "Page store attached");
        self.pages = Some(pages);
        self
    }

    pub fn with_assets(mut self, assets: Arc<dyn AssetStore>) -> Self {
        info!(store = assets.name(), "Asset store attached");
        self.assets = Some(assets);
        self
    }

    pub fn pages(&self) -> Option<&Arc<dyn PageStore>> {
        self.pages.as_ref()
    }

    pub fn assets(&self) -> Option<&Arc<dyn AssetStore>> {
        self.assets.as_ref()
    }

    /// Whether each tool has a backend that can actually serve it.
    pub fn availability(&self) -> Vec<(ToolKind, bool)> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| {
                let ready = match kind {
                    ToolKind::SavePage => self.pages.is_some(),
                    ToolKind::PutAsset => self.assets.is_some(),
                    ToolKind::SearchTemplates | ToolKind::Notify | ToolKind::TriggerFlow => true,
                };
                (kind, ready)
            })
            .collect()
    }

    /// Run a validated invocation on its backend.
    pub async fn execute(&self, invocation: ToolInvocation) -> Result<ToolOutput, ToolError> {
        match invocation {
            ToolInvocation::SearchTemplates(args) => {
                self.templates.search(&args).await.map(ToolOutput::SearchTemplates)
            }
            ToolInvocation::SavePage(args) => {
                let pages = self.pages.as_ref().ok_or_else(|| ToolError::NotConfigured {
                    tool_name: ToolKind::SavePage.name().into(),
                    reason: "DB not configured".into(),
                })?;
                pages.save(&args).await.map(ToolOutput::SavePage)
            }
            ToolInvocation::PutAsset(upload) => {
                let assets = self.assets.as_ref().ok_or_else(|| ToolError::NotConfigured {
                    tool_name: ToolKind::PutAsset.name().into(),
                    reason: "object store not configured".into(),
                })?;
                assets.put(&upload).await.map(ToolOutput::PutAsset)
            }
            ToolInvocation::Notify(args) => Ok(ToolOutput::Notify(self.notifier.notify(&args).await)),
            ToolInvocation::TriggerFlow(args) => {
                self.flows.trigger(&args).await.map(ToolOutput::TriggerFlow)
            }
        }
    }
}

#[async_trait]
impl ToolBridge for ToolRegistry {
    fn name(&self) -> &str {
        "embedded"
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let start = Instant::now();
        let invocation = ToolInvocation::parse(call)?;
        let kind = invocation.kind();

        let outcome = self.execute(invocation).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                debug!(tool = %kind, duration_ms, "Tool executed");
                output.into_result()
            }
            Err(e) => {
                warn!(tool = %kind, duration_ms, error = %e, "Tool failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::{BucketLocation, InMemoryAssetStore};
    use crate::pages::InMemoryPageStore;
    use serde_json::json;
    use std::sync::Mutex;
    use vibeforge_core::tool::{
        NotifyArgs, NotifyOutput, SearchTemplatesArgs, SearchTemplatesOutput, TemplateMatch,
        TriggerFlowArgs, TriggerFlowOutput,
    };

    pub struct StaticTemplates;

    #[async_trait]
    impl TemplateSearch for StaticTemplates {
        async fn search(&self, args: &SearchTemplatesArgs) -> Result<SearchTemplatesOutput, ToolError> {
            Ok(SearchTemplatesOutput {
                matches: vec![TemplateMatch {
                    id: json!(1),
                    score: 0.9,
                    payload: json!({"query": args.query}),
                }],
            })
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, args: &NotifyArgs) -> NotifyOutput {
            self.sent.lock().unwrap().push(args.message.clone());
            NotifyOutput::delivered("ok")
        }
    }

    pub struct EchoFlows;

    #[async_trait]
    impl FlowTrigger for EchoFlows {
        async fn trigger(&self, args: &TriggerFlowArgs) -> Result<TriggerFlowOutput, ToolError> {
            Ok(TriggerFlowOutput {
                status: 200,
                text: args.url.clone(),
            })
        }
    }

    /// A registry with every backend in memory.
    pub fn local_registry() -> (ToolRegistry, InMemoryPageStore, Arc<RecordingNotifier>) {
        let pages = InMemoryPageStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = ToolRegistry::new(Arc::new(StaticTemplates), notifier.clone(), Arc::new(EchoFlows))
            .with_pages(Arc::new(pages.clone()))
            .with_assets(Arc::new(InMemoryAssetStore::new(BucketLocation::from_config(
                &vibeforge_config::ObjectStoreConfig::default(),
            ))));
        (registry, pages, notifier)
    }

    #[tokio::test]
    async fn every_tool_kind_has_a_working_handler() {
        let (registry, _, _) = local_registry();
        let calls = [
            ToolCall::new("search_templates", json!({"query": "hero"})),
            ToolCall::new("save_page", json!({"subdomain": "luigis", "ast": {"a": 1}})),
            ToolCall::new("put_asset", json!({"key": "k.txt", "content": "aGk=", "contentType": "text/plain"})),
            ToolCall::new("notify", json!({"message": "hi"})),
            ToolCall::new("trigger_flow", json!({"url": "https://flows.example.com"})),
        ];
        for (call, kind) in calls.iter().zip(ToolKind::ALL) {
            let result = registry.dispatch(call).await.unwrap();
            assert_eq!(result.name, kind.name());
        }
    }

    #[tokio::test]
    async fn save_page_result_shape() {
        let (registry, pages, _) = local_registry();
        let result = registry
            .dispatch(&ToolCall::new(
                "save_page",
                json!({"subdomain": "luigis", "ast": {"hero": {"title": "Luigi's"}}}),
            ))
            .await
            .unwrap();

        assert_eq!(result.output, json!({"ok": true, "subdomain": "luigis", "path": "/"}));
        assert!(pages.load("luigis", "/").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_database_is_reported() {
        let registry = ToolRegistry::new(
            Arc::new(StaticTemplates),
            Arc::new(RecordingNotifier::default()),
            Arc::new(EchoFlows),
        );
        let err = registry
            .dispatch(&ToolCall::new("save_page", json!({"subdomain": "s", "ast": {}})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DB not configured"));
        assert!(matches!(err, ToolError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_backends() {
        let (registry, _, notifier) = local_registry();
        let err = registry
            .dispatch(&ToolCall::new("notify", json!({"message": "   "})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let (registry, _, _) = local_registry();
        let err = registry
            .dispatch(&ToolCall::new("drop_tables", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: drop_tables");
    }

    #[test]
    fn availability_reflects_optional_backends() {
        let bare = ToolRegistry::new(
            Arc::new(StaticTemplates),
            Arc::new(RecordingNotifier::default()),
            Arc::new(EchoFlows),
        );
        let unavailable: Vec<ToolKind> = bare
            .availability()
            .into_iter()
            .filter(|(_, ready)| !ready)
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(unavailable, vec![ToolKind::SavePage, ToolKind::PutAsset]);
    }
}

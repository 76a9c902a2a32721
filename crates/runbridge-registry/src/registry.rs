//! Start-up discovery and the immutable name → tool map built from it.

use crate::app_tool::AppTool;
use runbridge_client::AppService;
use runbridge_core::{
    BridgeConfig, Error, InvocationContext, Result, Tool, ToolDefinition, ToolDescriptor,
    ToolOutput,
};
use runbridge_engine::ExecutionEngine;
use runbridge_schema::{MAX_NAME_LEN, SchemaNormalizer};
use runbridge_telemetry::trace_discovery;
use runbridge_unify::ResponseUnifier;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A descriptor that could not be registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTool {
    pub tool: String,
    pub reason: String,
}

/// A tool whose sanitized name was already taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedTool {
    pub raw_name: String,
    pub sanitized: String,
    pub assigned: String,
}

/// What discovery did with each listed record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub listed: usize,
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedTool>,
    pub renamed: Vec<RenamedTool>,
}

/// Read-only registry of invocable tools, keyed by sanitized name.
///
/// Built once by [`RegistryBuilder`]; cloning shares the same map.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Definitions in name order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| tool.definition().clone())
            .collect()
    }

    /// Invoke a tool by name. Never fails: unknown tools and non-object
    /// arguments come back as error output.
    pub async fn invoke(&self, name: &str, params: Value, ctx: InvocationContext) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Call for unknown tool");
            return ToolOutput::error(format!("Unknown tool '{}'", name));
        };

        let params = match params {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return ToolOutput::error(format!(
                    "Tool '{}' failed during validation: arguments must be an object, got {}",
                    name,
                    json_kind(&other)
                ));
            }
        };

        tool.invoke(ctx, params).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Assembles a [`ToolRegistry`] from remote descriptors.
pub struct RegistryBuilder {
    engine: ExecutionEngine,
    normalizer: SchemaNormalizer,
    unifier: Arc<ResponseUnifier>,
    describe_missing_schemas: bool,
    tools: BTreeMap<String, Arc<dyn Tool>>,
    report: DiscoveryReport,
}

impl RegistryBuilder {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self {
            engine,
            normalizer: SchemaNormalizer::default(),
            unifier: Arc::new(ResponseUnifier::default()),
            describe_missing_schemas: true,
            tools: BTreeMap::new(),
            report: DiscoveryReport::default(),
        }
    }

    pub fn from_config(engine: ExecutionEngine, config: &BridgeConfig) -> Self {
        Self::new(engine)
            .with_normalizer(SchemaNormalizer::from_config(&config.schema))
            .describe_missing_schemas(config.service.describe_missing_schemas)
    }

    pub fn with_normalizer(mut self, normalizer: SchemaNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_unifier(mut self, unifier: ResponseUnifier) -> Self {
        self.unifier = Arc::new(unifier);
        self
    }

    /// Fetch the full descriptor for listed records that carry no schema
    pub fn describe_missing_schemas(mut self, enabled: bool) -> Self {
        self.describe_missing_schemas = enabled;
        self
    }

    /// Normalize and register one descriptor. Returns the name it was
    /// registered under, which differs from the sanitized name on collision.
    pub fn add_descriptor(&mut self, descriptor: &ToolDescriptor) -> String {
        let mut definition = self.normalizer.normalize(descriptor);
        let sanitized = definition.name.clone();
        let assigned = self.unique_name(&sanitized);

        if assigned != sanitized {
            warn!(
                raw = %descriptor.name,
                sanitized = %sanitized,
                assigned = %assigned,
                "Tool name collision, registering under a suffixed name"
            );
            self.report.renamed.push(RenamedTool {
                raw_name: descriptor.name.clone(),
                sanitized,
                assigned: assigned.clone(),
            });
        }
        definition.name = assigned.clone();

        let tool = AppTool::new(
            definition,
            descriptor.remote_id(),
            self.engine.clone(),
            self.unifier.clone(),
        );
        self.tools.insert(assigned.clone(), Arc::new(tool));
        self.report.registered.push(assigned.clone());
        assigned
    }

    /// `base`, or `base_2`, `base_3`, ... trimmed to the name length limit
    fn unique_name(&self, base: &str) -> String {
        if !self.tools.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| {
                let suffix = format!("_{}", n);
                let keep = MAX_NAME_LEN.saturating_sub(suffix.len()).min(base.len());
                format!("{}{}", &base[..keep], suffix)
            })
            .find(|candidate| !self.tools.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn skip(&mut self, error: Error) {
        warn!(error = %error, "Skipping tool");
        let skipped = match error {
            Error::Discovery { tool, reason } => SkippedTool { tool, reason },
            other => SkippedTool {
                tool: String::new(),
                reason: other.to_string(),
            },
        };
        self.report.skipped.push(skipped);
    }

    /// List every remote tool and register what can be registered.
    ///
    /// A failed listing is fatal. A record that cannot be parsed or described
    /// is skipped and reported; the rest still register.
    #[instrument(skip(self))]
    pub async fn discover(mut self) -> Result<(ToolRegistry, DiscoveryReport)> {
        let service = self.engine.service().clone();
        let records = service.list_tools().await?;
        self.report.listed = records.len();

        for (index, record) in records.into_iter().enumerate() {
            let label = record_label(&record, index);

            let mut descriptor = match serde_json::from_value::<ToolDescriptor>(record) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    self.skip(Error::discovery(label, format!("unparsable descriptor: {}", e)));
                    continue;
                }
            };

            if self.describe_missing_schemas && descriptor.input_schema.is_none() {
                match describe(service.as_ref(), &descriptor, &label).await {
                    Ok(detailed) => merge_descriptor(&mut descriptor, detailed),
                    Err(e) => {
                        self.skip(e);
                        continue;
                    }
                }
            }

            let name = self.add_descriptor(&descriptor);
            debug!(tool = %name, remote_id = %descriptor.remote_id(), "Registered tool");
        }

        let (registry, report) = self.build();
        trace_discovery(report.listed, report.registered.len(), report.skipped.len());
        info!(
            listed = report.listed,
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            renamed = report.renamed.len(),
            "Tool discovery finished"
        );
        Ok((registry, report))
    }

    pub fn build(self) -> (ToolRegistry, DiscoveryReport) {
        (
            ToolRegistry {
                tools: Arc::new(self.tools),
            },
            self.report,
        )
    }
}

async fn describe(
    service: &dyn AppService,
    descriptor: &ToolDescriptor,
    label: &str,
) -> Result<ToolDescriptor> {
    let value = service
        .describe_tool(descriptor.remote_id())
        .await
        .map_err(|e| Error::discovery(label, format!("describe failed: {}", e)))?;
    serde_json::from_value(value)
        .map_err(|e| Error::discovery(label, format!("unparsable full descriptor: {}", e)))
}

/// Fill gaps in the listed descriptor from the full one
fn merge_descriptor(listed: &mut ToolDescriptor, detailed: ToolDescriptor) {
    if listed.input_schema.is_none() {
        listed.input_schema = detailed.input_schema;
    }
    if listed.description.is_none() {
        listed.description = detailed.description;
    }
    if listed.id.is_none() {
        listed.id = detailed.id;
    }
}

fn record_label(record: &Value, index: usize) -> String {
    record
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("record #{}", index))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Mock resolution gateway for testing and offline runs

use crate::error::GatewayError;
use crate::ResolutionGateway;
use async_trait::async_trait;
use bioresolve_core::{EntityName, EntityResolution, EntityTypeHint, ResolutionContext};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Callback invoked at the start of every call, before any scripted delay
pub type CallHook = Arc<dyn Fn(&EntityName, &ResolutionContext) + Send + Sync>;

/// How a scripted entity behaves
#[derive(Debug, Clone)]
enum Script {
    /// Fails in every phase
    Fail(String),
    /// Fails in the initial phase, resolves during deep search
    FailInitially(String),
    /// Resolves with backend-reported issues in the initial phase
    Partial(String),
}

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub entity: EntityName,
    pub deep_search: bool,
}

/// Deterministic gateway that synthesizes resolutions from the entity name.
///
/// Unscripted entities always resolve cleanly. Failures, partial answers and
/// per-entity latency can be scripted with the builder methods.
#[derive(Default)]
pub struct MockResolutionGateway {
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    requires_credential: bool,
    has_credential: bool,
    hook: Option<CallHook>,
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockResolutionGateway {
    pub fn new() -> Self {
        Self {
            has_credential: true,
            ..Default::default()
        }
    }

    /// Make `entity` fail with `message` in every phase
    pub fn with_failure(mut self, entity: &str, message: &str) -> Self {
        self.scripts
            .insert(entity.to_string(), Script::Fail(message.to_string()));
        self
    }

    /// Make `entity` fail initially but resolve during deep search
    pub fn with_initial_failure(mut self, entity: &str, message: &str) -> Self {
        self.scripts.insert(
            entity.to_string(),
            Script::FailInitially(message.to_string()),
        );
        self
    }

    /// Make `entity` resolve with reported issues unless deep searching
    pub fn with_partial(mut self, entity: &str, issues: &str) -> Self {
        self.scripts
            .insert(entity.to_string(), Script::Partial(issues.to_string()));
        self
    }

    /// Delay the response for `entity`
    pub fn with_delay(mut self, entity: &str, delay: Duration) -> Self {
        self.delays.insert(entity.to_string(), delay);
        self
    }

    /// Behave like a paid provider with or without a configured key
    pub fn with_credential(mut self, present: bool) -> Self {
        self.requires_credential = true;
        self.has_credential = present;
        self
    }

    /// Run `hook` at the start of every call
    pub fn with_call_hook(mut self, hook: CallHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Calls in the order they were started
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of calls that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn synthesize(entity: &EntityName, context: &ResolutionContext) -> EntityResolution {
        let name = entity.as_str();
        let entity_type = match context.type_hint {
            EntityTypeHint::Auto => "unknown".to_string(),
            hint => hint.to_string(),
        };
        let mock_id = format!("MOCK:{}", name.to_uppercase().replace(' ', "_"));
        let (ontology_id, ontology_term) = if context.ontology_enabled {
            (
                format!("{}:0000000", context.ontology.as_deref().unwrap_or("GO")),
                format!("{name} activity"),
            )
        } else {
            (String::new(), String::new())
        };

        EntityResolution {
            corrected_name: name.to_string(),
            resolved_name: format!("{name} (mock)"),
            entity_type,
            synonyms: vec![name.to_lowercase()],
            pathways: Vec::new(),
            function: format!("Mock function of {name}"),
            cellular_component: String::new(),
            ontology_id,
            ontology_term,
            identifiers: BTreeMap::from([("Mock".to_string(), mock_id.clone())]),
            links: BTreeMap::from([(
                "Mock".to_string(),
                format!("https://example.org/mock/{mock_id}"),
            )]),
            validation_issues: None,
        }
    }

    fn respond(
        &self,
        entity: &EntityName,
        context: &ResolutionContext,
    ) -> Result<EntityResolution, GatewayError> {
        match self.scripts.get(entity.as_str()) {
            Some(Script::Fail(message)) => Err(GatewayError::MalformedResponse(message.clone())),
            Some(Script::FailInitially(message)) if !context.deep_search => {
                Err(GatewayError::MalformedResponse(message.clone()))
            }
            Some(Script::Partial(issues)) if !context.deep_search => Ok(EntityResolution {
                validation_issues: Some(issues.clone()),
                ..Self::synthesize(entity, context)
            }),
            _ => Ok(Self::synthesize(entity, context)),
        }
    }
}

/// Decrements the in-flight counter even if the call future is dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResolutionGateway for MockResolutionGateway {
    async fn resolve_entity(
        &self,
        entity: &EntityName,
        context: &ResolutionContext,
    ) -> Result<EntityResolution, GatewayError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall {
                entity: entity.clone(),
                deep_search: context.deep_search,
            });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if let Some(hook) = &self.hook {
            hook(entity, context);
        }

        if let Some(delay) = self.delays.get(entity.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        self.respond(entity, context)
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn requires_credential(&self) -> bool {
        self.requires_credential
    }

    fn has_credential(&self) -> bool {
        self.has_credential
    }
}

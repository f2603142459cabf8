//! Resolver task: one gateway call for one entity

use crate::types::ResolutionOutcome;
use bioresolve_core::{EntityName, ResolutionContext};
use bioresolve_gateway::ResolutionGateway;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Resolve one entity and time the call.
///
/// Never fails: gateway errors and timeouts become a failed outcome so a
/// single entity cannot abort its window.
pub(crate) async fn resolve_entity_task(
    gateway: &dyn ResolutionGateway,
    entity: EntityName,
    context: &ResolutionContext,
    timeout: Option<Duration>,
) -> ResolutionOutcome {
    let start = Instant::now();

    let call = gateway.resolve_entity(&entity, context);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!(
                "Resolution timed out after {:.1}s",
                limit.as_secs_f64()
            )),
        },
        None => call.await.map_err(|e| e.to_string()),
    };

    let elapsed_seconds = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => debug!(entity = %entity, elapsed_seconds, "Entity resolved"),
        Err(message) => warn!(entity = %entity, elapsed_seconds, "Entity failed: {message}"),
    }

    ResolutionOutcome {
        input_entity: entity,
        result,
        elapsed_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioresolve_gateway::MockResolutionGateway;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_timed() {
        let gateway = MockResolutionGateway::new().with_delay("TP53", Duration::from_secs(2));
        let outcome = resolve_entity_task(
            &gateway,
            name("TP53"),
            &ResolutionContext::default(),
            None,
        )
        .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.input_entity, name("TP53"));
        assert!((outcome.elapsed_seconds - 2.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_timed_and_captured() {
        let gateway = MockResolutionGateway::new()
            .with_failure("??", "HTTP 500")
            .with_delay("??", Duration::from_millis(500));
        let outcome =
            resolve_entity_task(&gateway, name("??"), &ResolutionContext::default(), None).await;

        assert!(!outcome.is_success());
        assert!(outcome.error_message().unwrap().contains("HTTP 500"));
        assert!((outcome.elapsed_seconds - 0.5).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let gateway = MockResolutionGateway::new().with_delay("slow", Duration::from_secs(30));
        let outcome = resolve_entity_task(
            &gateway,
            name("slow"),
            &ResolutionContext::default(),
            Some(Duration::from_secs(5)),
        )
        .await;

        assert_eq!(
            outcome.error_message(),
            Some("Resolution timed out after 5.0s")
        );
        assert!((outcome.elapsed_seconds - 5.0).abs() < 0.01);
    }
}

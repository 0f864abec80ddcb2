//! Built-in tools for crisis support, guided flows, values, empathy,
//! future self, dialogue practice, parent support, and trigger routing.

pub mod crisis;
pub mod dialogue;
pub mod empathy;
pub mod flows;
pub mod future_self;
pub mod parenting;
pub mod routing;
pub mod session;
pub mod values;

use std::sync::Arc;
use std::time::Duration;

use crate::events::EventLog;
use crate::flows::catalog::all_flows;
use crate::llm::LlmProvider;
use crate::routing::TriggerRouter;
use crate::synthesis::Synthesizer;
use crate::tools::registry::ToolRegistry;
use crate::triage::{CrisisClassifier, Intervention};

/// Collaborators shared by the built-in tools.
#[derive(Clone)]
pub struct ToolDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub events: EventLog,
    pub router: Arc<TriggerRouter>,
    /// Budget for each generative call.
    pub llm_timeout: Duration,
}

/// Register every built-in tool.
pub fn register_builtin_tools(registry: &ToolRegistry, deps: &ToolDeps) {
    let synthesizer = Arc::new(Synthesizer::new(deps.llm.clone(), deps.llm_timeout));
    let classifier = Arc::new(
        CrisisClassifier::new(deps.llm.clone(), deps.llm_timeout).with_event_log(deps.events.clone()),
    );

    registry.register_sync(Arc::new(crisis::CrisisDetectionTool::new(classifier)));
    registry.register_sync(Arc::new(crisis::SosTriageTool));
    for kind in Intervention::ALL {
        registry.register_sync(Arc::new(crisis::InterventionTool::new(kind)));
    }

    registry.register_sync(Arc::new(routing::SuggestToolTool::new(deps.router.clone())));

    registry.register_sync(Arc::new(session::SaveSessionTool::new(deps.events.clone())));
    registry.register_sync(Arc::new(session::AnalyticsTool::new(deps.events.clone())));

    for flow in all_flows() {
        registry.register_sync(Arc::new(flows::FlowTool::new(
            flow,
            synthesizer.clone(),
            deps.events.clone(),
        )));
    }

    registry.register_sync(Arc::new(values::ValuesAnalysisTool::new(synthesizer.clone())));
    registry.register_sync(Arc::new(values::CompassCreationTool::new(
        synthesizer.clone(),
        deps.events.clone(),
    )));
    registry.register_sync(Arc::new(values::CompassCheckTool::new(synthesizer.clone())));

    registry.register_sync(Arc::new(empathy::EmpathySetupTool::new(deps.events.clone())));
    registry.register_sync(Arc::new(empathy::EmpathySynthesisTool::new(
        synthesizer.clone(),
        deps.events.clone(),
    )));
    registry.register_sync(Arc::new(empathy::EmpathyStrategyTool::new(synthesizer.clone())));

    registry.register_sync(Arc::new(future_self::FutureSelfGenerationTool::new(
        synthesizer.clone(),
        deps.events.clone(),
    )));
    registry.register_sync(Arc::new(future_self::FutureSelfExperienceTool));
    registry.register_sync(Arc::new(future_self::FutureSelfIntegrationTool::new(
        synthesizer.clone(),
        deps.events.clone(),
    )));

    registry.register_sync(Arc::new(dialogue::DialogueScenariosTool));
    registry.register_sync(Arc::new(dialogue::DialoguePersonaTool::new(synthesizer.clone())));
    registry.register_sync(Arc::new(dialogue::DialogueCoachTool::new(synthesizer.clone())));
    registry.register_sync(Arc::new(dialogue::DialogueAnalysisTool::new(synthesizer.clone())));

    registry.register_sync(Arc::new(parenting::BehavioralWeatherTool));
    registry.register_sync(Arc::new(parenting::EmpathyGymTool::new(synthesizer)));

    tracing::info!(count = registry.count(), "Built-in tools registered");
}

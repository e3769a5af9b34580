//! Application process creation

use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::PublisherError;
use crate::http::api::DeployApi;

const INSTALL_STEP: &str = "Install Components";
const FINISH_STEP: &str = "FINISH";

/// Description given to processes this tool creates
pub const PROCESS_DESCRIPTION: &str = "Created by ucdpub";

/// Build the step graph for an application process that installs every
/// changed component with `component_process`, then finishes.
pub fn process_graph(
    application: &str,
    process: &str,
    description: &str,
    component_process: &str,
) -> Value {
    let component_step = json!({
        "type": "componentProcess",
        "name": process,
        "componentProcessName": component_process,
        "activity.componentProcess.name": component_process,
        "allowFailure": "false",
        "children": {}
    });

    let version_diff = json!({
        "type": "inventoryVersionDiff",
        "status": "Active",
        "name": step_id(),
        "children": [component_step]
    });

    let environment_iterator = json!({
        "type": "componentEnvironmentIterator",
        "name": step_id(),
        "tagId": "",
        "runOnlyOnFirst": "false",
        "children": [version_diff]
    });

    let install_step = json!({
        "name": INSTALL_STEP,
        "componentProcessName": component_process,
        "activity.componentProcess.name": component_process,
        "type": "multiComponentEnvironmentIterator",
        "failFast": "false",
        "runOnlyOnFirst": "false",
        "preconditionScript": "",
        "maxIteration": "-1",
        "children": [environment_iterator]
    });

    json!({
        "name": process,
        "application": application,
        "description": description,
        "inventoryManagementType": "AUTOMATIC",
        "offlineAgentHandling": "PRE_EXECUTION_CHECK",
        "rootActivity": {
            "type": "graph",
            "name": "GRAPH",
            "children": [
                { "type": "finish", "name": FINISH_STEP },
                install_step
            ],
            "edges": [
                { "to": INSTALL_STEP, "type": "ALWAYS", "value": "" },
                { "to": FINISH_STEP, "from": INSTALL_STEP, "type": "ALWAYS", "value": "" }
            ],
            "offsets": [
                { "name": INSTALL_STEP, "x": "-21", "y": "191", "h": "50", "w": "330" },
                { "name": FINISH_STEP, "x": "-5", "y": "420", "h": "50", "w": "90" }
            ]
        }
    })
}

fn step_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Create the application process unless it already exists.
///
/// Returns the new process id, or `None` when an existing process was kept.
pub async fn ensure_process(
    api: &dyn DeployApi,
    application: &str,
    process: &str,
    component_process: &str,
) -> Result<Option<Uuid>, PublisherError> {
    info!(
        "Checking the server for existing application process '{}'",
        process
    );
    if api.get_application_process(application, process).await?.is_some() {
        info!("Application process '{}' already exists", process);
        return Ok(None);
    }

    info!("Creating application process '{}'", process);
    let graph = process_graph(application, process, PROCESS_DESCRIPTION, component_process);
    let id = api.create_application_process(&graph).await?;
    info!("Created application process '{}' with id {}", process, id);
    Ok(Some(id))
}

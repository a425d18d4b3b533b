// Scripted workflow scenarios, run against in-memory collaborators
//
// A scenario file declares actors, seeds the ledger and lists steps. Each step
// records its outcome; a workflow error is an outcome, not a scenario failure.
// Malformed scenarios (unknown actor or label, missing fields) fail with anyhow.

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Instrument};

use crate::collaborators::{BatchRef, InMemoryAuditLog, InMemoryStockLedger};
use crate::config::WorkflowConfig;
use crate::observability::OperationTimer;
use crate::priority::Priority;
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflows::{
    Actor, BranchId, BranchScope, Decision, DispatchReceipt, FixedCodes, LineItem, ProductId,
    RequestId, Role, WorkflowError, WorkflowService,
};

const KEEPER_CODE_REF: &str = "$keeper";
const CONTROLLER_CODE_REF: &str = "$controller";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Overrides the configured workflow rules for this run
    #[serde(default)]
    pub workflow: Option<WorkflowConfig>,
    /// Keeper/controller code pairs handed out to dispatches in order
    #[serde(default)]
    pub codes: Vec<(String, String)>,
    #[serde(default)]
    pub actors: BTreeMap<String, ActorSpec>,
    #[serde(default)]
    pub stock: Vec<StockSeed>,
    #[serde(default, rename = "step")]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActorSpec {
    pub role: Role,
    /// Branches the actor may act on; empty means every branch
    #[serde(default)]
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockSeed {
    pub branch: String,
    pub product: String,
    #[serde(default)]
    pub batch: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub quarantined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    SubmitRequisition,
    DecideRequisition,
    DispatchTransfer,
    ConfirmKeeperReceipt,
    ConfirmControllerVerification,
    CancelTransfer,
    RequestRelease,
    AuthorizeRelease,
    RequestDisposal,
    AuthorizeDisposal,
    ExpireTransfers,
    RedeliverLedger,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepAction::SubmitRequisition => "submit_requisition",
            StepAction::DecideRequisition => "decide_requisition",
            StepAction::DispatchTransfer => "dispatch_transfer",
            StepAction::ConfirmKeeperReceipt => "confirm_keeper_receipt",
            StepAction::ConfirmControllerVerification => "confirm_controller_verification",
            StepAction::CancelTransfer => "cancel_transfer",
            StepAction::RequestRelease => "request_release",
            StepAction::AuthorizeRelease => "authorize_release",
            StepAction::RequestDisposal => "request_disposal",
            StepAction::AuthorizeDisposal => "authorize_disposal",
            StepAction::ExpireTransfers => "expire_transfers",
            StepAction::RedeliverLedger => "redeliver_ledger",
        };
        f.write_str(label)
    }
}

/// One scripted call. Which fields are required depends on `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioStep {
    pub action: StepAction,
    #[serde(default)]
    pub actor: Option<String>,
    /// Name for the request this step creates
    #[serde(default)]
    pub label: Option<String>,
    /// Label of the request this step acts on
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Literal code, or `$keeper` / `$controller` for the codes issued at dispatch
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub after_hours: Option<i64>,
    /// Expected error kind (e.g. `code_mismatch`), or `ok`
    #[serde(default)]
    pub expect: Option<String>,
}

impl ScenarioStep {
    fn required<'a>(&self, field: &'a Option<String>, name: &str) -> Result<&'a str> {
        field
            .as_deref()
            .ok_or_else(|| anyhow!("step {} requires `{}`", self.action, name))
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub index: usize,
    pub action: StepAction,
    pub result: std::result::Result<String, WorkflowError>,
    pub expected: Option<String>,
}

impl StepOutcome {
    /// Whether the step ended the way the scenario said it would.
    /// Without an expectation the step is expected to succeed.
    pub fn met_expectation(&self) -> bool {
        match (&self.expected, &self.result) {
            (None, Ok(_)) => true,
            (None, Err(_)) => false,
            (Some(expected), Ok(_)) => expected == "ok",
            (Some(expected), Err(err)) => expected == err.kind(),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.met_expectation() { "ok" } else { "UNEXPECTED" };
        match &self.result {
            Ok(summary) => write!(f, "[{}] {} -> {} ({})", self.index, self.action, summary, mark),
            Err(err) => write!(
                f,
                "[{}] {} -> error {}: {} ({})",
                self.index,
                self.action,
                err.kind(),
                err,
                mark
            ),
        }
    }
}

/// Everything a finished scenario leaves behind
pub struct ScenarioRun {
    pub service: WorkflowService,
    pub ledger: Arc<InMemoryStockLedger>,
    pub audit: Arc<InMemoryAuditLog>,
    pub outcomes: Vec<StepOutcome>,
}

impl ScenarioRun {
    pub fn all_expectations_met(&self) -> bool {
        self.outcomes.iter().all(StepOutcome::met_expectation)
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parse scenario {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        Ok(scenario)
    }

    /// Run every step in order. `defaults` applies unless the scenario carries
    /// its own `[workflow]` table.
    pub async fn run(&self, defaults: &WorkflowConfig) -> Result<ScenarioRun> {
        let settings = match &self.workflow {
            Some(overrides) => {
                overrides.validate().context("scenario [workflow] table")?;
                overrides.clone()
            }
            None => defaults.clone(),
        };
        let ledger = Arc::new(InMemoryStockLedger::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let codes = Arc::new(FixedCodes::new(self.codes.iter().cloned()));
        let service = WorkflowService::new(settings, ledger.clone(), audit.clone())
            .with_code_generator(codes);

        for seed in &self.stock {
            ledger.seed(
                BatchRef {
                    branch_id: BranchId::new(seed.branch.as_str()),
                    product_id: ProductId::from(seed.product.as_str()),
                    batch_number: seed.batch.clone(),
                },
                seed.quantity,
                seed.quarantined,
            );
        }

        let name = self.name.as_deref().unwrap_or("scenario");
        let span = create_workflow_span("run_scenario", name, None, &generate_correlation_id());
        let timer = OperationTimer::new("run_scenario");

        let outcomes = async {
            let mut runner = Runner {
                scenario: self,
                service: &service,
                requests: HashMap::new(),
                receipts: HashMap::new(),
            };
            let mut outcomes = Vec::with_capacity(self.steps.len());
            for (index, step) in self.steps.iter().enumerate() {
                let result = runner
                    .step(step)
                    .await
                    .with_context(|| format!("step {} ({})", index, step.action))?;
                let outcome = StepOutcome {
                    index,
                    action: step.action,
                    result,
                    expected: step.expect.clone(),
                };
                info!(step = index, action = %step.action, met = outcome.met_expectation(), "Scenario step finished");
                outcomes.push(outcome);
            }
            Ok::<_, anyhow::Error>(outcomes)
        }
        .instrument(span)
        .await?;
        timer.finish();

        Ok(ScenarioRun {
            service,
            ledger,
            audit,
            outcomes,
        })
    }
}

struct Runner<'a> {
    scenario: &'a Scenario,
    service: &'a WorkflowService,
    requests: HashMap<String, RequestId>,
    receipts: HashMap<String, DispatchReceipt>,
}

type StepResult = std::result::Result<String, WorkflowError>;

impl Runner<'_> {
    async fn step(&mut self, step: &ScenarioStep) -> Result<StepResult> {
        let service = self.service;
        let result = match step.action {
            StepAction::SubmitRequisition => {
                let actor = self.actor(step)?;
                let branch = BranchId::new(step.required(&step.branch, "branch")?);
                let priority = step.priority.unwrap_or_default();
                service
                    .submit_requisition(&actor, branch, step.items.clone(), priority)
                    .await
                    .map(|r| {
                        self.remember(step, r.id);
                        format!("requisition {} {} {}", r.id, r.priority, r.status)
                    })
            }
            StepAction::DecideRequisition => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                let decision = step
                    .decision
                    .ok_or_else(|| anyhow!("step {} requires `decision`", step.action))?;
                service
                    .decide_requisition(&actor, id, decision)
                    .await
                    .map(|r| format!("requisition {} {}", r.id, r.status))
            }
            StepAction::DispatchTransfer => {
                let actor = self.actor(step)?;
                let source = BranchId::new(step.required(&step.source, "source")?);
                let target = BranchId::new(step.required(&step.target, "target")?);
                match service
                    .dispatch_transfer(&actor, source, target, step.items.clone())
                    .await
                {
                    Ok(receipt) => {
                        let id = receipt.transfer_id;
                        self.remember(step, id);
                        if let Some(label) = &step.label {
                            self.receipts.insert(label.clone(), receipt);
                        }
                        Ok(format!("transfer {} DISPATCHED", id))
                    }
                    Err(err) => Err(err),
                }
            }
            StepAction::ConfirmKeeperReceipt => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                let code = self.code(step)?;
                service
                    .confirm_keeper_receipt(&actor, id, &code)
                    .await
                    .map(|t| format!("transfer {} {}", t.id, t.status))
            }
            StepAction::ConfirmControllerVerification => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                let code = self.code(step)?;
                service
                    .confirm_controller_verification(&actor, id, &code)
                    .await
                    .map(|t| format!("transfer {} {}", t.id, t.status))
            }
            StepAction::CancelTransfer => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                service
                    .cancel_transfer(&actor, id, step.reason.as_deref())
                    .await
                    .map(|t| format!("transfer {} {}", t.id, t.status))
            }
            StepAction::RequestRelease => {
                let actor = self.actor(step)?;
                let branch = BranchId::new(step.required(&step.branch, "branch")?);
                service
                    .request_release(&actor, branch, step.items.clone())
                    .await
                    .map(|r| {
                        self.remember(step, r.id);
                        format!("release {} {}", r.id, r.status)
                    })
            }
            StepAction::AuthorizeRelease => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                service
                    .authorize_release(&actor, id)
                    .await
                    .map(|r| format!("release {} {}", r.id, r.status))
            }
            StepAction::RequestDisposal => {
                let actor = self.actor(step)?;
                let branch = BranchId::new(step.required(&step.branch, "branch")?);
                service
                    .request_disposal(&actor, branch, step.items.clone(), step.reason.as_deref())
                    .await
                    .map(|d| {
                        self.remember(step, d.id);
                        format!("disposal {} {}", d.id, d.status)
                    })
            }
            StepAction::AuthorizeDisposal => {
                let actor = self.actor(step)?;
                let id = self.request(step)?;
                service
                    .authorize_disposal(&actor, id)
                    .await
                    .map(|d| format!("disposal {} {}", d.id, d.status))
            }
            StepAction::ExpireTransfers => {
                let hours = step.after_hours.unwrap_or(0);
                let at = Duration::try_hours(hours)
                    .and_then(|offset| Utc::now().checked_add_signed(offset))
                    .ok_or_else(|| anyhow!("after_hours {} out of range", hours))?;
                let expired = service.expire_stale_transfers(at).await;
                Ok(format!("{} transfer(s) expired", expired.len()))
            }
            StepAction::RedeliverLedger => {
                let report = service.redeliver_ledger_notifications().await;
                Ok(format!(
                    "{} redelivered, {} still pending",
                    report.delivered, report.still_pending
                ))
            }
        };
        Ok(result)
    }

    fn actor(&self, step: &ScenarioStep) -> Result<Actor> {
        let name = step.required(&step.actor, "actor")?;
        let declared = self
            .scenario
            .actors
            .get(name)
            .ok_or_else(|| anyhow!("unknown actor {:?}", name))?;
        let scope = if declared.branches.is_empty() {
            BranchScope::All
        } else {
            BranchScope::Branches(declared.branches.iter().map(|b| BranchId::new(b.as_str())).collect())
        };
        Ok(Actor::new(name, declared.role, scope))
    }

    fn request(&self, step: &ScenarioStep) -> Result<RequestId> {
        let label = step.required(&step.request, "request")?;
        self.requests
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("no request labelled {:?} has been created", label))
    }

    fn code(&self, step: &ScenarioStep) -> Result<String> {
        let code = step.required(&step.code, "code")?;
        if code != KEEPER_CODE_REF && code != CONTROLLER_CODE_REF {
            return Ok(code.to_string());
        }
        let label = step.required(&step.request, "request")?;
        let receipt = self
            .receipts
            .get(label)
            .ok_or_else(|| anyhow!("no dispatch receipt for {:?}", label))?;
        let code = if code == KEEPER_CODE_REF {
            &receipt.keeper_code
        } else {
            &receipt.controller_code
        };
        Ok(code.as_str().to_string())
    }

    fn remember(&mut self, step: &ScenarioStep, id: RequestId) {
        if let Some(label) = &step.label {
            self.requests.insert(label.clone(), id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::{RequisitionStatus, TransferStatus};

    const TRANSFER_SCENARIO: &str = r#"
name = "hq-to-br001"
codes = [["228899", "554411"]]

[actors.hq-manager]
role = "branch_manager"
branches = ["HQ"]

[actors.br1-keeper]
role = "keeper"
branches = ["BR001"]

[actors.br1-controller]
role = "controller"
branches = ["BR001"]

[[stock]]
branch = "HQ"
product = "2"
batch = "AMX-01"
quantity = 100

[[step]]
action = "dispatch_transfer"
actor = "hq-manager"
label = "t1"
source = "HQ"
target = "BR001"
items = [{ product_id = "2", product_name = "Amoxicillin 250mg", quantity = 30, batch_number = "AMX-01" }]

[[step]]
action = "confirm_keeper_receipt"
actor = "br1-keeper"
request = "t1"
code = "554411"
expect = "code_mismatch"

[[step]]
action = "confirm_keeper_receipt"
actor = "br1-keeper"
request = "t1"
code = "$keeper"

[[step]]
action = "confirm_controller_verification"
actor = "br1-controller"
request = "t1"
code = "$controller"
"#;

    fn amx(branch: &str) -> BatchRef {
        BatchRef {
            branch_id: BranchId::new(branch),
            product_id: ProductId::from("2"),
            batch_number: Some("AMX-01".to_string()),
        }
    }

    #[tokio::test]
    async fn test_transfer_scenario_moves_stock() {
        let scenario = Scenario::parse(TRANSFER_SCENARIO).unwrap();
        let run = scenario.run(&WorkflowConfig::default()).await.unwrap();

        assert!(run.all_expectations_met(), "{:?}", run.outcomes);
        assert_eq!(run.ledger.quantity(&amx("HQ")), 70);
        assert_eq!(run.ledger.quantity(&amx("BR001")), 30);

        let transfers = run.service.transfers().await;
        assert_eq!(transfers[0].status, TransferStatus::VerifiedController);
    }

    #[tokio::test]
    async fn test_requisition_scenario_with_priority() {
        let scenario = Scenario::parse(
            r#"
[actors.admin]
role = "central_admin"

[[step]]
action = "submit_requisition"
actor = "admin"
label = "r1"
branch = "BR002"
priority = "URGENT"
items = [{ product_id = "2", product_name = "Amoxicillin 250mg", quantity = 50 }]

[[step]]
action = "decide_requisition"
actor = "admin"
request = "r1"
decision = "APPROVED"

[[step]]
action = "decide_requisition"
actor = "admin"
request = "r1"
decision = "REJECTED"
expect = "invalid_state_transition"
"#,
        )
        .unwrap();
        let run = scenario.run(&WorkflowConfig::default()).await.unwrap();

        assert!(run.all_expectations_met());
        let requisitions = run.service.requisitions().await;
        assert_eq!(requisitions[0].status, RequisitionStatus::Approved);
        let batch = BatchRef {
            branch_id: BranchId::new("BR002"),
            product_id: ProductId::from("2"),
            batch_number: None,
        };
        assert_eq!(run.ledger.quantity(&batch), 50);
    }

    #[tokio::test]
    async fn test_unknown_actor_fails_the_run() {
        let scenario = Scenario::parse(
            r#"
[[step]]
action = "request_release"
actor = "ghost"
branch = "BR001"
items = [{ product_id = "1", product_name = "Paracetamol", quantity = 1 }]
"#,
        )
        .unwrap();
        let err = scenario.run(&WorkflowConfig::default()).await.err().unwrap();
        assert!(format!("{err:#}").contains("unknown actor"));
    }

    #[tokio::test]
    async fn test_out_of_range_workflow_table_fails_the_run() {
        for ttl in ["10000000000", "9223372036854775807"] {
            let scenario = Scenario::parse(&format!(
                "[workflow]\ndispatch_ttl_hours = {ttl}\n\n[[step]]\naction = \"expire_transfers\"\n"
            ))
            .unwrap();
            let err = scenario.run(&WorkflowConfig::default()).await.err().unwrap();
            assert!(format!("{err:#}").contains("dispatch_ttl_hours"), "{err:#}");
        }
    }

    #[tokio::test]
    async fn test_out_of_range_after_hours_fails_the_run() {
        let scenario = Scenario::parse(
            r#"
[workflow]
dispatch_ttl_hours = 48

[[step]]
action = "expire_transfers"
after_hours = 9223372036854775807
"#,
        )
        .unwrap();
        let err = scenario.run(&WorkflowConfig::default()).await.err().unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("after_hours"), "{message}");
        assert!(message.contains("step 0"), "{message}");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Scenario::parse("[[step]]\naction = \"redeliver_ledger\"\ncolour = \"red\"\n").is_err());
    }

    #[test]
    fn test_unexpected_success_is_flagged() {
        let outcome = StepOutcome {
            index: 0,
            action: StepAction::AuthorizeDisposal,
            result: Ok("disposal AUTHORIZED".to_string()),
            expected: Some("invalid_state_transition".to_string()),
        };
        assert!(!outcome.met_expectation());
        assert!(outcome.to_string().contains("UNEXPECTED"));
    }
}

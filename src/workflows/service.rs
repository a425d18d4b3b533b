// Workflow service - the only way in to the four request stores
//
// Every transition: resolve the record, check access, commit atomically in the
// store, audit, then notify the stock ledger for terminal transitions. Ledger
// notifications never fail the transition; undelivered ones are parked for
// redelivery under the same idempotency key.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn, Instrument};

use super::codes::{CodeGenerator, RandomCodes};
use super::disposal::DisposalRequest;
use super::error::{Result, WorkflowError};
use super::release::ReleaseRequest;
use super::requisition::{queue_order, Decision, Requisition, RequisitionStatus};
use super::store::{RecordStore, Transitioned};
use super::transfer::{DispatchReceipt, TransferRequest, TransferRole, TransferStatus};
use super::types::*;
use crate::collaborators::{
    AccessPolicy, AllowAll, AuditEntry, AuditLog, BatchRef, LedgerError, LedgerKey,
    LedgerOutcome, LedgerTransition, RoleTable, Severity, StockLedger, StockLine,
};
use crate::config::WorkflowConfig;
use crate::observability::{WorkflowMetrics, WorkflowStats};
use crate::priority::Priority;
use crate::telemetry::{create_workflow_span, generate_correlation_id};

/// A stock mutation the ledger has to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerInstruction {
    Credit(StockLine),
    Debit(StockLine),
    ReleaseQuarantine(BatchRef),
    Condemn(BatchRef),
}

/// A ledger instruction with its idempotency key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerNotification {
    pub key: LedgerKey,
    pub instruction: LedgerInstruction,
    /// Sent only once this instruction has been applied; parked along with it otherwise
    pub then: Option<Box<LedgerNotification>>,
}

impl LedgerNotification {
    pub fn new(
        request_id: RequestId,
        transition: LedgerTransition,
        line: usize,
        instruction: LedgerInstruction,
    ) -> Self {
        Self {
            key: LedgerKey {
                request_id,
                transition,
                line,
            },
            instruction,
            then: None,
        }
    }

    pub fn followed_by(mut self, next: LedgerNotification) -> Self {
        self.then = Some(Box::new(next));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedeliveryReport {
    pub delivered: usize,
    pub still_pending: usize,
}

pub struct WorkflowService {
    requisitions: RecordStore<Requisition>,
    transfers: RecordStore<TransferRequest>,
    releases: RecordStore<ReleaseRequest>,
    disposals: RecordStore<DisposalRequest>,
    ledger: Arc<dyn StockLedger>,
    audit: Arc<dyn AuditLog>,
    access: Arc<dyn AccessPolicy>,
    codes: Arc<dyn CodeGenerator>,
    settings: WorkflowConfig,
    metrics: Arc<WorkflowMetrics>,
    undelivered: Mutex<Vec<LedgerNotification>>,
}

impl WorkflowService {
    pub fn new(
        settings: WorkflowConfig,
        ledger: Arc<dyn StockLedger>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        let access: Arc<dyn AccessPolicy> = if settings.enforce_roles {
            Arc::new(RoleTable::default())
        } else {
            Arc::new(AllowAll)
        };
        Self {
            requisitions: RecordStore::new(),
            transfers: RecordStore::new(),
            releases: RecordStore::new(),
            disposals: RecordStore::new(),
            ledger,
            audit,
            access,
            codes: Arc::new(RandomCodes::new(settings.code_length)),
            settings,
            metrics: Arc::new(WorkflowMetrics::new()),
            undelivered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_access_policy(mut self, access: Arc<dyn AccessPolicy>) -> Self {
        self.access = access;
        self
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<WorkflowMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn stats(&self) -> WorkflowStats {
        self.metrics.get_stats()
    }

    pub fn log_stats(&self) {
        self.metrics.log_stats();
    }

    // ---- Requisitions -------------------------------------------------

    pub async fn submit_requisition(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        items: Vec<LineItem>,
        priority: Priority,
    ) -> Result<Requisition> {
        self.check_access(actor, WorkflowAction::SubmitRequisition, &branch_id)
            .await?;
        let requisition =
            Requisition::submit(branch_id, &actor.user, items, priority, Utc::now())?;
        let requisition = self.requisitions.insert(requisition).await;

        self.metrics.record_created();
        info!(
            request_id = %requisition.id,
            branch = %requisition.branch_id,
            priority = %requisition.priority,
            lines = requisition.items.len(),
            "Requisition submitted"
        );
        self.audit(
            actor,
            "requisition.submitted",
            format!(
                "requisition {} with {} line(s), priority {}",
                requisition.id,
                requisition.items.len(),
                requisition.priority
            ),
            &requisition.branch_id,
            if requisition.priority == Priority::Urgent {
                Severity::Warning
            } else {
                Severity::Info
            },
        )
        .await;
        Ok(requisition)
    }

    /// Approve or reject a PENDING requisition. Approval credits the
    /// requesting branch with each requested line.
    pub async fn decide_requisition(
        &self,
        actor: &Actor,
        request_id: RequestId,
        decision: Decision,
    ) -> Result<Requisition> {
        let span = self.span("decide_requisition", Requisition::KIND, request_id);
        async move {
            let done = self
                .run_transition(
                    &self.requisitions,
                    actor,
                    WorkflowAction::DecideRequisition,
                    request_id,
                    |r: &Requisition| r.branch_id.clone(),
                    |r| r.decide(decision, &actor.user, Utc::now()),
                )
                .await?;
            let requisition = done.current;

            let action = match requisition.status {
                RequisitionStatus::Approved => "requisition.approved",
                _ => "requisition.rejected",
            };
            info!(
                request_id = %requisition.id,
                branch = %requisition.branch_id,
                status = %requisition.status,
                "Requisition decided"
            );
            self.audit(
                actor,
                action,
                format!("requisition {} {}", requisition.id, requisition.status),
                &requisition.branch_id,
                Severity::Info,
            )
            .await;

            if requisition.status == RequisitionStatus::Approved {
                let notifications = requisition
                    .items
                    .iter()
                    .enumerate()
                    .map(|(line, item)| {
                        LedgerNotification::new(
                            requisition.id,
                            LedgerTransition::RequisitionApproved,
                            line,
                            LedgerInstruction::Credit(stock_line(&requisition.branch_id, item)),
                        )
                    })
                    .collect();
                self.deliver(notifications).await;
            }
            Ok(requisition)
        }
        .instrument(span)
        .await
    }

    pub async fn requisition(&self, request_id: RequestId) -> Result<Requisition> {
        self.requisitions.get(request_id).await
    }

    pub async fn requisitions(&self) -> Vec<Requisition> {
        self.requisitions.list().await
    }

    /// PENDING requisitions, URGENT first, then oldest first
    pub async fn requisition_queue(&self) -> Vec<Requisition> {
        let mut pending: Vec<Requisition> = self
            .requisitions
            .list()
            .await
            .into_iter()
            .filter(|r| r.status == RequisitionStatus::Pending)
            .collect();
        pending.sort_by(queue_order);
        pending
    }

    // ---- Transfers ----------------------------------------------------

    /// Dispatch stock from `source` to `target`. The returned receipt holds
    /// the two handoff codes; they are not retrievable afterwards.
    pub async fn dispatch_transfer(
        &self,
        actor: &Actor,
        source: BranchId,
        target: BranchId,
        items: Vec<LineItem>,
    ) -> Result<DispatchReceipt> {
        self.check_access(actor, WorkflowAction::DispatchTransfer, &source)
            .await?;
        let transfer = TransferRequest::dispatch(
            source,
            target,
            &actor.user,
            items,
            self.codes.generate_pair(),
            Utc::now(),
        )?;
        let transfer = self.transfers.insert(transfer).await;
        let receipt = transfer.receipt().ok_or(WorkflowError::InvalidStateTransition {
            request_id: transfer.id,
            from: transfer.status.label(),
            action: WorkflowAction::DispatchTransfer,
        })?;

        self.metrics.record_created();
        info!(
            request_id = %transfer.id,
            source = %transfer.source_branch_id,
            target = %transfer.target_branch_id,
            lines = transfer.items.len(),
            "Transfer dispatched"
        );
        self.audit(
            actor,
            "transfer.dispatched",
            format!(
                "transfer {} from {} to {} with {} line(s)",
                transfer.id,
                transfer.source_branch_id,
                transfer.target_branch_id,
                transfer.items.len()
            ),
            &transfer.source_branch_id,
            Severity::Info,
        )
        .await;
        Ok(receipt)
    }

    /// Receiving keeper confirms custody with the keeper code
    pub async fn confirm_keeper_receipt(
        &self,
        actor: &Actor,
        request_id: RequestId,
        entered_code: &str,
    ) -> Result<TransferRequest> {
        let done = self
            .run_transition(
                &self.transfers,
                actor,
                WorkflowAction::ConfirmKeeperReceipt,
                request_id,
                |t: &TransferRequest| t.target_branch_id.clone(),
                |t| t.confirm_keeper_receipt(entered_code, &actor.user, Utc::now()),
            )
            .await?;
        let transfer = done.current;

        info!(request_id = %transfer.id, keeper = %actor.user, "Transfer received by keeper");
        self.audit(
            actor,
            "transfer.received",
            format!("transfer {} received at {}", transfer.id, transfer.target_branch_id),
            &transfer.target_branch_id,
            Severity::Info,
        )
        .await;
        Ok(transfer)
    }

    /// Verifying controller signs off with the controller code. Moves the
    /// stock: debit source, credit target, per line.
    pub async fn confirm_controller_verification(
        &self,
        actor: &Actor,
        request_id: RequestId,
        entered_code: &str,
    ) -> Result<TransferRequest> {
        let span = self.span("confirm_controller_verification", TransferRequest::KIND, request_id);
        let allow_same_person = self.settings.allow_same_person_verification;
        async move {
            let done = self
                .run_transition(
                    &self.transfers,
                    actor,
                    WorkflowAction::ConfirmControllerVerification,
                    request_id,
                    |t: &TransferRequest| t.target_branch_id.clone(),
                    |t| {
                        t.confirm_controller_verification(
                            entered_code,
                            &actor.user,
                            allow_same_person,
                            Utc::now(),
                        )
                    },
                )
                .await?;
            let transfer = done.current;

            info!(
                request_id = %transfer.id,
                controller = %actor.user,
                source = %transfer.source_branch_id,
                target = %transfer.target_branch_id,
                "Transfer verified; moving stock"
            );
            self.audit(
                actor,
                "transfer.verified",
                format!(
                    "transfer {} verified; {} line(s) moved from {} to {}",
                    transfer.id,
                    transfer.items.len(),
                    transfer.source_branch_id,
                    transfer.target_branch_id
                ),
                &transfer.target_branch_id,
                Severity::Info,
            )
            .await;

            // the target is only credited what the source actually gave up
            let notifications = transfer
                .items
                .iter()
                .enumerate()
                .map(|(line, item)| {
                    LedgerNotification::new(
                        transfer.id,
                        LedgerTransition::TransferDebitSource,
                        line,
                        LedgerInstruction::Debit(stock_line(&transfer.source_branch_id, item)),
                    )
                    .followed_by(LedgerNotification::new(
                        transfer.id,
                        LedgerTransition::TransferCreditTarget,
                        line,
                        LedgerInstruction::Credit(stock_line(&transfer.target_branch_id, item)),
                    ))
                })
                .collect();
            self.deliver(notifications).await;
            Ok(transfer)
        }
        .instrument(span)
        .await
    }

    pub async fn cancel_transfer(
        &self,
        actor: &Actor,
        request_id: RequestId,
        reason: Option<&str>,
    ) -> Result<TransferRequest> {
        let reason = reason.unwrap_or("Cancelled");
        let done = self
            .run_transition(
                &self.transfers,
                actor,
                WorkflowAction::CancelTransfer,
                request_id,
                |t: &TransferRequest| t.source_branch_id.clone(),
                |t| t.cancel(&actor.user, TransferRole::Source, reason, Utc::now()),
            )
            .await?;
        let transfer = done.current;

        info!(request_id = %transfer.id, from = done.previous.status.label(), "Transfer cancelled");
        self.audit(
            actor,
            "transfer.cancelled",
            format!(
                "transfer {} cancelled from {}: {}",
                transfer.id,
                done.previous.status.label(),
                reason
            ),
            &transfer.source_branch_id,
            Severity::Warning,
        )
        .await;
        Ok(transfer)
    }

    /// Auto-cancel transfers left in DISPATCHED longer than the configured TTL.
    /// Does nothing when no TTL is configured.
    pub async fn expire_stale_transfers(&self, now: DateTime<Utc>) -> Vec<RequestId> {
        let Some(ttl_hours) = self.settings.dispatch_ttl_hours else {
            return Vec::new();
        };
        // a TTL reaching back past the start of time leaves nothing stale
        let Some(cutoff) = i64::try_from(ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_sub_signed(ttl))
        else {
            warn!(ttl_hours, "Dispatch TTL out of range; nothing expired");
            return Vec::new();
        };
        let system = Actor::system();

        let stale: Vec<(RequestId, u64)> = self
            .transfers
            .list()
            .await
            .into_iter()
            .filter(|t| t.status == TransferStatus::Dispatched && t.status_since() <= cutoff)
            .map(|t| (t.id, t.version))
            .collect();

        let mut expired = Vec::new();
        for (id, version) in stale {
            // a transfer touched since the scan is left alone
            let result = self
                .transfers
                .transition_if_version(id, version, WorkflowAction::CancelTransfer, |t| {
                    t.cancel(&system.user, TransferRole::System, "Expired", now)
                })
                .await;

            match result {
                Ok(done) => {
                    self.metrics.record_expired();
                    self.metrics.record_committed();
                    warn!(request_id = %id, ttl_hours, "Transfer expired in DISPATCHED");
                    self.audit(
                        &system,
                        "transfer.expired",
                        format!("transfer {} not received within {} hour(s)", id, ttl_hours),
                        &done.current.source_branch_id,
                        Severity::Warning,
                    )
                    .await;
                    expired.push(id);
                }
                Err(err) => debug!(request_id = %id, error = %err, "Transfer moved before expiry"),
            }
        }
        expired
    }

    pub async fn transfer(&self, request_id: RequestId) -> Result<TransferRequest> {
        self.transfers.get(request_id).await
    }

    pub async fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.list().await
    }

    // ---- Releases and disposals --------------------------------------

    pub async fn request_release(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        items: Vec<LineItem>,
    ) -> Result<ReleaseRequest> {
        self.check_access(actor, WorkflowAction::RequestRelease, &branch_id)
            .await?;
        let release = ReleaseRequest::request(branch_id, &actor.user, items, Utc::now())?;
        let release = self.releases.insert(release).await;

        self.metrics.record_created();
        info!(request_id = %release.id, branch = %release.branch_id, "Release requested");
        self.audit(
            actor,
            "release.requested",
            format!("release {} with {} line(s)", release.id, release.items.len()),
            &release.branch_id,
            Severity::Info,
        )
        .await;
        Ok(release)
    }

    /// Lift quarantine on every batch of the release
    pub async fn authorize_release(&self, actor: &Actor, request_id: RequestId) -> Result<ReleaseRequest> {
        let done = self
            .run_transition(
                &self.releases,
                actor,
                WorkflowAction::AuthorizeRelease,
                request_id,
                |r: &ReleaseRequest| r.branch_id.clone(),
                |r| r.authorize(&actor.user, Utc::now()),
            )
            .await?;
        let release = done.current;

        info!(request_id = %release.id, branch = %release.branch_id, "Release authorized");
        self.audit(
            actor,
            "release.authorized",
            format!("release {} authorized; {} batch(es) unlocked", release.id, release.items.len()),
            &release.branch_id,
            Severity::Info,
        )
        .await;

        let notifications = release
            .items
            .iter()
            .enumerate()
            .map(|(line, item)| {
                LedgerNotification::new(
                    release.id,
                    LedgerTransition::ReleaseAuthorized,
                    line,
                    LedgerInstruction::ReleaseQuarantine(batch_ref(&release.branch_id, item)),
                )
            })
            .collect();
        self.deliver(notifications).await;
        Ok(release)
    }

    pub async fn request_disposal(
        &self,
        actor: &Actor,
        branch_id: BranchId,
        items: Vec<LineItem>,
        reason: Option<&str>,
    ) -> Result<DisposalRequest> {
        self.check_access(actor, WorkflowAction::RequestDisposal, &branch_id)
            .await?;
        let disposal = DisposalRequest::request(branch_id, &actor.user, items, reason, Utc::now())?;
        let disposal = self.disposals.insert(disposal).await;

        self.metrics.record_created();
        info!(request_id = %disposal.id, branch = %disposal.branch_id, "Disposal requested");
        self.audit(
            actor,
            "disposal.requested",
            format!(
                "disposal {} with {} line(s): {}",
                disposal.id,
                disposal.items.len(),
                disposal.reason.as_deref().unwrap_or("per-line reasons")
            ),
            &disposal.branch_id,
            Severity::Warning,
        )
        .await;
        Ok(disposal)
    }

    /// Condemn every batch of the disposal. Irreversible.
    pub async fn authorize_disposal(&self, actor: &Actor, request_id: RequestId) -> Result<DisposalRequest> {
        let span = self.span("authorize_disposal", DisposalRequest::KIND, request_id);
        async move {
            let done = self
                .run_transition(
                    &self.disposals,
                    actor,
                    WorkflowAction::AuthorizeDisposal,
                    request_id,
                    |d: &DisposalRequest| d.branch_id.clone(),
                    |d| d.authorize(&actor.user, Utc::now()),
                )
                .await?;
            let disposal = done.current;

            warn!(request_id = %disposal.id, branch = %disposal.branch_id, "Disposal authorized; condemning stock");
            self.audit(
                actor,
                "disposal.authorized",
                format!("disposal {} authorized; {} batch(es) condemned", disposal.id, disposal.items.len()),
                &disposal.branch_id,
                Severity::Critical,
            )
            .await;

            let notifications = disposal
                .items
                .iter()
                .enumerate()
                .map(|(line, item)| {
                    LedgerNotification::new(
                        disposal.id,
                        LedgerTransition::DisposalAuthorized,
                        line,
                        LedgerInstruction::Condemn(batch_ref(&disposal.branch_id, item)),
                    )
                })
                .collect();
            self.deliver(notifications).await;
            Ok(disposal)
        }
        .instrument(span)
        .await
    }

    pub async fn release(&self, request_id: RequestId) -> Result<ReleaseRequest> {
        self.releases.get(request_id).await
    }

    pub async fn releases(&self) -> Vec<ReleaseRequest> {
        self.releases.list().await
    }

    pub async fn disposal(&self, request_id: RequestId) -> Result<DisposalRequest> {
        self.disposals.get(request_id).await
    }

    pub async fn disposals(&self) -> Vec<DisposalRequest> {
        self.disposals.list().await
    }

    // ---- Ledger delivery ----------------------------------------------

    /// Ledger notifications that failed and are waiting for redelivery
    pub async fn pending_ledger_notifications(&self) -> Vec<LedgerNotification> {
        self.undelivered.lock().await.clone()
    }

    /// Retry every parked notification with its original key
    pub async fn redeliver_ledger_notifications(&self) -> RedeliveryReport {
        let parked = std::mem::take(&mut *self.undelivered.lock().await);
        let mut report = RedeliveryReport::default();

        for notification in parked {
            let (applied, failed) = self.send_chain(notification).await;
            for _ in 0..applied {
                self.metrics.record_redelivery();
            }
            report.delivered += applied;
            if let Some((notification, err)) = failed {
                warn!(key = %notification.key, error = %err, "Ledger notification still failing");
                self.undelivered.lock().await.push(notification);
                report.still_pending += 1;
            }
        }
        report
    }

    async fn deliver(&self, notifications: Vec<LedgerNotification>) {
        for notification in notifications {
            if let (_, Some((notification, err))) = self.send_chain(notification).await {
                error!(key = %notification.key, error = %err, "Ledger notification failed; parked for redelivery");
                self.metrics.record_ledger_failure();
                self.undelivered.lock().await.push(notification);
            }
        }
    }

    /// Send a notification and then whatever follows it. Stops at the first
    /// failure and hands back that notification, still carrying its followers.
    async fn send_chain(
        &self,
        notification: LedgerNotification,
    ) -> (usize, Option<(LedgerNotification, LedgerError)>) {
        let mut applied = 0;
        let mut next = Some(notification);
        while let Some(current) = next {
            match self.send(&current).await {
                Ok(outcome) => {
                    debug!(key = %current.key, ?outcome, "Ledger notification sent");
                    applied += 1;
                    next = current.then.map(|follower| *follower);
                }
                Err(err) => return (applied, Some((current, err))),
            }
        }
        (applied, None)
    }

    async fn send(&self, notification: &LedgerNotification) -> std::result::Result<LedgerOutcome, LedgerError> {
        let key = &notification.key;
        match &notification.instruction {
            LedgerInstruction::Credit(line) => self.ledger.credit(key, line).await,
            LedgerInstruction::Debit(line) => self.ledger.debit(key, line).await,
            LedgerInstruction::ReleaseQuarantine(batch) => self.ledger.release_quarantine(key, batch).await,
            LedgerInstruction::Condemn(batch) => self.ledger.condemn(key, batch).await,
        }
    }

    // ---- Shared plumbing ----------------------------------------------

    async fn run_transition<T, B, F>(
        &self,
        store: &RecordStore<T>,
        actor: &Actor,
        action: WorkflowAction,
        request_id: RequestId,
        branch_of: B,
        apply: F,
    ) -> Result<Transitioned<T>>
    where
        T: WorkflowRecord,
        B: FnOnce(&T) -> BranchId,
        F: FnOnce(&T) -> Result<T>,
    {
        let current = match store.get(request_id).await {
            Ok(record) => record,
            Err(err) => {
                self.metrics.record_rejected();
                return Err(err);
            }
        };
        let branch = branch_of(&current);
        self.check_access(actor, action, &branch).await?;

        match store.transition(request_id, apply).await {
            Ok(done) => {
                self.metrics.record_committed();
                Ok(done)
            }
            Err(err) => {
                self.metrics.record_rejected();
                if matches!(err, WorkflowError::CodeMismatch { .. }) {
                    self.metrics.record_code_mismatch();
                }
                warn!(
                    kind = T::KIND,
                    request_id = %request_id,
                    action = %action,
                    user = %actor.user,
                    error = %err,
                    "Transition rejected"
                );
                self.audit(
                    actor,
                    &format!("{}.transition_rejected", T::KIND),
                    format!("{action} on {request_id}: {err}"),
                    &branch,
                    Severity::Warning,
                )
                .await;
                Err(err)
            }
        }
    }

    async fn check_access(&self, actor: &Actor, action: WorkflowAction, branch: &BranchId) -> Result<()> {
        if self.access.permits(actor, action, branch) {
            return Ok(());
        }
        self.metrics.record_unauthorized();
        warn!(user = %actor.user, role = %actor.role, action = %action, branch = %branch, "Access denied");
        self.audit(
            actor,
            "access.denied",
            format!("{} ({}) attempted {}", actor.user, actor.role, action),
            branch,
            Severity::Warning,
        )
        .await;
        Err(WorkflowError::Unauthorized {
            user: actor.user.clone(),
            action,
            branch: branch.to_string(),
        })
    }

    async fn audit(&self, actor: &Actor, action: &str, details: String, branch: &BranchId, severity: Severity) {
        let entry = AuditEntry {
            actor: actor.user.clone(),
            action: action.to_string(),
            details,
            timestamp: Utc::now(),
            branch_id: branch.clone(),
            severity,
        };
        if let Err(err) = self.audit.record(entry).await {
            error!(action, error = %err, "Failed to write audit entry");
        }
    }

    fn span(&self, operation: &str, kind: &str, request_id: RequestId) -> tracing::Span {
        let correlation_id = generate_correlation_id();
        create_workflow_span(operation, kind, Some(&request_id.to_string()), &correlation_id)
    }
}

fn batch_ref(branch: &BranchId, item: &LineItem) -> BatchRef {
    BatchRef {
        branch_id: branch.clone(),
        product_id: item.product_id.clone(),
        batch_number: item.batch_number.clone(),
    }
}

fn stock_line(branch: &BranchId, item: &LineItem) -> StockLine {
    StockLine {
        batch: batch_ref(branch, item),
        quantity: item.quantity,
    }
}

// Racing callers: every transition is compare-and-set, so exactly one wins

use futures::future::join_all;
use std::sync::Arc;

use stockflow::{
    Actor, BatchRef, BranchId, InMemoryAuditLog, InMemoryStockLedger, LineItem, Role,
    TransferStatus, WorkflowConfig, WorkflowError, WorkflowService,
};

fn service(ledger: Arc<InMemoryStockLedger>) -> Arc<WorkflowService> {
    let settings = WorkflowConfig {
        enforce_roles: false,
        ..WorkflowConfig::default()
    };
    Arc::new(WorkflowService::new(settings, ledger, Arc::new(InMemoryAuditLog::new())))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_controllers_exactly_one_wins() {
    let ledger = Arc::new(InMemoryStockLedger::new());
    let source = BatchRef {
        branch_id: BranchId::new("HQ"),
        product_id: "2".into(),
        batch_number: None,
    };
    ledger.seed(source.clone(), 100, false);
    let service = service(ledger.clone());

    let admin = Actor::central("hq-admin", Role::CentralAdmin);
    let receipt = service
        .dispatch_transfer(
            &admin,
            BranchId::new("HQ"),
            BranchId::new("BR001"),
            vec![LineItem::new("2", "Amoxicillin 250mg", 30)],
        )
        .await
        .unwrap();
    let keeper = Actor::at_branch("keeper", Role::Keeper, "BR001");
    service
        .confirm_keeper_receipt(&keeper, receipt.transfer_id, receipt.keeper_code.as_str())
        .await
        .unwrap();

    let handles: Vec<_> = ["controller-a", "controller-b"]
        .into_iter()
        .map(|user| {
            let service = service.clone();
            let code = receipt.controller_code.as_str().to_string();
            let id = receipt.transfer_id;
            tokio::spawn(async move {
                let controller = Actor::at_branch(user, Role::Controller, "BR001");
                service
                    .confirm_controller_verification(&controller, id, &code)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStateTransition { from: "VERIFIED_CONTROLLER", .. })
        ));
    }

    let transfer = service.transfer(receipt.transfer_id).await.unwrap();
    assert_eq!(transfer.status, TransferStatus::VerifiedController);
    assert_eq!(ledger.quantity(&source), 70);
    assert_eq!(ledger.applied().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_keeper_receipt() {
    let service = service(Arc::new(InMemoryStockLedger::new()));
    let admin = Actor::central("hq-admin", Role::CentralAdmin);

    for _ in 0..20 {
        let receipt = service
            .dispatch_transfer(
                &admin,
                BranchId::new("HQ"),
                BranchId::new("BR002"),
                vec![LineItem::new("1", "Paracetamol 500mg", 5)],
            )
            .await
            .unwrap();
        let id = receipt.transfer_id;
        let code = receipt.keeper_code.as_str().to_string();

        let receive = {
            let service = service.clone();
            tokio::spawn(async move {
                let keeper = Actor::at_branch("keeper", Role::Keeper, "BR002");
                service.confirm_keeper_receipt(&keeper, id, &code).await
            })
        };
        let cancel = {
            let service = service.clone();
            tokio::spawn(async move {
                let manager = Actor::at_branch("manager", Role::BranchManager, "HQ");
                service.cancel_transfer(&manager, id, Some("Recalled")).await
            })
        };
        let (received, cancelled) = (receive.await.unwrap(), cancel.await.unwrap());

        // cancel is legal from RECEIVED_KEEPER too, so it always lands
        assert!(cancelled.is_ok());
        let transfer = service.transfer(id).await.unwrap();
        assert_eq!(transfer.status, TransferStatus::Cancelled);
        match received {
            Ok(_) => assert_eq!(transfer.history.len(), 3),
            Err(err) => {
                assert!(matches!(err, WorkflowError::InvalidStateTransition { from: "CANCELLED", .. }));
                assert_eq!(transfer.history.len(), 2);
            }
        }
    }
}

//! Shared harness for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use orderflow_service::{
    ClientDirectory, ClientRequest, OrderQueries, OrderWorkflow, WorkflowStores,
};
use orderflow_settlement::DelayStrategy;
use orderflow_store::{LockStore, MemoryLockStore, MemoryStore, PartyStore, SystemClock};
use orderflow_types::{OrderSubmission, PartyId, SubmissionOutcome, WorkflowConfig};
use rust_decimal::Decimal;

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub locks: Arc<MemoryLockStore>,
    pub directory: ClientDirectory,
    pub queries: OrderQueries,
    pub config: WorkflowConfig,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let directory = ClientDirectory::open(store.clone(), store.clone(), Arc::new(SystemClock))
            .await
            .expect("directory opens on an empty store");
        Self {
            queries: OrderQueries::new(store.clone()),
            locks: Arc::new(MemoryLockStore::new()),
            store,
            directory,
            config: WorkflowConfig::default(),
        }
    }

    /// A workflow over this harness's stores with the given delay.
    pub fn workflow(&self, delay: Arc<dyn DelayStrategy>) -> Arc<OrderWorkflow> {
        self.workflow_with_locks(self.locks.clone(), delay)
    }

    pub fn workflow_with_locks(
        &self,
        locks: Arc<dyn LockStore>,
        delay: Arc<dyn DelayStrategy>,
    ) -> Arc<OrderWorkflow> {
        let workflow = OrderWorkflow::new(&self.config, WorkflowStores::memory(&self.store, locks))
            .expect("default config is valid")
            .with_delay(delay);
        Arc::new(workflow)
    }

    /// Register an active client with a zero balance.
    pub async fn client(&self, name: &str) -> PartyId {
        let resp = self
            .directory
            .register(ClientRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                phone: "555-0100".to_string(),
                active: None,
            })
            .await;
        assert!(resp.success, "register {name}: {}", resp.message);
        resp.data.expect("registered id")
    }

    /// Register a client and pin its balance.
    pub async fn client_with_profit(&self, name: &str, profit: Decimal) -> PartyId {
        let id = self.client(name).await;
        assert!(self.directory.set_profit(id, profit).await.success);
        id
    }

    pub async fn profit(&self, id: PartyId) -> Decimal {
        self.store
            .find_party(id)
            .await
            .expect("read")
            .expect("party exists")
            .profit
    }
}

/// Spawn one task per submission and collect outcomes in submission order.
pub async fn submit_all(
    workflow: &Arc<OrderWorkflow>,
    submissions: Vec<OrderSubmission>,
) -> Vec<SubmissionOutcome> {
    let handles: Vec<_> = submissions
        .into_iter()
        .map(|sub| {
            let workflow = Arc::clone(workflow);
            tokio::spawn(async move { workflow.submit(&sub).await })
        })
        .collect();
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.expect("submission task panicked"));
    }
    outcomes
}

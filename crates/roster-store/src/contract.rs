//! [`ContractStore`]: the cached contract collection.
//!
//! Every read embeds the owning person so the list can show names without a
//! second query. Writes only ever touch the `contracts` table.

use std::sync::Arc;

use roster_core::{
  Error as CoreError,
  contract::{Contract, ContractUpdate, NewContract},
  gateway::{Filter, Gateway, Select, Table},
  wire::{CONTRACT_WITH_PERSON, ContractInsert, ContractPatch, ContractRow},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Result, Status, StoreError};

pub struct ContractStore<G> {
  gateway:   Arc<G>,
  contracts: Vec<Contract>,
  status:    Status,
}

impl<G: Gateway> ContractStore<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self { gateway, contracts: Vec::new(), status: Status::default() }
  }

  pub fn contracts(&self) -> &[Contract] { &self.contracts }

  pub fn status(&self) -> &Status { &self.status }

  pub fn cached(&self, id: Uuid) -> Option<&Contract> {
    self.contracts.iter().find(|c| c.id == id)
  }

  pub async fn fetch_all(&mut self) -> Result<()> {
    self.status.begin();
    let query = Select::from(Table::Contracts)
      .columns(CONTRACT_WITH_PERSON)
      .newest_first();
    let rows = self
      .gateway
      .select::<ContractRow>(query)
      .await
      .map_err(|e| self.status.fail("fetch contracts", StoreError::gateway(e)))?;

    self.contracts = rows.into_iter().map(Contract::from).collect();
    debug!(count = self.contracts.len(), "fetched contracts");
    self.status.done();
    Ok(())
  }

  /// `Ok(None)` when no contract has this id.
  pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Contract>> {
    self.status.begin();
    let query = Select::from(Table::Contracts)
      .columns(CONTRACT_WITH_PERSON)
      .eq("id", id);
    let row = self
      .gateway
      .maybe_single::<ContractRow>(query)
      .await
      .map_err(|e| self.status.fail("get contract", StoreError::gateway(e)))?;

    let contract = row.map(Contract::from);
    if let Some(c) = &contract {
      self.replace_cached(c.clone());
    }
    self.status.done();
    Ok(contract)
  }

  /// Create a contract. A missing start date is rejected before any request
  /// is made.
  pub async fn create(&mut self, new: &NewContract) -> Result<Contract> {
    let Some(body) = ContractInsert::from_new(new) else {
      warn!("contract create rejected: no start date");
      return Err(self.status.fail("create contract", CoreError::MissingStartDate.into()));
    };

    self.status.begin();
    let row = self
      .gateway
      .insert::<_, ContractRow>(Table::Contracts, &body, CONTRACT_WITH_PERSON)
      .await
      .map_err(|e| self.status.fail("create contract", StoreError::gateway(e)))?;

    let contract = Contract::from(row);
    info!(id = %contract.id, person = %contract.person_id, "created contract");
    self.contracts.insert(0, contract.clone());
    self.status.done();
    Ok(contract)
  }

  pub async fn update(&mut self, id: Uuid, update: &ContractUpdate) -> Result<Contract> {
    self.status.begin();
    let row = self
      .gateway
      .update::<_, ContractRow>(
        Table::Contracts,
        Filter::eq("id", id),
        &ContractPatch::from(update),
        CONTRACT_WITH_PERSON,
      )
      .await
      .map_err(|e| self.status.fail("update contract", StoreError::gateway(e)))?;

    let contract = Contract::from(row);
    info!(id = %contract.id, "updated contract");
    self.replace_cached(contract.clone());
    self.status.done();
    Ok(contract)
  }

  /// Move a contract one step forward in its signing workflow.
  pub async fn advance_status(&mut self, id: Uuid) -> Result<Contract> {
    let Some(current) = self.cached(id).map(|c| c.status) else {
      let e = StoreError::NotFound { entity: "contract", id };
      return Err(self.status.fail("advance contract", e));
    };
    let next = match current.next() {
      Some(next) => current.transition_to(next),
      None => Err(CoreError::InvalidTransition {
        from: current.to_string(),
        to:   current.to_string(),
      }),
    }
    .map_err(|e| self.status.fail("advance contract", e.into()))?;

    self
      .update(id, &ContractUpdate { status: Some(next), ..Default::default() })
      .await
  }

  /// Record the URL of a generated source document.
  pub async fn attach_document(&mut self, id: Uuid, url: String) -> Result<Contract> {
    self
      .update(id, &ContractUpdate {
        source_document_url: Some(Some(url)),
        ..Default::default()
      })
      .await
  }

  pub async fn delete(&mut self, id: Uuid) -> Result<()> {
    self.status.begin();
    self
      .gateway
      .delete(Table::Contracts, Filter::eq("id", id))
      .await
      .map_err(|e| self.status.fail("delete contract", StoreError::gateway(e)))?;

    self.contracts.retain(|c| c.id != id);
    info!(%id, "deleted contract");
    self.status.done();
    Ok(())
  }

  fn replace_cached(&mut self, contract: Contract) {
    if let Some(slot) = self.contracts.iter_mut().find(|c| c.id == contract.id) {
      *slot = contract;
    }
  }
}

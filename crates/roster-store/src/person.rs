//! [`PersonStore`]: the cached person collection.

use std::sync::Arc;

use roster_core::{
  gateway::{Filter, Gateway, Select, Table},
  person::{NewPerson, Person, PersonUpdate},
  query::SortState,
  wire::{PersonInsert, PersonPatch, PersonRow},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Result, Status, StoreError};

pub struct PersonStore<G> {
  gateway:  Arc<G>,
  persons:  Vec<Person>,
  selected: Option<Uuid>,
  /// Person list ordering, kept here so it survives screen changes.
  pub sort: SortState,
  status:   Status,
}

impl<G: Gateway> PersonStore<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      gateway,
      persons: Vec::new(),
      selected: None,
      sort: SortState::default(),
      status: Status::default(),
    }
  }

  /// Cached persons, newest first.
  pub fn persons(&self) -> &[Person] { &self.persons }

  pub fn status(&self) -> &Status { &self.status }

  pub fn cached(&self, id: Uuid) -> Option<&Person> {
    self.persons.iter().find(|p| p.id == id)
  }

  pub fn selected(&self) -> Option<&Person> {
    self.selected.and_then(|id| self.cached(id))
  }

  pub fn select(&mut self, id: Option<Uuid>) { self.selected = id; }

  /// Replace the cache with every stored person, newest first.
  pub async fn fetch_all(&mut self) -> Result<()> {
    self.status.begin();
    let rows = self
      .gateway
      .select::<PersonRow>(Select::from(Table::Persons).newest_first())
      .await
      .map_err(|e| self.status.fail("fetch persons", StoreError::gateway(e)))?;

    self.persons = rows.into_iter().map(Person::from).collect();
    debug!(count = self.persons.len(), "fetched persons");
    self.status.done();
    Ok(())
  }

  /// Fetch one person from the backend, refreshing its cached copy.
  pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Person>> {
    self.status.begin();
    let row = self
      .gateway
      .maybe_single::<PersonRow>(Select::from(Table::Persons).eq("id", id))
      .await
      .map_err(|e| self.status.fail("get person", StoreError::gateway(e)))?;

    let person = row.map(Person::from);
    if let Some(p) = &person {
      self.replace_cached(p.clone());
    }
    self.status.done();
    Ok(person)
  }

  pub async fn create(&mut self, new: &NewPerson) -> Result<Person> {
    self.status.begin();
    let row = self
      .gateway
      .insert::<_, PersonRow>(Table::Persons, &PersonInsert::from(new), "*")
      .await
      .map_err(|e| self.status.fail("create person", StoreError::gateway(e)))?;

    let person = Person::from(row);
    info!(id = %person.id, "created person");
    self.persons.insert(0, person.clone());
    self.status.done();
    Ok(person)
  }

  pub async fn update(&mut self, id: Uuid, update: &PersonUpdate) -> Result<Person> {
    self.status.begin();
    let row = self
      .gateway
      .update::<_, PersonRow>(
        Table::Persons,
        Filter::eq("id", id),
        &PersonPatch::from(update),
        "*",
      )
      .await
      .map_err(|e| self.status.fail("update person", StoreError::gateway(e)))?;

    let person = Person::from(row);
    info!(id = %person.id, "updated person");
    self.replace_cached(person.clone());
    self.status.done();
    Ok(person)
  }

  pub async fn delete(&mut self, id: Uuid) -> Result<()> {
    self.status.begin();
    self
      .gateway
      .delete(Table::Persons, Filter::eq("id", id))
      .await
      .map_err(|e| self.status.fail("delete person", StoreError::gateway(e)))?;

    self.persons.retain(|p| p.id != id);
    if self.selected == Some(id) {
      self.selected = None;
    }
    info!(%id, "deleted person");
    self.status.done();
    Ok(())
  }

  fn replace_cached(&mut self, person: Person) {
    if let Some(slot) = self.persons.iter_mut().find(|p| p.id == person.id) {
      *slot = person;
    }
  }
}

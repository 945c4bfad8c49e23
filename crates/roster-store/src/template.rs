//! [`TemplateStore`]: the cached document-template collection.

use std::sync::Arc;

use roster_core::{
  gateway::{Filter, Gateway, Select, Table},
  template::{DocumentTemplate, NewDocumentTemplate, TemplateUpdate},
  wire::{TemplateInsert, TemplatePatch, TemplateRow},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Result, Status, StoreError};

pub struct TemplateStore<G> {
  gateway:   Arc<G>,
  templates: Vec<DocumentTemplate>,
  status:    Status,
}

impl<G: Gateway> TemplateStore<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self { gateway, templates: Vec::new(), status: Status::default() }
  }

  pub fn templates(&self) -> &[DocumentTemplate] { &self.templates }

  /// Templates offered when creating a contract.
  pub fn active(&self) -> impl Iterator<Item = &DocumentTemplate> {
    self.templates.iter().filter(|t| t.is_active)
  }

  pub fn status(&self) -> &Status { &self.status }

  pub fn cached(&self, id: Uuid) -> Option<&DocumentTemplate> {
    self.templates.iter().find(|t| t.id == id)
  }

  pub async fn fetch_all(&mut self) -> Result<()> {
    self.status.begin();
    let rows = self
      .gateway
      .select::<TemplateRow>(Select::from(Table::DocumentTemplates).newest_first())
      .await
      .map_err(|e| self.status.fail("fetch templates", StoreError::gateway(e)))?;

    self.templates = rows.into_iter().map(DocumentTemplate::from).collect();
    debug!(count = self.templates.len(), "fetched templates");
    self.status.done();
    Ok(())
  }

  pub async fn create(&mut self, new: &NewDocumentTemplate) -> Result<DocumentTemplate> {
    self.status.begin();
    let row = self
      .gateway
      .insert::<_, TemplateRow>(Table::DocumentTemplates, &TemplateInsert::from(new), "*")
      .await
      .map_err(|e| self.status.fail("create template", StoreError::gateway(e)))?;

    let template = DocumentTemplate::from(row);
    info!(id = %template.id, name = %template.name, "created template");
    self.templates.insert(0, template.clone());
    self.status.done();
    Ok(template)
  }

  pub async fn update(
    &mut self,
    id: Uuid,
    update: &TemplateUpdate,
  ) -> Result<DocumentTemplate> {
    self.status.begin();
    let row = self
      .gateway
      .update::<_, TemplateRow>(
        Table::DocumentTemplates,
        Filter::eq("id", id),
        &TemplatePatch::from(update),
        "*",
      )
      .await
      .map_err(|e| self.status.fail("update template", StoreError::gateway(e)))?;

    let template = DocumentTemplate::from(row);
    info!(id = %template.id, "updated template");
    if let Some(slot) = self.templates.iter_mut().find(|t| t.id == id) {
      *slot = template.clone();
    }
    self.status.done();
    Ok(template)
  }

  /// Flip the active flag with a partial update.
  pub async fn toggle_status(&mut self, id: Uuid) -> Result<DocumentTemplate> {
    let Some(current) = self.cached(id).map(|t| t.is_active) else {
      let e = StoreError::NotFound { entity: "template", id };
      return Err(self.status.fail("toggle template", e));
    };
    self
      .update(id, &TemplateUpdate { is_active: Some(!current), ..Default::default() })
      .await
  }

  pub async fn delete(&mut self, id: Uuid) -> Result<()> {
    self.status.begin();
    self
      .gateway
      .delete(Table::DocumentTemplates, Filter::eq("id", id))
      .await
      .map_err(|e| self.status.fail("delete template", StoreError::gateway(e)))?;

    self.templates.retain(|t| t.id != id);
    info!(%id, "deleted template");
    self.status.done();
    Ok(())
  }
}

//! Document generation through the `generate-document` edge function.

use reqwest::Method;
use roster_core::{
  document::{GenerateDocumentRequest, GenerateDocumentResponse},
  gateway::DocumentGenerator,
};
use tracing::info;

use crate::{Error, Result, Supabase, check};

pub const GENERATE_DOCUMENT: &str = "generate-document";

impl DocumentGenerator for Supabase {
  type Error = Error;

  async fn generate(&self, request: &GenerateDocumentRequest) -> Result<GenerateDocumentResponse> {
    let resp = self
      .request(Method::POST, self.function_url(GENERATE_DOCUMENT))
      .await
      .json(request)
      .send()
      .await?;
    let generated: GenerateDocumentResponse = check(resp).await?.json().await?;
    info!(url = %generated.source_document_url, files = generated.files.len(), "document generated");
    Ok(generated)
  }
}

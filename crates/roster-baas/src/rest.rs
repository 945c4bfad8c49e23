//! Table access through PostgREST.
//!
//! | Operation      | Request |
//! |----------------|---------|
//! | `select`       | `GET /rest/v1/<table>?select=..&<col>=eq.<v>&order=<col>.<dir>&limit=<n>` |
//! | `maybe_single` | as `select`; zero rows is `None`, more than one is an error |
//! | `insert`       | `POST /rest/v1/<table>?select=..` with `Prefer: return=representation` |
//! | `update`       | `PATCH /rest/v1/<table>?<col>=eq.<v>&select=..` likewise |
//! | `delete`       | `DELETE /rest/v1/<table>?<col>=eq.<v>` |

use reqwest::Method;
use roster_core::gateway::{Filter, Gateway, Select, Table};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{Error, Result, Supabase, check};

const RETURN_REPRESENTATION: &str = "return=representation";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

// ─── Query parameters ────────────────────────────────────────────────────────

pub fn filter_param(filter: &Filter) -> (String, String) {
  let Filter::Eq { column, value } = filter;
  (column.to_string(), format!("eq.{value}"))
}

/// PostgREST query string for a [`Select`].
pub fn select_params(query: &Select) -> Vec<(String, String)> {
  let mut params = vec![("select".to_owned(), query.columns.to_owned())];
  params.extend(query.filters.iter().map(filter_param));
  if let Some(order) = query.order {
    let dir = if order.ascending { "asc" } else { "desc" };
    params.push(("order".to_owned(), format!("{}.{dir}", order.column)));
  }
  if let Some(limit) = query.limit {
    params.push(("limit".to_owned(), limit.to_string()));
  }
  params
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

impl Gateway for Supabase {
  type Error = Error;

  async fn select<T>(&self, query: Select) -> Result<Vec<T>>
  where
    T: DeserializeOwned + Send + 'static,
  {
    debug!(table = query.table.name(), "select");
    let resp = self
      .request(Method::GET, self.rest_url(query.table.name()))
      .await
      .query(&select_params(&query))
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn maybe_single<T>(&self, query: Select) -> Result<Option<T>>
  where
    T: DeserializeOwned + Send + 'static,
  {
    let mut rows = self.select::<T>(query).await?;
    match rows.len() {
      0 | 1 => Ok(rows.pop()),
      n => Err(Error::MultipleRows(n)),
    }
  }

  async fn insert<B, T>(&self, table: Table, body: &B, columns: &'static str) -> Result<T>
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static,
  {
    debug!(table = table.name(), "insert");
    let resp = self
      .request(Method::POST, self.rest_url(table.name()))
      .await
      .query(&[("select", columns)])
      .header("Prefer", RETURN_REPRESENTATION)
      .header("Accept", SINGLE_OBJECT)
      .json(body)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn update<B, T>(
    &self,
    table: Table,
    filter: Filter,
    body: &B,
    columns: &'static str,
  ) -> Result<T>
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static,
  {
    debug!(table = table.name(), ?filter, "update");
    let resp = self
      .request(Method::PATCH, self.rest_url(table.name()))
      .await
      .query(&[filter_param(&filter)])
      .query(&[("select", columns)])
      .header("Prefer", RETURN_REPRESENTATION)
      .header("Accept", SINGLE_OBJECT)
      .json(body)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn delete(&self, table: Table, filter: Filter) -> Result<()> {
    debug!(table = table.name(), ?filter, "delete");
    let resp = self
      .request(Method::DELETE, self.rest_url(table.name()))
      .await
      .query(&[filter_param(&filter)])
      .send()
      .await?;
    check(resp).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use roster_core::wire::CONTRACT_WITH_PERSON;

  fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
  }

  #[test]
  fn select_params_default_to_all_columns() {
    let params = select_params(&Select::from(Table::Persons));
    assert_eq!(pairs(&params), vec![("select", "*")]);
  }

  #[test]
  fn select_params_carry_embed_filter_order_and_limit() {
    let id = uuid::Uuid::nil();
    let query = Select::from(Table::Contracts)
      .columns(CONTRACT_WITH_PERSON)
      .eq("id", id)
      .newest_first()
      .limit(1);
    let params = select_params(&query);
    assert_eq!(pairs(&params), vec![
      ("select", "*, person:persons(*)"),
      ("id", "eq.00000000-0000-0000-0000-000000000000"),
      ("order", "created_at.desc"),
      ("limit", "1"),
    ]);
  }

  #[test]
  fn ascending_order_is_explicit() {
    let params = select_params(&Select::from(Table::Persons).order("lastname", true));
    assert_eq!(params[1], ("order".to_owned(), "lastname.asc".to_owned()));
  }
}

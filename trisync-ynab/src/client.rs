use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use trisync_core::LinkedAccount;

use crate::types::{
    AccountsData, Budget, BudgetsData, SaveTransactionsRequest, SavedTransactions, YnabTransaction,
};

pub const DEFAULT_BASE_URL: &str = "https://api.ynab.com/v1";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{name} ({id}): {detail}")]
    Api {
        id: String,
        name: String,
        detail: String,
    },

    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response has no data")]
    MissingData,

    #[error("invalid access token header")]
    InvalidToken,
}

/// Operations the sync run needs from the budgeting service
#[allow(async_fn_in_trait)]
pub trait BudgetApi {
    async fn budgets(&self) -> Result<Vec<Budget>, ApiError>;

    async fn accounts(&self, budget_id: &str) -> Result<Vec<LinkedAccount>, ApiError>;

    async fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[YnabTransaction],
    ) -> Result<SavedTransactions, ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, alias = "message")]
    detail: String,
}

#[derive(Debug, Clone)]
pub struct YnabClient {
    http: reqwest::Client,
    base_url: String,
}

impl YnabClient {
    pub fn new(base_url: impl Into<String>, access_token: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode_envelope(status, &body)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        decode_envelope(status, &body)
    }
}

impl BudgetApi for YnabClient {
    async fn budgets(&self) -> Result<Vec<Budget>, ApiError> {
        let data: BudgetsData = self.get("/budgets").await?;
        Ok(data.budgets)
    }

    async fn accounts(&self, budget_id: &str) -> Result<Vec<LinkedAccount>, ApiError> {
        let data: AccountsData = self.get(&format!("/budgets/{budget_id}/accounts")).await?;
        Ok(data.accounts)
    }

    async fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[YnabTransaction],
    ) -> Result<SavedTransactions, ApiError> {
        self.post(
            &format!("/budgets/{budget_id}/transactions"),
            &SaveTransactionsRequest { transactions },
        )
        .await
    }
}

/// Unwrap `{ "data": ... }`, turning `{ "error": ... }` and non-2xx
/// statuses into [`ApiError`].
fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    let success = (200..300).contains(&status);

    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(_) if !success => {
            return Err(ApiError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }
        Err(e) => return Err(ApiError::Decode(e)),
    };

    if let Some(err) = envelope.error {
        return Err(ApiError::Api {
            id: err.id,
            name: err.name,
            detail: err.detail,
        });
    }
    if !success {
        return Err(ApiError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    envelope.data.ok_or(ApiError::MissingData)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_budgets() {
        let body = r#"{"data":{"budgets":[{"id":"b1","name":"Home","last_modified_on":"2020-03-01T00:00:00Z"}]}}"#;
        let data: BudgetsData = decode_envelope(200, body).unwrap();
        assert_eq!(data.budgets[0].name, "Home");
    }

    #[test]
    fn test_decode_accounts_with_null_note() {
        let body = r#"{"data":{"accounts":[
            {"id":"a1","name":"Joint","note":"NL70 TRIO 0123 4567 89","type":"checking","balance":0},
            {"id":"a2","name":"Cash","note":null}
        ]}}"#;
        let data: AccountsData = decode_envelope(200, body).unwrap();
        assert_eq!(data.accounts.len(), 2);
        assert_eq!(data.accounts[1].note, None);
    }

    #[test]
    fn test_api_error_payload() {
        let body = r#"{"error":{"id":"400","name":"bad_request","detail":"import_id too long"}}"#;
        let err = decode_envelope::<BudgetsData>(400, body).unwrap_err();
        match err {
            ApiError::Api { id, name, detail } => {
                assert_eq!(id, "400");
                assert_eq!(name, "bad_request");
                assert_eq!(detail, "import_id too long");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_error_status() {
        let err = decode_envelope::<BudgetsData>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
    }

    #[test]
    fn test_success_without_data() {
        let err = decode_envelope::<BudgetsData>(200, "{}").unwrap_err();
        assert!(matches!(err, ApiError::MissingData));
    }

    #[test]
    fn test_saved_transactions_duplicates() {
        let body = r#"{"data":{"transaction_ids":["t1"],"duplicate_import_ids":["abc"],"server_knowledge":10}}"#;
        let saved: SavedTransactions = decode_envelope(201, body).unwrap();
        assert_eq!(saved.transaction_ids, vec!["t1"]);
        assert_eq!(saved.duplicate_import_ids, vec!["abc"]);
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = YnabClient::new("https://api.ynab.com/v1/", "token").unwrap();
        assert_eq!(client.url("/budgets"), "https://api.ynab.com/v1/budgets");
    }
}

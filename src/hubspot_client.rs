use crate::errors::AppError;
use reqwest;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// A contact record as returned by the HubSpot contacts API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier assigned by HubSpot.
    pub id: String,
    /// Property map stored on the contact.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: i64,
    #[serde(default)]
    results: Vec<Contact>,
}

/// Removes properties HubSpot would silently drop.
///
/// HubSpot discards sends containing null or blank values without reporting
/// an error, which shows up later as mysteriously missing contact data. This
/// transform is mandatory before every create/update: any key whose value is
/// JSON null or an empty/whitespace-only string is stripped.
pub fn sanitize_properties(properties: Map<String, Value>) -> Map<String, Value> {
    properties
        .into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
        .collect()
}

/// Client for the HubSpot contacts API.
///
/// Covers the minimal capability the pipeline needs: exact-match search on
/// the email property, create, and update by id.
#[derive(Clone)]
pub struct HubspotClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HubspotClient {
    /// Creates a new `HubspotClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the HubSpot API.
    /// * `token` - The private app access token.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create HubSpot client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Looks up a contact by exact email match.
    ///
    /// Email is the unique key for leads, so at most the first result is
    /// inspected.
    ///
    /// # Returns
    ///
    /// * `Result<Option<Contact>, AppError>` - The contact, if one exists.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, AppError> {
        let url = format!("{}/crm/v3/objects/contacts/search", self.base_url);
        tracing::debug!("Searching HubSpot contact by email: {}", email);

        let body = json!({
            "filterGroups": [
                {
                    "filters": [
                        {
                            "propertyName": "email",
                            "operator": "EQ",
                            "value": email
                        }
                    ]
                }
            ],
            "limit": 1
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("HubSpot search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "HubSpot search returned {}: {}",
                status, error_text
            )));
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse HubSpot search response: {}", e))
        })?;

        if search.total > 0 {
            Ok(search.results.into_iter().next())
        } else {
            Ok(None)
        }
    }

    /// Creates a contact.
    ///
    /// The property map must already have passed [`sanitize_properties`];
    /// HubSpot assigns the identifier.
    pub async fn create_contact(
        &self,
        properties: Map<String, Value>,
    ) -> Result<Contact, AppError> {
        let url = format!("{}/crm/v3/objects/contacts", self.base_url);
        tracing::info!("Creating HubSpot contact");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("HubSpot contact creation failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "HubSpot contact creation returned {}: {}",
                status, error_text
            )));
        }

        let contact: Contact = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse HubSpot create response: {}", e))
        })?;

        tracing::info!("HubSpot contact created: {}", contact.id);
        Ok(contact)
    }

    /// Updates a contact by id.
    ///
    /// Same sanitization rule as [`HubspotClient::create_contact`]. Returns
    /// `NotFound` when the id does not correspond to an existing record.
    pub async fn update_contact(
        &self,
        contact_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Contact, AppError> {
        let url = format!("{}/crm/v3/objects/contacts/{}", self.base_url, contact_id);
        tracing::info!("Updating HubSpot contact {}", contact_id);

        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("HubSpot contact update failed: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "Contact {} not found",
                contact_id
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "HubSpot contact update returned {}: {}",
                status, error_text
            )));
        }

        let contact: Contact = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse HubSpot update response: {}", e))
        })?;

        tracing::info!("HubSpot contact updated: {}", contact.id);
        Ok(contact)
    }
}

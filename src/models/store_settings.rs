use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use serde::{Deserialize, Serialize};

/// Identifier of the singleton settings document.
pub const STORE_SETTINGS_ID: &str = "store-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub store_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl Document for StoreSettings {
    const COLLECTION: &'static str = "store_settings";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettingsInput {
    pub store_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl StoreSettings {
    /// Settings served when none have been saved yet.
    pub fn defaults() -> Self {
        Self {
            id: STORE_SETTINGS_ID.to_string(),
            store_name: "My Store".to_string(),
            description: Some("Default store description".to_string()),
            address: Some(String::new()),
            contact_email: Some(String::new()),
            contact_phone: Some(String::new()),
        }
    }

    pub fn create(input: StoreSettingsInput) -> Result<Self, ApiError> {
        let mut v = Violations::new();
        v.required("storeName", input.store_name.as_ref());
        v.not_blank("storeName", input.store_name.as_ref());
        v.into_result()?;

        Ok(Self {
            id: STORE_SETTINGS_ID.to_string(),
            store_name: input.store_name.unwrap_or_default(),
            description: input.description,
            address: input.address,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
        })
    }

    pub fn apply(&mut self, input: StoreSettingsInput) -> Result<(), ApiError> {
        let mut v = Violations::new();
        v.not_blank("storeName", input.store_name.as_ref());
        v.into_result()?;

        if let Some(name) = input.store_name {
            self.store_name = name;
        }
        if input.description.is_some() {
            self.description = input.description;
        }
        if input.address.is_some() {
            self.address = input.address;
        }
        if input.contact_email.is_some() {
            self.contact_email = input.contact_email;
        }
        if input.contact_phone.is_some() {
            self.contact_phone = input.contact_phone;
        }
        Ok(())
    }
}

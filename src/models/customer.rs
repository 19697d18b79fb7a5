use super::{default_true, new_id};
use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Document for Customer {
    const COLLECTION: &'static str = "customers";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerInput {
    fn check(&self, v: &mut Violations) {
        v.not_blank("name", self.name.as_ref());
        v.not_blank("email", self.email.as_ref());
    }
}

impl Customer {
    pub fn create(input: CustomerInput) -> Result<Self, ApiError> {
        let mut v = Violations::new();
        v.required("name", input.name.as_ref());
        v.required("email", input.email.as_ref());
        input.check(&mut v);
        v.into_result()?;

        Ok(Self {
            id: new_id(),
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            phone: input.phone,
            is_active: input.is_active.unwrap_or(true),
            created_at: Utc::now(),
        })
    }

    pub fn apply(&mut self, input: CustomerInput) -> Result<(), ApiError> {
        let mut v = Violations::new();
        input.check(&mut v);
        v.into_result()?;

        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(email) = input.email {
            self.email = email;
        }
        if input.phone.is_some() {
            self.phone = input.phone;
        }
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}

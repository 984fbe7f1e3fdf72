use serde::{Deserialize, Serialize};

/// Where the account's credentials come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Microsoft,
    Mojang,
}

/// The authenticated account a launch is performed for. Produced by the
/// auth manager; this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAccount {
    pub display_name: String,
    pub uuid: String,
    pub access_token: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

impl AuthAccount {
    /// Value of the `${user_type}` placeholder.
    pub fn user_type(&self) -> &'static str {
        match self.account_type {
            AccountType::Microsoft => "msa",
            AccountType::Mojang => "mojang",
        }
    }

    pub fn player_name(&self) -> &str {
        self.display_name.trim()
    }

    pub fn trimmed_uuid(&self) -> &str {
        self.uuid.trim()
    }
}

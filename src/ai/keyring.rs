use std::collections::HashMap;

use super::AiError;

pub(crate) const SERVICE_NAME: &str = "clarity";
const KEYRING_SERVER: &str = "gemini-api";

/// Environment variable checked before the keyring.
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

fn attributes() -> HashMap<&'static str, &'static str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", KEYRING_SERVER);
    attrs
}

async fn connect() -> Result<oo7::Keyring, AiError> {
    oo7::Keyring::new()
        .await
        .map_err(|e| AiError::Keyring(format!("Failed to connect to keyring: {}", e)))
}

/// Store the Gemini API key in the system keyring via Secret Service.
pub async fn store_api_key(key: &str) -> Result<(), AiError> {
    let keyring = connect().await?;

    keyring
        .create_item("Clarity Gemini API Key", &attributes(), key.as_bytes(), true)
        .await
        .map_err(|e| AiError::Keyring(format!("Failed to store API key: {}", e)))?;

    log::info!("Stored API key in keyring");
    Ok(())
}

/// Load the Gemini API key from the system keyring.
pub async fn load_api_key() -> Result<Option<String>, AiError> {
    let keyring = connect().await?;

    let items = keyring
        .search_items(&attributes())
        .await
        .map_err(|e| AiError::Keyring(format!("Failed to search keyring: {}", e)))?;

    if let Some(item) = items.first() {
        let secret_bytes = item
            .secret()
            .await
            .map_err(|e| AiError::Keyring(format!("Failed to read secret: {}", e)))?;
        let key = String::from_utf8(secret_bytes.to_vec())
            .map_err(|e| AiError::Keyring(format!("Invalid UTF-8 in secret: {}", e)))?;
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }

    Ok(None)
}

pub async fn delete_api_key() -> Result<(), AiError> {
    let keyring = connect().await?;

    let items = keyring
        .search_items(&attributes())
        .await
        .map_err(|e| AiError::Keyring(format!("Failed to search keyring: {}", e)))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| AiError::Keyring(format!("Failed to delete API key: {}", e)))?;
    }

    Ok(())
}

/// Environment first, then the keyring. A keyring that cannot be reached is
/// treated as holding no key.
pub async fn resolve_api_key() -> Result<String, AiError> {
    if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }

    match load_api_key().await {
        Ok(Some(key)) => Ok(key),
        Ok(None) => Err(AiError::MissingApiKey),
        Err(e) => {
            log::warn!("{}", e);
            Err(AiError::MissingApiKey)
        }
    }
}

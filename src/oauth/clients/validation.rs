//! Mandatory field checks for configured client definitions.

use crate::errors::DefinitionError;
use crate::oauth::types::ClientDefinition;
use url::Url;

/// Check that a definition can be written to the registry.
///
/// A definition is valid only when both the client id and the client secret
/// are present and non-blank. Malformed redirect URIs are reported but do not
/// invalidate the definition, since no enabled flow reads them yet.
pub fn validate_client_definition(definition: &ClientDefinition) -> Result<(), DefinitionError> {
    if definition.client_id.trim().is_empty() {
        return Err(DefinitionError::MissingClientId);
    }

    if definition.client_secret.trim().is_empty() {
        return Err(DefinitionError::MissingClientSecret(
            definition.client_id.clone(),
        ));
    }

    for redirect_uri in &definition.redirect_uris {
        if let Err(err) = Url::parse(redirect_uri) {
            tracing::warn!(
                client_id = %definition.client_id,
                %redirect_uri,
                error = %err,
                "ignoring malformed redirect URI"
            );
        }
    }

    Ok(())
}

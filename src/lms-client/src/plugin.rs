//! Wiring the rescan listener into a library manager's event dispatcher.

use crate::LmsClient;
use lms_core::{
    ClientError, EventDispatcher, LmsSection, RescanListener, ServerConfig, ValidationError,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("invalid LMS configuration: {0}")]
    Configuration(#[from] ValidationError),
    #[error("failed to create LMS client: {0}")]
    Client(#[from] ClientError),
}

/// Validate `section`, build the client and subscribe a listener for the
/// configured method. Nothing is registered when validation fails.
pub fn install(
    section: &LmsSection,
    dispatcher: &mut EventDispatcher,
) -> Result<Arc<RescanListener>, InstallError> {
    let config = ServerConfig::from_section(section)?;
    let method = config.listener_method;
    let client = LmsClient::new(config)?;
    tracing::debug!("LMS endpoint: {}", client.server_url());

    let listener = Arc::new(RescanListener::new(method, Arc::new(client)));
    listener.subscribe(dispatcher);
    Ok(listener)
}

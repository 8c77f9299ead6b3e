use crate::command::{Command, Target};
use crate::errors::ProviderError;
use crate::provider::ScreenProvider;
use crate::types::Point;
use crate::utils::sleep_or_cancel;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Runs one textual command against a [`ScreenProvider`].
///
/// `execute` resolves to `Ok(true)` / `Ok(false)` for success / failure of the
/// attempt. Grammar errors and recoverable provider errors are failures, not
/// errors; only a fatal provider error is returned as `Err`.
#[derive(Clone)]
pub struct ActionDispatcher {
    provider: Arc<dyn ScreenProvider>,
    cancellation: CancellationToken,
}

impl ActionDispatcher {
    pub fn new(provider: Arc<dyn ScreenProvider>) -> Self {
        Self {
            provider,
            cancellation: CancellationToken::new(),
        }
    }

    /// Token that interrupts `wait` commands
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ScreenProvider> {
        &self.provider
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn execute(&self, command_text: &str) -> Result<bool, ProviderError> {
        let command = match Command::parse(command_text) {
            Ok(command) => command,
            Err(e) => {
                warn!("✗ {}", e);
                return Ok(false);
            }
        };

        match self.perform(&command).await {
            Ok(succeeded) => Ok(succeeded),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("✗ Error while running '{}': {}", command, e);
                Ok(false)
            }
        }
    }

    async fn perform(&self, command: &Command) -> Result<bool, ProviderError> {
        match command {
            Command::Find { target, query } => {
                let found = self.locate(*target, query).await?;
                if found.is_empty() {
                    info!("{} '{}' not found on screen", target, query);
                    return Ok(false);
                }
                info!("Found {} match(es) for {} '{}'", found.len(), target, query);
                Ok(true)
            }
            Command::ClickAt { x, y } => {
                self.provider.click(*x, *y).await?;
                Ok(true)
            }
            Command::ClickMatch {
                target,
                query,
                index,
            } => {
                info!("Searching for {}: '{}'...", target, query);
                let found = self.locate(*target, query).await?;
                if found.is_empty() {
                    info!("{} '{}' not found on screen", target, query);
                    return Ok(false);
                }

                let mut index = *index;
                if index >= found.len() {
                    warn!(
                        "Index {} out of range. Found {} occurrence(s). Using index {} instead.",
                        index,
                        found.len(),
                        found.len() - 1
                    );
                    index = found.len() - 1;
                }

                let point = found[index];
                self.provider.click(point.x, point.y).await?;
                Ok(true)
            }
            Command::Type(text) => {
                self.provider.type_text(text).await?;
                Ok(true)
            }
            Command::Press(key) => {
                self.provider.press_key(key).await?;
                Ok(true)
            }
            Command::ListObjects => {
                let detections = self.provider.locate_objects(None).await?;
                if detections.is_empty() {
                    info!("No objects detected");
                } else {
                    info!("Found {} objects:", detections.len());
                    for (i, d) in detections.iter().enumerate() {
                        info!(
                            "  {}: {} at ({}, {}) - confidence: {:.2}",
                            i, d.class_name, d.x, d.y, d.confidence
                        );
                    }
                }
                Ok(true)
            }
            Command::Wait(duration) => {
                info!("Waiting {} seconds...", duration.as_secs_f64());
                if !sleep_or_cancel(*duration, &self.cancellation).await {
                    debug!("Wait interrupted by cancellation");
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    async fn locate(&self, target: Target, query: &str) -> Result<Vec<Point>, ProviderError> {
        let points = match target {
            Target::Text => {
                let matches = self.provider.locate_text(query).await?;
                for m in &matches {
                    debug!(
                        "Found '{}' at ({}, {}) with confidence {:.2}",
                        m.text, m.x, m.y, m.confidence
                    );
                }
                matches.iter().map(|m| m.position()).collect()
            }
            Target::Object => {
                let matches = self.provider.locate_objects(Some(query)).await?;
                for m in &matches {
                    debug!(
                        "Found '{}' at ({}, {}) with confidence {:.2}",
                        m.class_name, m.x, m.y, m.confidence
                    );
                }
                matches.iter().map(|m| m.position()).collect()
            }
        };
        Ok(points)
    }
}

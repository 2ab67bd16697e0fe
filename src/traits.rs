use async_trait::async_trait;

use crate::error::PrismError;
use crate::form::FormStep;

/// Element-level browser control the session needs.
///
/// Every element operation waits for the element with the given id to appear
/// before acting on it.
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Navigates to `url` and waits for the page to load.
    async fn open(&mut self, url: &str) -> Result<(), PrismError>;

    /// Clicks the element.
    async fn click(&mut self, id: &str) -> Result<(), PrismError>;

    /// Clears a text input and types `value` into it.
    async fn fill(&mut self, id: &str, value: &str) -> Result<(), PrismError>;

    /// Picks the option of a `<select>` whose value is `value`.
    async fn select(&mut self, id: &str, value: &str) -> Result<(), PrismError>;

    /// Releases the browser.
    async fn close(&mut self) -> Result<(), PrismError>;

    /// Runs a single form step.
    async fn apply(&mut self, step: &FormStep) -> Result<(), PrismError> {
        match step {
            FormStep::Click(id) => self.click(id).await,
            FormStep::Fill(id, value) => self.fill(id, value).await,
            FormStep::Select(id, value) => self.select(id, value).await,
        }
    }
}

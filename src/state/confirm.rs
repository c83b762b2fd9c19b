//! Confirm - Interactive Confirmation Before Destructive Actions

use async_trait::async_trait;

/// Asks the user a yes/no question.
///
/// Declining is not an error: callers short-circuit before issuing any request.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed answer, for scripted front-ends and tests
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "Auto-answering confirmation");
        self.0
    }
}

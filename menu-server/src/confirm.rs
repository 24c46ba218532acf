//! Operator confirmations
//!
//! Destructive actions (clearing the cart, deleting a product, finalizing
//! every pending order, ...) ask before doing anything. Over HTTP the web
//! client has already shown the dialog, so the request carries the answer.

/// Yes/no dialog and free-text prompt
pub trait ConfirmationProvider: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    /// `None` when the operator dismissed the prompt
    fn prompt(&self, message: &str) -> Option<String>;
}

/// Says yes to everything; prompts answer with an empty string
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationProvider for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn prompt(&self, _message: &str) -> Option<String> {
        Some(String::new())
    }
}

/// Declines every dialog
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmationProvider for NeverConfirm {
    fn confirm(&self, _message: &str) -> bool {
        false
    }

    fn prompt(&self, _message: &str) -> Option<String> {
        None
    }
}

/// Answers already collected by the client
#[derive(Debug, Clone, Default)]
pub struct Preanswered {
    pub confirmed: bool,
    pub answer: Option<String>,
}

impl Preanswered {
    pub fn confirmed(confirmed: bool) -> Self {
        Self {
            confirmed,
            answer: None,
        }
    }

    pub fn with_answer(answer: Option<String>) -> Self {
        Self {
            confirmed: answer.is_some(),
            answer,
        }
    }
}

impl ConfirmationProvider for Preanswered {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!(message, confirmed = self.confirmed, "Confirmation");
        self.confirmed
    }

    fn prompt(&self, message: &str) -> Option<String> {
        tracing::debug!(message, answered = self.answer.is_some(), "Prompt");
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preanswered() {
        let p = Preanswered::with_answer(Some("sem estoque".into()));
        assert!(p.confirm("Cancelar?"));
        assert_eq!(p.prompt("Motivo").as_deref(), Some("sem estoque"));

        let no = Preanswered::confirmed(false);
        assert!(!no.confirm("Limpar carrinho?"));
        assert!(no.prompt("Motivo").is_none());
    }
}

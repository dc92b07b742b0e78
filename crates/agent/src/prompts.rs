//! Prompt templates, parameterized by the name of the person the assistant
//! speaks for.

/// Owner name used when none is configured.
pub const DEFAULT_OWNER: &str = "Naisarg";

/// Builds the classifier, retrieval and generic prompts.
#[derive(Debug, Clone)]
pub struct Prompts {
    owner: String,
}

impl Prompts {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    /// Asks the model to label `message` as `generic` or `context-specific`.
    pub fn classifier(&self, message: &str) -> String {
        format!(
            "You are conversation classifier. If the message contains generic questions around your abilites, return 'generic' and if it talks about {owner} or anything about him (indirectly using pronouns) return 'context-specific'. Now here's the user message that you must classify ': {message}",
            owner = self.owner
        )
    }

    /// Prior conversation, then the retrieved documents, then the question.
    pub fn retrieval(&self, context: &str, combined: &str, message: &str) -> String {
        format!(
            "{context}\nYou are {owner}'s AI assistant and I need you to understand the following information: \n{combined}\n\nNow the user wants a crisp answer for the following question: {message}. So please answer in third person.",
            owner = self.owner
        )
    }

    /// Polite deflection for questions outside the configured scope.
    pub fn generic(&self, message: &str) -> String {
        format!(
            "You are {owner}'s AI Buddy and this a generic question asked by the user to you. The message is {message}. Tell them how much you would love to answer these but for now you are configured to answer questions related to {owner} and his professional life.",
            owner = self.owner
        )
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER)
    }
}

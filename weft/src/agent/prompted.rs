use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::prompts::PromptTemplate;
use crate::reasoner::{call_reasoner, Reasoner};

/// A reasoner bound to one step's prompt template and the per-call timeout.
#[derive(Clone)]
pub(crate) struct PromptedReasoner {
    reasoner: Arc<dyn Reasoner>,
    template: PromptTemplate,
    timeout: Option<Duration>,
}

impl PromptedReasoner {
    pub(crate) fn new(
        reasoner: Arc<dyn Reasoner>,
        template: PromptTemplate,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            reasoner,
            template,
            timeout,
        }
    }

    /// Renders the template with `vars` and calls the reasoner.
    pub(crate) async fn ask(
        &self,
        vars: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let prompt = self.template.render(vars);
        call_reasoner(
            self.reasoner.as_ref(),
            &prompt.system,
            &prompt.user,
            cancel,
            self.timeout,
        )
        .await
    }
}

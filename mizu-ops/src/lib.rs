pub mod suggestions;
pub mod notify;
pub mod prompt;
pub mod disruption;
pub mod pipeline;

pub use suggestions::{SeatingConfig, SuggestionEngine};
pub use notify::{LogNotifier, Notifier};
pub use prompt::{Choice, DecisionSource, FixedDecision, TerminalPrompt};
pub use disruption::{DisruptionConfig, DisruptionManager, DisruptionOutcome};
pub use pipeline::{
    Pipeline, PipelineError, PipelineReport, PipelineSettings, Repositories, Strategy, Target,
};

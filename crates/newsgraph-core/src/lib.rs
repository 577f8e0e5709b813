pub mod article;
pub mod llm;
pub mod pipeline;
pub mod triple;
pub mod vocab;

pub use article::NewsArticle;
pub use llm::{CompletionClient, LlmConfig, LlmError, LlmResult, OpenAiClient};
pub use pipeline::{
    decode_json, reconcile, DecodeError, JsonShape, PipelineConfig, PipelineDriver,
    PipelineError, ReconcileDelta, ReconcileOutcome, ReconciliationStats, RunLog,
    TripleExtractor, TripleVerifier, VerificationJudgement, VerifyAction, VerifyError,
};
pub use triple::{DocumentExtraction, Triple, EXTRACTION_MODE_ZERO_SHOT};
pub use vocab::{FALLBACK_RELATION, RELATIONS};

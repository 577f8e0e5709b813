mod decode;
mod driver;
mod extract;
mod reconcile;
mod verify;

pub use decode::{decode_json, DecodeError, DecodeResult, JsonShape};
pub use driver::{PipelineConfig, PipelineDriver, PipelineError, PipelineResult, RunLog};
pub use extract::{ExtractError, TripleExtractor};
pub use reconcile::{reconcile, ReconcileDelta, ReconcileOutcome, ReconciliationStats};
pub use verify::{
    TripleVerifier, VerificationJudgement, VerifyAction, VerifyError, VerifyResult,
};

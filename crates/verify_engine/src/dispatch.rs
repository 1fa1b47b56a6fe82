//! Check dispatch for a single frame

use contracts::{attrs, CheckKind, FrameData, TypeLimits, Verdict, VerifierError};
use tracing::trace;

use crate::checks::{evaluate, CheckContext, CheckHistory, PartialResults};

/// Run the configured check list against one frame.
///
/// Every check runs even after a violation so the verdict carries the full
/// result list. Later checks read earlier same-frame results through
/// `PartialResults`. An evaluation error aborts the frame and propagates.
pub fn run_quality_checks(
    data: &FrameData,
    index: u64,
    checks: &[CheckKind],
    limits: &TypeLimits,
    history: &dyn CheckHistory,
) -> Result<Verdict, VerifierError> {
    let mut partial = PartialResults::new();

    for &check in checks {
        let ctx = CheckContext {
            data,
            limits,
            history,
            partial: &partial,
        };
        let result = evaluate(check, &ctx)?;
        trace!(
            index,
            check = check.as_str(),
            value = result.value,
            error = ?result.error,
            "check evaluated"
        );
        partial.push(result);
    }

    let mut verdict = Verdict::new(data.data_type.clone(), index, partial.into_results());
    verdict.file_name = data.attributes.text(attrs::FILE_NAME).map(str::to_string);
    Ok(verdict)
}

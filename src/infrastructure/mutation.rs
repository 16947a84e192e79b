//! Mutation coordinator: mutate, verify the external effect, or compensate
//!
//! Shared executor behind every "change local state, then perform one
//! irrevocable external effect" operation (email/username/password change,
//! invite create/resend, project/bucket mirroring). The local mutation is
//! applied optimistically and persisted; if the external effect then fails,
//! the mutation is synchronously reverted and the failure surfaces as
//! `ExternalEffect`. A failed revert surfaces as `CompensationFailed` and is
//! logged at error level, since it leaves the record genuinely
//! inconsistent.
//!
//! The revert is not guarded by a transaction spanning the external call,
//! so other readers may observe the not-yet-confirmed value mid-flight.
//! There is no retry: one effect failure is terminal for the request and
//! compensates exactly once.

use std::future::Future;

use tracing::{error, warn};

use crate::domain::DomainError;

/// Run a local mutation paired with an external effect.
///
/// * `apply` performs and persists the local mutation, yielding the
///   persisted value.
/// * `verify` performs the external effect against that value.
/// * `compensate` reverts the mutation; the pre-mutation snapshot is
///   captured in the closure by the caller (revert-in-place), or the
///   closure deletes the freshly created row (delete-on-failure).
///
/// An `apply` failure propagates untouched: nothing was persisted beyond
/// what `apply` itself rolled back, so there is nothing to compensate.
pub async fn run_with_compensation<T, A, AFut, V, VFut, C, CFut>(
    apply: A,
    verify: V,
    compensate: C,
) -> Result<T, DomainError>
where
    T: Clone,
    A: FnOnce() -> AFut,
    AFut: Future<Output = Result<T, DomainError>>,
    V: FnOnce(T) -> VFut,
    VFut: Future<Output = Result<(), DomainError>>,
    C: FnOnce(T) -> CFut,
    CFut: Future<Output = Result<(), DomainError>>,
{
    let applied = apply().await?;

    match verify(applied.clone()).await {
        Ok(()) => Ok(applied),
        Err(effect_err) => {
            warn!(error = %effect_err, "external effect failed, compensating local mutation");

            match compensate(applied).await {
                Ok(()) => Err(match effect_err {
                    compensated @ DomainError::ExternalEffect { .. } => compensated,
                    other => DomainError::external_effect(other.to_string()),
                }),
                Err(revert_err) => {
                    error!(
                        effect = %effect_err,
                        revert = %revert_err,
                        "compensation failed, state left inconsistent"
                    );
                    Err(DomainError::compensation_failed(format!(
                        "{revert_err} (while reverting: {effect_err})"
                    )))
                }
            }
        }
    }
}

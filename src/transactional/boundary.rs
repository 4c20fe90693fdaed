use crate::error::BeanwireError;
use crate::transactional::context::{
    ACTIVE_TRANSACTION, BOUNDARY_NAME, TransactionContext, current_transaction,
};
use crate::transactional::{Propagation, TransactionManager, TransactionOptions};
use std::future::Future;
use std::sync::Arc;

/// Runs `body` at a transaction boundary described by `options`.
///
/// The boundary owns, and therefore finalizes, only a transaction it begins
/// itself: it commits when `body` succeeds and rolls back when it fails.
/// A boundary that joins an active transaction marks it rollback-only when
/// `body` fails, so the owner rolls back and reports
/// [`BeanwireError::UnexpectedRollback`] even if it handled the error.
///
/// # Errors
/// Returns the error of `body`, or a [`BeanwireError`] converted into `E`
/// when the propagation rule refuses to run or the manager fails.
pub async fn execute<T, E, F>(
    manager: &dyn TransactionManager,
    options: TransactionOptions,
    body: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: From<BeanwireError> + Send,
{
    let active = current_transaction();

    match (options.propagation, active) {
        (Propagation::Required | Propagation::Supports | Propagation::Mandatory, Some(tx)) => {
            participate(tx, body).await
        }
        (Propagation::Required | Propagation::RequiresNew, _) | (Propagation::Nested, None) => {
            let transaction = manager.begin(options.clone()).await?;
            run_owned(TransactionContext::new(options, transaction), body).await
        }
        (Propagation::Nested, Some(parent)) => {
            let transaction = manager.begin_nested(&parent, options.clone()).await?;
            run_owned(TransactionContext::new(options, transaction), body).await
        }
        (Propagation::Mandatory, None) => Err(BeanwireError::IllegalTransactionState(
            "No existing transaction found for transaction marked with propagation 'mandatory'"
                .to_string(),
        )
        .into()),
        (Propagation::Never, Some(tx)) => Err(BeanwireError::IllegalTransactionState(format!(
            "Existing transaction '{}' found for transaction marked with propagation 'never'",
            tx.name()
        ))
        .into()),
        (Propagation::Supports | Propagation::Never, None) => {
            BOUNDARY_NAME.scope(options.name, body).await
        }
        (Propagation::NotSupported, active) => {
            if let Some(tx) = active {
                tracing::debug!("Suspending transaction '{}'", tx.name());
            }
            ACTIVE_TRANSACTION
                .scope(None, BOUNDARY_NAME.scope(options.name, body))
                .await
        }
    }
}

async fn participate<T, E, F>(tx: Arc<TransactionContext>, body: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
{
    tracing::debug!("Participating in transaction '{}'", tx.name());
    let result = body.await;
    if result.is_err() {
        tracing::debug!(
            "Participant failed, marking transaction '{}' rollback-only",
            tx.name()
        );
        tx.set_rollback_only();
    }
    result
}

async fn run_owned<T, E, F>(context: TransactionContext, body: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
    E: From<BeanwireError>,
{
    let context = Arc::new(context);
    tracing::debug!("Began transaction '{}' ({})", context.name(), context.id());

    let result = ACTIVE_TRANSACTION.scope(Some(context.clone()), body).await;

    let mut transaction = context.transaction().lock().await;
    match result {
        Ok(_) if context.is_rollback_only() => {
            tracing::debug!("Transaction '{}' is rollback-only", context.name());
            transaction.rollback().await?;
            Err(BeanwireError::UnexpectedRollback {
                name: context.name().to_string(),
            }
            .into())
        }
        Ok(value) => {
            transaction.commit().await?;
            tracing::debug!("Committed transaction '{}'", context.name());
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = transaction.rollback().await {
                tracing::error!(
                    "Rollback of transaction '{}' failed: {}",
                    context.name(),
                    rollback_err
                );
            } else {
                tracing::debug!("Rolled back transaction '{}'", context.name());
            }
            Err(e)
        }
    }
}

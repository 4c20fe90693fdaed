use crate::aop::Method;
use crate::aop::transaction::{options_for, run_in_transaction};
use crate::di::TypeKey;
use crate::error::BoxError;
use crate::transactional::{TransactionManager, TransactionOptions};
use std::future::Future;
use std::sync::Arc;

/// Proxy with a single concern: methods marked transactional run inside a
/// transaction, every other method goes straight to the target.
pub struct TransactionHandler<T: ?Sized> {
    manager: Arc<dyn TransactionManager>,
    target: Arc<T>,
}

impl<T: ?Sized + Send + Sync + 'static> TransactionHandler<T> {
    pub fn new(manager: Arc<dyn TransactionManager>, target: Arc<T>) -> Self {
        Self { manager, target }
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// # Errors
    /// A transactional call that fails is rolled back and reported as
    /// [`crate::BeanwireError::DataAccess`]; errors of plain calls pass
    /// through unchanged.
    pub async fn invoke<R, F, Fut>(&self, method: &Method, call: F) -> Result<R, BoxError>
    where
        R: Send,
        F: FnOnce(Arc<T>) -> Fut,
        Fut: Future<Output = Result<R, BoxError>> + Send,
    {
        let target = self.target.clone();
        if !method.is_transactional() {
            return call(target).await;
        }

        let options = options_for(method, TypeKey::of::<T>(), &TransactionOptions::default());
        run_in_transaction(self.manager.as_ref(), options, call(target)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Bean;
    use crate::error::BeanwireError;
    use crate::testing::{RecordingTransactionManager, TxEvent, UserRepository};
    use crate::transactional::is_transaction_active;

    trait UserService: Send + Sync {
        fn repository(&self) -> &UserRepository;
    }

    struct AppUserService {
        repository: UserRepository,
    }

    impl UserService for AppUserService {
        fn repository(&self) -> &UserRepository {
            &self.repository
        }
    }

    fn handler() -> (Arc<RecordingTransactionManager>, TransactionHandler<dyn UserService>) {
        let manager = Arc::new(RecordingTransactionManager::instantiate().unwrap());
        let target: Arc<dyn UserService> = Arc::new(AppUserService {
            repository: UserRepository::instantiate().unwrap(),
        });
        (manager.clone(), TransactionHandler::new(manager, target))
    }

    fn change_password() -> Method {
        Method::new("change_password").transactional(TransactionOptions::default())
    }

    #[tokio::test]
    async fn test_transactional_method_commits() {
        let (manager, handler) = handler();

        let active = handler
            .invoke(&change_password(), |service: Arc<dyn UserService>| async move {
                service.repository().save("gugu").await;
                Ok::<_, BoxError>(is_transaction_active())
            })
            .await
            .unwrap();

        assert!(active);
        assert_eq!(handler.target().repository().find_all(), vec!["gugu"]);
        assert!(matches!(
            manager.events().as_slice(),
            [TxEvent::Begin(_), TxEvent::Commit(_)]
        ));
    }

    #[tokio::test]
    async fn test_transactional_failure_rolls_back() {
        let (manager, handler) = handler();

        let err = handler
            .invoke(&change_password(), |service: Arc<dyn UserService>| async move {
                service.repository().save("gugu").await;
                Err::<(), BoxError>("history write failed".into())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BeanwireError>(),
            Some(BeanwireError::DataAccess(_))
        ));
        assert!(handler.target().repository().find_all().is_empty());
        assert!(matches!(
            manager.events().as_slice(),
            [TxEvent::Begin(_), TxEvent::Rollback(_)]
        ));
    }

    #[tokio::test]
    async fn test_plain_method_bypasses_transaction() {
        let (manager, handler) = handler();

        let err = handler
            .invoke(&Method::new("find_by_id"), |_service: Arc<dyn UserService>| async move {
                if is_transaction_active() {
                    return Ok(());
                }
                Err::<(), BoxError>("not found".into())
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "not found");
        assert!(err.downcast_ref::<BeanwireError>().is_none());
        assert!(manager.events().is_empty());
    }
}

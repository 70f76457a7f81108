use chrono::Utc;
use marketplace_domain::entities::Task;
use marketplace_domain::repositories::{PaymentRepository, TaskRepository};
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ProcessPaymentRequest;

/// 把外部支付记录关联到任务上，支付本身由外部系统处理
pub struct PaymentService {
    task_repository: Arc<dyn TaskRepository>,
    payment_repository: Arc<dyn PaymentRepository>,
}

impl PaymentService {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        payment_repository: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            task_repository,
            payment_repository,
        }
    }

    #[instrument(skip(self, request), fields(task_id = %request.task_id, payment_id = %request.payment_id))]
    pub async fn process_payment(
        &self,
        employee_id: Uuid,
        request: ProcessPaymentRequest,
    ) -> MarketplaceResult<Task> {
        request.validate()?;

        let mut task = self
            .task_repository
            .find_by_id(request.task_id)
            .await?
            .ok_or(MarketplaceError::TaskNotFound)?;
        let payment = self
            .payment_repository
            .find_by_id(request.payment_id)
            .await?
            .ok_or(MarketplaceError::PaymentNotFound)?;

        task.payment_id = Some(payment.id);
        task.updated_at = Utc::now();
        let updated = self.task_repository.update(&task).await?;

        info!(
            "任务已关联支付: {}, amount={}",
            updated.entity_description(),
            payment.amount
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_testing_utils::{MockRepositories, PaymentBuilder, TaskBuilder};

    fn service(repos: &MockRepositories) -> PaymentService {
        PaymentService::new(repos.tasks.clone(), repos.payments.clone())
    }

    #[tokio::test]
    async fn test_process_payment_attaches_payment() {
        let repos = MockRepositories::new();
        let task = repos.store.insert_task(TaskBuilder::new().build());
        let payment = repos.store.insert_payment(PaymentBuilder::new().build());

        let updated = service(&repos)
            .process_payment(
                Uuid::new_v4(),
                ProcessPaymentRequest {
                    task_id: task.id,
                    payment_id: payment.id,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.payment_id, Some(payment.id));
        assert_eq!(repos.store.task(task.id).unwrap().payment_id, Some(payment.id));
    }

    #[tokio::test]
    async fn test_process_payment_not_found() {
        let repos = MockRepositories::new();
        let task = repos.store.insert_task(TaskBuilder::new().build());
        let svc = service(&repos);

        let err = svc
            .process_payment(
                Uuid::new_v4(),
                ProcessPaymentRequest {
                    task_id: Uuid::new_v4(),
                    payment_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::TaskNotFound));

        let err = svc
            .process_payment(
                Uuid::new_v4(),
                ProcessPaymentRequest {
                    task_id: task.id,
                    payment_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment not found");
        assert!(repos.store.task(task.id).unwrap().payment_id.is_none());
    }
}

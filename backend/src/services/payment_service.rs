use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    authentication::auth::AuthUser,
    create_payment_request::CreatePaymentRequest,
    data_access::data_context::DataContext,
    error::{ApiError, ApiResult},
    notification::{NewNotification, NotificationType, RelatedRef},
    payment::{Payment, PaymentStatus},
    payment_query::PaymentQuery,
    role::Role,
    services::notification_service::NotificationService,
    task::Task,
    update_payment_status_request::UpdatePaymentStatusRequest,
    user::User,
};

const DEFAULT_CURRENCY: &str = "USD";

pub struct PaymentService<'a> {
    data: &'a DataContext,
}

impl<'a> PaymentService<'a> {
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    pub fn create_payment(&self, request: CreatePaymentRequest, actor: &AuthUser) -> ApiResult<Payment> {
        if !(request.amount.is_finite() && request.amount > 0.0) {
            return Err(ApiError::bad_request("Amount must be greater than zero"));
        }
        let task = self
            .data
            .get::<Task>(request.task_id)?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        if self.data.get::<User>(request.payee_id)?.is_none() {
            return Err(ApiError::not_found("Payee not found"));
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            task_id: task.id,
            milestone_id: request.milestone_id,
            payer_id: actor.user_id,
            payee_id: request.payee_id,
            amount: request.amount,
            currency: request
                .currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            status: PaymentStatus::Pending,
            transaction_id: request.transaction_id,
            created_at: now,
            updated_at: now,
        };
        self.data.put(&payment)?;
        info!(payment_id = %payment.id, task_id = %task.id, amount = payment.amount, "payment created");

        NotificationService::new(self.data).notify(NewNotification {
            recipient_id: payment.payee_id,
            message: format!(
                "You have a new payment of {:.2} {} for task: {}",
                payment.amount, payment.currency, task.title
            ),
            kind: NotificationType::Payment,
            related: Some(RelatedRef::payment(payment.id)),
        });
        Ok(payment)
    }

    /// Super admins see every payment; everyone else only payments they sent or receive.
    pub fn list_payments(&self, query: &PaymentQuery, actor: &AuthUser) -> ApiResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .data
            .scan::<Payment>()?
            .into_iter()
            .filter(|p| {
                actor.is(Role::SuperAdmin) || p.payer_id == actor.user_id || p.payee_id == actor.user_id
            })
            .filter(|p| query.payer_id.map_or(true, |id| p.payer_id == id))
            .filter(|p| query.payee_id.map_or(true, |id| p.payee_id == id))
            .filter(|p| query.task_id.map_or(true, |id| p.task_id == id))
            .filter(|p| query.status.map_or(true, |status| p.status == status))
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    pub fn update_payment_status(&self, id: Uuid, request: UpdatePaymentStatusRequest) -> ApiResult<Payment> {
        let payment = self
            .data
            .modify(id, |payment: &mut Payment| -> ApiResult<Payment> {
                payment.status = request.status;
                if let Some(transaction_id) = request.transaction_id {
                    payment.transaction_id = Some(transaction_id);
                }
                payment.updated_at = Utc::now();
                Ok(payment.clone())
            })?
            .ok_or_else(|| ApiError::not_found("Payment not found"))?;
        info!(payment_id = %id, status = ?payment.status, "payment status updated");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_access::data_context::tests::{seed_project, seed_task, seed_user, temp_db},
        notification::Notification,
        task_status::TaskStatus,
    };

    fn request(task_id: Uuid, payee_id: Uuid, amount: f64) -> CreatePaymentRequest {
        CreatePaymentRequest {
            task_id,
            milestone_id: None,
            payee_id,
            amount,
            currency: None,
            transaction_id: None,
        }
    }

    #[test]
    fn payee_is_notified_and_listing_is_scoped() {
        let db = temp_db("payments");
        let service = PaymentService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let dev = seed_user(&db.data, Role::Developer, None);
        let other = seed_user(&db.data, Role::Developer, None);
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "build", TaskStatus::Completed, vec![]);
        let pm = AuthUser { user_id: manager.id, role: manager.role };

        let payment = service.create_payment(request(task.id, dev.id, 120.0), &pm).unwrap();
        assert_eq!(payment.currency, "USD");
        assert_eq!(payment.status, PaymentStatus::Pending);

        let notifications = db.data.scan::<Notification>().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient_id, dev.id);
        assert_eq!(notifications[0].kind, NotificationType::Payment);

        let as_dev = AuthUser { user_id: dev.id, role: dev.role };
        let as_other = AuthUser { user_id: other.id, role: other.role };
        assert_eq!(service.list_payments(&PaymentQuery::default(), &as_dev).unwrap().len(), 1);
        assert!(service.list_payments(&PaymentQuery::default(), &as_other).unwrap().is_empty());
        let completed = PaymentQuery { status: Some(PaymentStatus::Completed), ..Default::default() };
        assert!(service.list_payments(&completed, &pm).unwrap().is_empty());
    }

    #[test]
    fn validation_and_status_update() {
        let db = temp_db("payment_status");
        let service = PaymentService::new(&db.data);
        let manager = seed_user(&db.data, Role::ProjectManager, None);
        let project = seed_project(&db.data, manager.id);
        let task = seed_task(&db.data, project.id, "build", TaskStatus::Completed, vec![]);
        let pm = AuthUser { user_id: manager.id, role: manager.role };

        assert!(matches!(
            service.create_payment(request(task.id, manager.id, 0.0), &pm),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.create_payment(request(task.id, Uuid::new_v4(), 10.0), &pm),
            Err(ApiError::NotFound(_))
        ));

        let payment = service.create_payment(request(task.id, manager.id, 10.0), &pm).unwrap();
        let updated = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Completed,
                    transaction_id: Some("txn_1".into()),
                },
            )
            .unwrap();
        assert_eq!(updated.status, PaymentStatus::Completed);
        assert_eq!(updated.transaction_id.as_deref(), Some("txn_1"));
        assert!(matches!(
            service.update_payment_status(
                Uuid::new_v4(),
                UpdatePaymentStatusRequest { status: PaymentStatus::Failed, transaction_id: None }
            ),
            Err(ApiError::NotFound(_))
        ));
    }
}

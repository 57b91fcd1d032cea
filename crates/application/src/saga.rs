//! The verification saga executor.
//!
//! Owns all consistency logic for the two saga paths:
//!
//! - **intake**: insert a pending record and send the verification mail
//!   inside one transactional scope; the insert only commits once the mail
//!   gateway confirmed the send.
//! - **verify**: delete the record and forward the registration downstream
//!   inside one transactional scope; the delete only commits once the
//!   authentication service accepted the forward.
//!
//! Every non-success exit rolls the open transaction back. The saga never
//! retries in-process; retryable errors surface as a broker disposition and
//! redelivery is the sole retry mechanism.

use std::sync::Arc;

use tracing::{debug, info};

use veriflow_domain::mail::verification_email;
use veriflow_domain::{
    Credential, DomainError, EmailAddress, IntakeMessage, MailSender, RegistrationForwarder,
    VerificationId, VerificationRecord, VerificationStore, VerifyMessage,
};

/// Saga executor over the store, mailer and forwarder ports.
#[derive(Clone)]
pub struct VerificationSaga {
    store: Arc<dyn VerificationStore>,
    mailer: Arc<dyn MailSender>,
    forwarder: Arc<dyn RegistrationForwarder>,
    verify_link_base: String,
}

impl VerificationSaga {
    pub fn new(
        store: Arc<dyn VerificationStore>,
        mailer: Arc<dyn MailSender>,
        forwarder: Arc<dyn RegistrationForwarder>,
        verify_link_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            forwarder,
            verify_link_base: verify_link_base.into(),
        }
    }

    /// Intake path: create the pending record and send the verification
    /// mail.
    ///
    /// The insert transaction stays open across the mail send; commit only
    /// happens after the gateway confirmed delivery, so a record never
    /// exists without its mail. A redelivered intake for an email that
    /// already has a live record fails the unique constraint and is
    /// rejected terminally. Each attempt generates a fresh token.
    pub async fn on_intake(&self, msg: IntakeMessage) -> Result<VerificationId, DomainError> {
        let email = EmailAddress::parse(&msg.email)?;
        let record = VerificationRecord::new(email, Credential::new(msg.password));
        let id = record.id();

        let tx = self.store.insert_pending(&record).await?;

        let mail = verification_email(&self.verify_link_base, id, record.email());
        match self.mailer.send(&mail).await {
            Ok(()) => {
                tx.commit().await?;
                info!(ver_id = %id, email = %record.email(), "pending verification created");
                Ok(id)
            }
            Err(mail_err) => {
                tx.rollback().await?;
                Err(DomainError::MailDeliveryFailed {
                    reason: mail_err.to_string(),
                })
            }
        }
    }

    /// Verification path: consume the token and forward the registration.
    ///
    /// The delete transaction stays open across the downstream call; a
    /// failed forward rolls the delete back so a later redelivery of the
    /// same token can still succeed. A token with no live record is a
    /// terminal no-op, which is the expected outcome for a redelivered
    /// verification message.
    pub async fn on_verify(&self, msg: VerifyMessage) -> Result<(), DomainError> {
        let id = VerificationId::from(msg.ver_id);

        let (record, tx) = self.store.take_pending(id).await?;
        debug!(ver_id = %id, "pending verification claimed, forwarding downstream");

        match self
            .forwarder
            .forward(record.email(), record.credential())
            .await
        {
            Ok(()) => {
                tx.commit().await?;
                info!(ver_id = %id, email = %record.email(), "registration forwarded, saga complete");
                Ok(())
            }
            Err(forward_err) => {
                tx.rollback().await?;
                Err(DomainError::DownstreamForward(forward_err))
            }
        }
    }
}

/// In-memory store for exercising the saga in tests.
///
/// Insert and take apply immediately and are undone by rollback, so a
/// concurrent take of the same token observes "not found" exactly like a
/// blocked-then-empty delete against PostgreSQL.
#[cfg(test)]
pub(crate) mod testkit {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use uuid::Uuid;

    use veriflow_domain::{
        Credential, DomainError, EmailAddress, StoreTransaction, VerificationId,
        VerificationRecord, VerificationStore,
    };

    #[derive(Debug, Default)]
    struct MemState {
        live: HashMap<Uuid, (String, String)>,
        emails: HashSet<String>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct MemStore {
        state: Arc<Mutex<MemState>>,
    }

    impl MemStore {
        pub(crate) fn record_count(&self) -> usize {
            self.state.lock().unwrap().live.len()
        }

        pub(crate) fn contains(&self, id: VerificationId) -> bool {
            self.state.lock().unwrap().live.contains_key(id.as_uuid())
        }
    }

    #[derive(Debug)]
    enum TxOp {
        Insert(Uuid, String),
        Delete(Uuid, String, String),
    }

    #[derive(Debug)]
    struct MemTx {
        state: Arc<Mutex<MemState>>,
        op: TxOp,
    }

    #[async_trait]
    impl StoreTransaction for MemTx {
        async fn commit(self: Box<Self>) -> Result<(), DomainError> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
            let mut state = self.state.lock().unwrap();
            match self.op {
                TxOp::Insert(id, email) => {
                    state.live.remove(&id);
                    state.emails.remove(&email);
                }
                TxOp::Delete(id, email, credential) => {
                    state.emails.insert(email.clone());
                    state.live.insert(id, (email, credential));
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl VerificationStore for MemStore {
        async fn insert_pending(
            &self,
            record: &VerificationRecord,
        ) -> Result<Box<dyn StoreTransaction>, DomainError> {
            let mut state = self.state.lock().unwrap();
            let email = record.email().as_str().to_string();
            if state.emails.contains(&email) {
                return Err(DomainError::DuplicateRegistration {
                    email: record.email().clone(),
                });
            }
            state.emails.insert(email.clone());
            state.live.insert(
                *record.id().as_uuid(),
                (email.clone(), record.credential().expose().to_string()),
            );
            Ok(Box::new(MemTx {
                state: Arc::clone(&self.state),
                op: TxOp::Insert(*record.id().as_uuid(), email),
            }))
        }

        async fn take_pending(
            &self,
            id: VerificationId,
        ) -> Result<(VerificationRecord, Box<dyn StoreTransaction>), DomainError> {
            let mut state = self.state.lock().unwrap();
            let Some((email, credential)) = state.live.remove(id.as_uuid()) else {
                return Err(DomainError::UnknownOrAlreadyConsumedToken { id });
            };
            state.emails.remove(&email);
            let record = VerificationRecord::from_parts(
                id,
                EmailAddress::parse(&email).map_err(|_| DomainError::Store {
                    message: format!("stored email no longer parses: {email}"),
                })?,
                Credential::new(credential.clone()),
            );
            Ok((
                record,
                Box::new(MemTx {
                    state: Arc::clone(&self.state),
                    op: TxOp::Delete(*id.as_uuid(), email, credential),
                }),
            ))
        }
    }
}

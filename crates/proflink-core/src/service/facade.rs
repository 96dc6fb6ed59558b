//! Integrity Facade: the single entry point for callers.
//!
//! Every method opens one store transaction, runs one or more component
//! operations on it, and commits. Opening the transaction and running the
//! operations happen under the caller's timeout; the commit does not. Any
//! error -- including the timeout -- drops the transaction uncommitted, so
//! nothing partial is ever visible. Errors are returned
//! exactly as the failing component produced them; nothing is retried here.

use std::future::Future;
use std::time::Duration;

use proflink_types::aggregate::{CascadeReport, ProfileOverview};
use proflink_types::certificate::{Certificate, NewCertificate};
use proflink_types::config::IntegrityConfig;
use proflink_types::connection::Connection;
use proflink_types::error::IntegrityError;
use proflink_types::ids::{CertificateId, ConnectionId, ProfileId, SkillId};
use proflink_types::profile::{NewProfile, Profile, ProfilePatch};
use proflink_types::skill::{Skill, SkillAssignment};

use crate::repository::connection::ConnectionFilter;
use crate::repository::skill::SkillFilter;
use crate::repository::{Store, StoreTx};
use crate::service::catalog::SkillCatalog;
use crate::service::certificate::CertificateRegistry;
use crate::service::graph::ConnectionGraph;
use crate::service::identity::IdentityStore;
use crate::service::ledger::SkillLedger;

/// Run `$body` inside a transaction opened with `$begin`, committing on
/// success. `$tx` is bound to `&mut Tx` for the body.
///
/// The deadline covers `begin` and the body only. A commit that has started
/// always runs to completion, so `Timeout` never hides a durable write.
macro_rules! transact {
    ($self:ident, $timeout:expr, $begin:ident, |$tx:ident| $body:expr) => {{
        let (guard, out) = $self
            .bounded($timeout, async {
                let mut guard = $self.store.$begin().await?;
                let out = {
                    let $tx = &mut guard;
                    $body
                };
                Ok::<_, IntegrityError>((guard, out))
            })
            .await?;
        guard.commit().await?;
        Ok::<_, IntegrityError>(out)
    }};
}

/// Coordinates the five components over a [`Store`].
///
/// Generic over the store port -- proflink-core never depends on
/// proflink-infra.
pub struct IntegrityFacade<S: Store> {
    store: S,
    config: IntegrityConfig,
    identity: IdentityStore,
    catalog: SkillCatalog,
    ledger: SkillLedger,
    certificates: CertificateRegistry,
    graph: ConnectionGraph,
}

impl<S: Store> IntegrityFacade<S> {
    pub fn new(store: S, config: IntegrityConfig) -> Self {
        let ledger = SkillLedger::new(config.proficiency_bounds());
        Self {
            store,
            config,
            identity: IdentityStore::new(),
            catalog: SkillCatalog::new(),
            ledger,
            certificates: CertificateRegistry::new(),
            graph: ConnectionGraph::new(),
        }
    }

    /// Timeout to use when the caller has no deadline of its own.
    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn bounded<T>(
        &self,
        timeout: Duration,
        work: impl Future<Output = Result<T, IntegrityError>>,
    ) -> Result<T, IntegrityError> {
        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?timeout, "store call timed out; transaction rolled back");
                Err(IntegrityError::Timeout(timeout))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    #[tracing::instrument(skip_all, fields(email = %request.email))]
    pub async fn create_profile(
        &self,
        request: NewProfile,
        timeout: Duration,
    ) -> Result<Profile, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .identity
            .create(tx, request)
            .await?)
    }

    pub async fn get_profile(
        &self,
        id: &ProfileId,
        timeout: Duration,
    ) -> Result<Profile, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self.identity.get(tx, id).await?)
    }

    pub async fn get_profile_by_email(
        &self,
        email: &str,
        timeout: Duration,
    ) -> Result<Profile, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .identity
            .get_by_email(tx, email)
            .await?)
    }

    #[tracing::instrument(skip_all, fields(profile_id = %id))]
    pub async fn update_profile(
        &self,
        id: &ProfileId,
        patch: ProfilePatch,
        timeout: Duration,
    ) -> Result<Profile, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .identity
            .update(tx, id, patch)
            .await?)
    }

    /// Delete a profile and everything that hangs off it, atomically.
    ///
    /// Assignments, certificates and connections (as either party) go first,
    /// then the profile row. If any step fails nothing is removed.
    #[tracing::instrument(skip_all, fields(profile_id = %id))]
    pub async fn delete_profile(
        &self,
        id: &ProfileId,
        timeout: Duration,
    ) -> Result<CascadeReport, IntegrityError> {
        let report = transact!(self, timeout, begin, |tx| {
            self.identity.ensure_exists(tx, id).await?;
            let report = CascadeReport {
                assignments: self.ledger.revoke_all(tx, id).await?,
                certificates: self.certificates.remove_all(tx, id).await?,
                connections: self.graph.purge_profile(tx, id).await?,
            };
            self.identity.delete(tx, id).await?;
            report
        })?;
        tracing::info!(
            assignments = report.assignments,
            certificates = report.certificates,
            connections = report.connections,
            "profile cascade complete"
        );
        Ok(report)
    }

    /// Profile, skills, certificates and connection count from one snapshot.
    pub async fn profile_overview(
        &self,
        id: &ProfileId,
        timeout: Duration,
    ) -> Result<ProfileOverview, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| {
            let profile = self.identity.get(tx, id).await?;
            let skills = self.ledger.assigned_skills(tx, id).await?;
            let certificates = self.certificates.list_for_profile(tx, id).await?;
            let connection_count = self.graph.count_accepted(tx, id).await?;
            ProfileOverview {
                profile,
                skills,
                certificates,
                connection_count,
            }
        })
    }

    // -----------------------------------------------------------------------
    // Skill catalog
    // -----------------------------------------------------------------------

    pub async fn upsert_skill(
        &self,
        name: &str,
        category: Option<&str>,
        timeout: Duration,
    ) -> Result<Skill, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .catalog
            .upsert(tx, name, category)
            .await?)
    }

    pub async fn get_skill(&self, id: &SkillId, timeout: Duration) -> Result<Skill, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self.catalog.get(tx, id).await?)
    }

    pub async fn list_skills(
        &self,
        filter: Option<SkillFilter>,
        timeout: Duration,
    ) -> Result<Vec<Skill>, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .catalog
            .list(tx, filter)
            .await?)
    }

    pub async fn remove_skill(&self, id: &SkillId, timeout: Duration) -> Result<(), IntegrityError> {
        transact!(self, timeout, begin, |tx| self.catalog.remove(tx, id).await?)
    }

    // -----------------------------------------------------------------------
    // Skill assignments
    // -----------------------------------------------------------------------

    #[tracing::instrument(skip_all, fields(profile_id = %profile_id, skill_id = %skill_id))]
    pub async fn assign_skill(
        &self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
        level: i32,
        timeout: Duration,
    ) -> Result<SkillAssignment, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .ledger
            .assign(tx, profile_id, skill_id, level)
            .await?)
    }

    pub async fn update_skill_level(
        &self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
        level: i32,
        timeout: Duration,
    ) -> Result<SkillAssignment, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .ledger
            .update_level(tx, profile_id, skill_id, level)
            .await?)
    }

    /// Idempotent; returns whether an assignment was removed.
    pub async fn revoke_skill(
        &self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
        timeout: Duration,
    ) -> Result<bool, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .ledger
            .revoke(tx, profile_id, skill_id)
            .await?)
    }

    pub async fn list_skills_for_profile(
        &self,
        profile_id: &ProfileId,
        timeout: Duration,
    ) -> Result<Vec<SkillAssignment>, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .ledger
            .list_for_profile(tx, profile_id)
            .await?)
    }

    // -----------------------------------------------------------------------
    // Certificates
    // -----------------------------------------------------------------------

    pub async fn add_certificate(
        &self,
        profile_id: &ProfileId,
        request: NewCertificate,
        timeout: Duration,
    ) -> Result<Certificate, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .certificates
            .add(tx, profile_id, request)
            .await?)
    }

    pub async fn get_certificate(
        &self,
        id: &CertificateId,
        timeout: Duration,
    ) -> Result<Certificate, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .certificates
            .get(tx, id)
            .await?)
    }

    pub async fn remove_certificate(
        &self,
        id: &CertificateId,
        timeout: Duration,
    ) -> Result<(), IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .certificates
            .remove(tx, id)
            .await?)
    }

    pub async fn list_certificates(
        &self,
        profile_id: &ProfileId,
        timeout: Duration,
    ) -> Result<Vec<Certificate>, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .certificates
            .list_for_profile(tx, profile_id)
            .await?)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    #[tracing::instrument(skip_all, fields(requester = %requester, recipient = %recipient))]
    pub async fn request_connection(
        &self,
        requester: &ProfileId,
        recipient: &ProfileId,
        timeout: Duration,
    ) -> Result<Connection, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .graph
            .request(tx, requester, recipient)
            .await?)
    }

    #[tracing::instrument(skip_all, fields(connection_id = %id, actor = %actor))]
    pub async fn accept_connection(
        &self,
        id: &ConnectionId,
        actor: &ProfileId,
        timeout: Duration,
    ) -> Result<Connection, IntegrityError> {
        transact!(self, timeout, begin, |tx| self.graph.accept(tx, id, actor).await?)
    }

    #[tracing::instrument(skip_all, fields(connection_id = %id, actor = %actor))]
    pub async fn reject_connection(
        &self,
        id: &ConnectionId,
        actor: &ProfileId,
        timeout: Duration,
    ) -> Result<Connection, IntegrityError> {
        transact!(self, timeout, begin, |tx| self.graph.reject(tx, id, actor).await?)
    }

    pub async fn cancel_connection(
        &self,
        id: &ConnectionId,
        actor: &ProfileId,
        timeout: Duration,
    ) -> Result<(), IntegrityError> {
        transact!(self, timeout, begin, |tx| self.graph.cancel(tx, id, actor).await?)
    }

    pub async fn disconnect(
        &self,
        id: &ConnectionId,
        actor: &ProfileId,
        timeout: Duration,
    ) -> Result<(), IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .graph
            .disconnect(tx, id, actor)
            .await?)
    }

    #[tracing::instrument(skip_all, fields(actor = %actor, target = %target))]
    pub async fn block(
        &self,
        actor: &ProfileId,
        target: &ProfileId,
        timeout: Duration,
    ) -> Result<Connection, IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .graph
            .block(tx, actor, target)
            .await?)
    }

    pub async fn unblock(
        &self,
        actor: &ProfileId,
        target: &ProfileId,
        timeout: Duration,
    ) -> Result<(), IntegrityError> {
        transact!(self, timeout, begin, |tx| self
            .graph
            .unblock(tx, actor, target)
            .await?)
    }

    pub async fn get_connection(
        &self,
        id: &ConnectionId,
        timeout: Duration,
    ) -> Result<Connection, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self.graph.get(tx, id).await?)
    }

    pub async fn connection_between(
        &self,
        a: &ProfileId,
        b: &ProfileId,
        timeout: Duration,
    ) -> Result<Option<Connection>, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .graph
            .between(tx, a, b)
            .await?)
    }

    pub async fn list_connections(
        &self,
        profile_id: &ProfileId,
        filter: Option<ConnectionFilter>,
        timeout: Duration,
    ) -> Result<Vec<Connection>, IntegrityError> {
        transact!(self, timeout, begin_read, |tx| self
            .graph
            .list_for_profile(tx, profile_id, filter)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use chrono::Utc;
    use proflink_types::connection::ConnectionStatus;
    use proflink_types::error::ErrorKind;

    const T: Duration = Duration::from_secs(5);

    fn facade() -> IntegrityFacade<MemoryStore> {
        IntegrityFacade::new(MemoryStore::new(), IntegrityConfig::default())
    }

    #[tokio::test]
    async fn test_delete_profile_cascades_everything() {
        let facade = facade();
        let a = facade
            .create_profile(NewProfile::new("A", "a@x.com"), T)
            .await
            .unwrap();
        let b = facade
            .create_profile(NewProfile::new("B", "b@x.com"), T)
            .await
            .unwrap();
        let c = facade
            .create_profile(NewProfile::new("C", "c@x.com"), T)
            .await
            .unwrap();
        let rust = facade.upsert_skill("Rust", None, T).await.unwrap();
        facade.assign_skill(&a.id, &rust.id, 3, T).await.unwrap();
        facade.assign_skill(&b.id, &rust.id, 2, T).await.unwrap();
        facade
            .add_certificate(
                &a.id,
                NewCertificate::new("CKA", "CNCF", Utc::now().date_naive()),
                T,
            )
            .await
            .unwrap();
        facade.request_connection(&a.id, &b.id, T).await.unwrap();
        facade.request_connection(&c.id, &a.id, T).await.unwrap();

        let report = facade.delete_profile(&a.id, T).await.unwrap();
        assert_eq!(
            report,
            CascadeReport {
                assignments: 1,
                certificates: 1,
                connections: 2,
            }
        );

        let err = facade.get_profile(&a.id, T).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(facade.list_connections(&b.id, None, T).await.unwrap().is_empty());
        assert!(facade.list_connections(&c.id, None, T).await.unwrap().is_empty());
        // B's assignment of the shared skill is untouched.
        assert_eq!(facade.list_skills_for_profile(&b.id, T).await.unwrap().len(), 1);

        let tables = facade.store().snapshot().await;
        assert!(tables.assignments.iter().all(|r| r.profile_id != a.id));
        assert!(tables.certificates.iter().all(|r| r.profile_id != a.id));
        assert!(tables.connections.iter().all(|r| !r.is_party(&a.id)));
    }

    #[tokio::test]
    async fn test_failed_composite_leaves_no_partial_state() {
        let facade = facade();
        let err = facade.delete_profile(&ProfileId::new(), T).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // A failing upsert inside its transaction commits nothing.
        let err = facade.upsert_skill("   ", None, T).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(facade.store().snapshot().await.skills.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_request_accept_reaccept() {
        let facade = facade();
        let a = facade
            .create_profile(NewProfile::new("A", "a@x.com"), T)
            .await
            .unwrap();
        let b = facade
            .create_profile(NewProfile::new("B", "b@x.com"), T)
            .await
            .unwrap();

        let pending = facade.request_connection(&a.id, &b.id, T).await.unwrap();
        assert_eq!(pending.status, ConnectionStatus::Pending);
        assert_eq!(pending.requester_id, a.id);

        let accepted = facade.accept_connection(&pending.id, &b.id, T).await.unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);

        let err = facade
            .accept_connection(&pending.id, &a.id, T)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_timeout_rolls_back() {
        let facade = facade();
        // Hold the store's single write slot so the facade call cannot start.
        let held = facade.store().begin().await.unwrap();

        let err = facade
            .create_profile(NewProfile::new("A", "a@x.com"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        drop(held);
        assert!(facade.store().snapshot().await.profiles.is_empty());
        facade
            .create_profile(NewProfile::new("A", "a@x.com"), T)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_profile_overview() {
        let facade = facade();
        let a = facade
            .create_profile(NewProfile::new("A", "a@x.com"), T)
            .await
            .unwrap();
        let b = facade
            .create_profile(NewProfile::new("B", "b@x.com"), T)
            .await
            .unwrap();
        let skill = facade.upsert_skill("rust ", Some("language"), T).await.unwrap();
        facade.assign_skill(&a.id, &skill.id, 3, T).await.unwrap();
        let c = facade.request_connection(&b.id, &a.id, T).await.unwrap();
        facade.accept_connection(&c.id, &a.id, T).await.unwrap();

        let overview = facade.profile_overview(&a.id, T).await.unwrap();
        assert_eq!(overview.profile.id, a.id);
        assert_eq!(overview.skills.len(), 1);
        assert_eq!(overview.skills[0].skill.name, "rust");
        assert!(overview.certificates.is_empty());
        assert_eq!(overview.connection_count, 1);
    }

    #[tokio::test]
    async fn test_configured_bounds_reach_ledger() {
        let config = IntegrityConfig {
            proficiency_min: 1,
            proficiency_max: 3,
            ..Default::default()
        };
        let facade = IntegrityFacade::new(MemoryStore::new(), config);
        let a = facade
            .create_profile(NewProfile::new("A", "a@x.com"), T)
            .await
            .unwrap();
        let skill = facade.upsert_skill("Go", None, T).await.unwrap();
        let err = facade.assign_skill(&a.id, &skill.id, 4, T).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

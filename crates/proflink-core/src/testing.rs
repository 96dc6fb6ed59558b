//! In-memory `Store` for unit tests.
//!
//! A transaction takes the store's lock for its whole lifetime and works on a
//! private copy of the tables; commit swaps the copy in, drop discards it.
//! Unique constraints mirror the SQLite schema.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use proflink_types::certificate::Certificate;
use proflink_types::connection::{Connection, ConnectionStatus, Direction, PairKey};
use proflink_types::error::RepositoryError;
use proflink_types::ids::{AssignmentId, CertificateId, ConnectionId, ProfileId, SkillId};
use proflink_types::profile::Profile;
use proflink_types::skill::{Skill, SkillAssignment};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::repository::assignment::AssignmentRepository;
use crate::repository::certificate::CertificateRepository;
use crate::repository::connection::{ConnectionFilter, ConnectionRepository};
use crate::repository::profile::ProfileRepository;
use crate::repository::skill::{SkillFilter, SkillRepository};
use crate::repository::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub profiles: Vec<Profile>,
    pub skills: Vec<Skill>,
    pub assignments: Vec<SkillAssignment>,
    pub certificates: Vec<Certificate>,
    pub connections: Vec<Connection>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state, for assertions.
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

pub(crate) struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = (*guard).clone();
        Ok(MemoryTx { guard, work })
    }
}

impl StoreTx for MemoryTx {
    async fn commit(self) -> Result<(), RepositoryError> {
        let MemoryTx { mut guard, work } = self;
        *guard = work;
        Ok(())
    }
}

fn conflict(msg: &str) -> RepositoryError {
    RepositoryError::Conflict(msg.to_string())
}

impl ProfileRepository for MemoryTx {
    async fn insert_profile(&mut self, profile: &Profile) -> Result<(), RepositoryError> {
        let profiles = &mut self.work.profiles;
        if profiles
            .iter()
            .any(|p| p.id == profile.id || p.email == profile.email)
        {
            return Err(conflict("UNIQUE constraint failed: profiles"));
        }
        profiles.push(profile.clone());
        Ok(())
    }

    async fn find_profile(&mut self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.work.profiles.iter().find(|p| p.id == *id).cloned())
    }

    async fn find_profile_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.work.profiles.iter().find(|p| p.email == email).cloned())
    }

    async fn update_profile(&mut self, profile: &Profile) -> Result<(), RepositoryError> {
        let profiles = &mut self.work.profiles;
        if profiles
            .iter()
            .any(|p| p.id != profile.id && p.email == profile.email)
        {
            return Err(conflict("UNIQUE constraint failed: profiles.email"));
        }
        let slot = profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = profile.clone();
        Ok(())
    }

    async fn delete_profile(&mut self, id: &ProfileId) -> Result<bool, RepositoryError> {
        let before = self.work.profiles.len();
        self.work.profiles.retain(|p| p.id != *id);
        Ok(self.work.profiles.len() != before)
    }
}

impl SkillRepository for MemoryTx {
    async fn insert_skill(&mut self, skill: &Skill) -> Result<(), RepositoryError> {
        let key = skill.name_key();
        if self.work.skills.iter().any(|s| s.name_key() == key) {
            return Err(conflict("UNIQUE constraint failed: skills.name_key"));
        }
        self.work.skills.push(skill.clone());
        Ok(())
    }

    async fn find_skill(&mut self, id: &SkillId) -> Result<Option<Skill>, RepositoryError> {
        Ok(self.work.skills.iter().find(|s| s.id == *id).cloned())
    }

    async fn find_skill_by_key(&mut self, name_key: &str) -> Result<Option<Skill>, RepositoryError> {
        Ok(self
            .work
            .skills
            .iter()
            .find(|s| s.name_key() == name_key)
            .cloned())
    }

    async fn update_skill_category(
        &mut self,
        id: &SkillId,
        category: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let skill = self
            .work
            .skills
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        skill.category = category.map(str::to_string);
        Ok(())
    }

    async fn list_skills(&mut self, filter: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
        let mut skills: Vec<Skill> = self
            .work
            .skills
            .iter()
            .filter(|s| filter.category.is_none() || s.category == filter.category)
            .cloned()
            .collect();
        skills.sort_by(|a, b| (a.name_key(), a.id).cmp(&(b.name_key(), b.id)));
        Ok(skills)
    }

    async fn delete_skill(&mut self, id: &SkillId) -> Result<bool, RepositoryError> {
        if self.work.assignments.iter().any(|a| a.skill_id == *id) {
            return Err(conflict("FOREIGN KEY constraint failed"));
        }
        let before = self.work.skills.len();
        self.work.skills.retain(|s| s.id != *id);
        Ok(self.work.skills.len() != before)
    }
}

impl AssignmentRepository for MemoryTx {
    async fn insert_assignment(&mut self, assignment: &SkillAssignment) -> Result<(), RepositoryError> {
        if self.work.assignments.iter().any(|a| {
            a.profile_id == assignment.profile_id && a.skill_id == assignment.skill_id
        }) {
            return Err(conflict("UNIQUE constraint failed: user_skills"));
        }
        self.work.assignments.push(assignment.clone());
        Ok(())
    }

    async fn find_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<Option<SkillAssignment>, RepositoryError> {
        Ok(self
            .work
            .assignments
            .iter()
            .find(|a| a.profile_id == *profile_id && a.skill_id == *skill_id)
            .cloned())
    }

    async fn update_assignment_level(
        &mut self,
        id: &AssignmentId,
        level: i32,
    ) -> Result<(), RepositoryError> {
        let assignment = self
            .work
            .assignments
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        assignment.proficiency_level = level;
        Ok(())
    }

    async fn delete_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<bool, RepositoryError> {
        let before = self.work.assignments.len();
        self.work
            .assignments
            .retain(|a| !(a.profile_id == *profile_id && a.skill_id == *skill_id));
        Ok(self.work.assignments.len() != before)
    }

    async fn list_assignments(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillAssignment>, RepositoryError> {
        let mut rows: Vec<SkillAssignment> = self
            .work
            .assignments
            .iter()
            .filter(|a| a.profile_id == *profile_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.created_at, a.id));
        Ok(rows)
    }

    async fn delete_assignments_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let before = self.work.assignments.len();
        self.work.assignments.retain(|a| a.profile_id != *profile_id);
        Ok((before - self.work.assignments.len()) as u64)
    }

    async fn count_assignments_for_skill(&mut self, skill_id: &SkillId) -> Result<u64, RepositoryError> {
        Ok(self
            .work
            .assignments
            .iter()
            .filter(|a| a.skill_id == *skill_id)
            .count() as u64)
    }
}

impl CertificateRepository for MemoryTx {
    async fn insert_certificate(&mut self, certificate: &Certificate) -> Result<(), RepositoryError> {
        self.work.certificates.push(certificate.clone());
        Ok(())
    }

    async fn find_certificate(
        &mut self,
        id: &CertificateId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self.work.certificates.iter().find(|c| c.id == *id).cloned())
    }

    async fn delete_certificate(&mut self, id: &CertificateId) -> Result<bool, RepositoryError> {
        let before = self.work.certificates.len();
        self.work.certificates.retain(|c| c.id != *id);
        Ok(self.work.certificates.len() != before)
    }

    async fn list_certificates(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Certificate>, RepositoryError> {
        let mut rows: Vec<Certificate> = self
            .work
            .certificates
            .iter()
            .filter(|c| c.profile_id == *profile_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn delete_certificates_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let before = self.work.certificates.len();
        self.work.certificates.retain(|c| c.profile_id != *profile_id);
        Ok((before - self.work.certificates.len()) as u64)
    }
}

impl ConnectionRepository for MemoryTx {
    async fn insert_connection(&mut self, connection: &Connection) -> Result<(), RepositoryError> {
        let key = connection.pair_key();
        if connection.status.is_live()
            && self
                .work
                .connections
                .iter()
                .any(|c| c.status.is_live() && c.pair_key() == key)
        {
            return Err(conflict("UNIQUE constraint failed: connections.pair_key"));
        }
        self.work.connections.push(connection.clone());
        Ok(())
    }

    async fn find_connection(
        &mut self,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, RepositoryError> {
        Ok(self.work.connections.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_live_connection(
        &mut self,
        pair: &PairKey,
    ) -> Result<Option<Connection>, RepositoryError> {
        Ok(self
            .work
            .connections
            .iter()
            .find(|c| c.status.is_live() && c.pair_key() == *pair)
            .cloned())
    }

    async fn transition_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
        next: ConnectionStatus,
        blocked_by: Option<&ProfileId>,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        match self
            .work
            .connections
            .iter_mut()
            .find(|c| c.id == *id && c.status == expected)
        {
            Some(connection) => {
                connection.status = next;
                connection.blocked_by = blocked_by.copied();
                connection.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
    ) -> Result<bool, RepositoryError> {
        let before = self.work.connections.len();
        self.work
            .connections
            .retain(|c| !(c.id == *id && c.status == expected));
        Ok(self.work.connections.len() != before)
    }

    async fn list_connections(
        &mut self,
        profile_id: &ProfileId,
        filter: &ConnectionFilter,
    ) -> Result<Vec<Connection>, RepositoryError> {
        let mut rows: Vec<Connection> = self
            .work
            .connections
            .iter()
            .filter(|c| match filter.direction {
                Direction::Outgoing => c.requester_id == *profile_id,
                Direction::Incoming => c.recipient_id == *profile_id,
                Direction::Any => c.is_party(profile_id),
            })
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn count_connections(
        &mut self,
        profile_id: &ProfileId,
        status: ConnectionStatus,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .work
            .connections
            .iter()
            .filter(|c| c.status == status && c.is_party(profile_id))
            .count() as u64)
    }

    async fn delete_connections_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let before = self.work.connections.len();
        self.work.connections.retain(|c| !c.is_party(profile_id));
        Ok((before - self.work.connections.len()) as u64)
    }
}

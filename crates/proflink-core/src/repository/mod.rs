//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (proflink-infra) implements. The core crate never depends on any
//! specific storage technology.
//!
//! Every repository method runs inside a transaction handle obtained from a
//! [`Store`]. Nothing is written until [`StoreTx::commit`] succeeds; dropping
//! a handle without committing rolls everything back.

pub mod assignment;
pub mod certificate;
pub mod connection;
pub mod profile;
pub mod skill;

use proflink_types::error::RepositoryError;

use self::assignment::AssignmentRepository;
use self::certificate::CertificateRepository;
use self::connection::ConnectionRepository;
use self::profile::ProfileRepository;
use self::skill::SkillRepository;

/// A transaction against the backing store, exposing all five tables.
pub trait StoreTx:
    ProfileRepository
    + SkillRepository
    + AssignmentRepository
    + CertificateRepository
    + ConnectionRepository
    + Send
{
    /// Make every write performed through this handle durable.
    fn commit(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Entry point to the backing store.
///
/// Implementations are cheap to share across concurrent callers (typically a
/// connection pool) and must serialize conflicting writes themselves: the
/// core never takes in-process locks.
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Open a transaction that may write.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Tx, RepositoryError>> + Send;

    /// Open a transaction for reads only. Defaults to [`Store::begin`].
    fn begin_read(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Tx, RepositoryError>> + Send {
        self.begin()
    }
}

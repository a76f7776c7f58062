// src/repositories/mod.rs
//! Stateful components over the shared pool. Each one owns its
//! transactional boundary and hands back committed results only.

use async_trait::async_trait;
use crate::auth::StaffRole;
use crate::error::ApiResult;
use crate::models::{NewStaffAccount, StaffAccount};

pub mod deadstock;
pub mod equipment;
pub mod labs;
pub mod notifications;
pub mod requests;
pub mod staff;

pub use deadstock::DeadstockLedger;
pub use equipment::EquipmentRegistry;
pub use labs::LabProvisioner;
pub use notifications::NotificationDispatcher;
pub use requests::RequestWorkflow;
pub use staff::RoleRepository;

/// Account storage for one staff role
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Role whose table this repository reads and writes
    fn role(&self) -> StaffRole;

    /// Looks an account up by its login email
    async fn find_by_credential(&self, email: &str) -> ApiResult<Option<StaffAccount>>;

    /// Registers an account, hashing its password
    async fn create(&self, account: NewStaffAccount) -> ApiResult<StaffAccount>;

    async fn count(&self) -> ApiResult<i64>;
}

//! User preferences that outlive a session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Nag the user to back up the wallet
    #[serde(default)]
    pub remind_backup: bool,
    /// Last successful backup export (unix seconds)
    #[serde(default)]
    pub last_backup_time: Option<u64>,
    /// Last successful restore (unix seconds)
    #[serde(default)]
    pub last_restore_time: Option<u64>,
}

impl Preferences {
    pub fn remind_backup(&self) -> bool {
        self.remind_backup
    }

    /// The wallet has keys that exist nowhere else.
    pub fn arm_backup_reminder(&mut self) {
        self.remind_backup = true;
    }

    /// The wallet's keys are safe in a backup.
    pub fn disarm_backup_reminder(&mut self) {
        self.remind_backup = false;
    }
}

use fleet_backup::BackupContext;

pub struct AppState {
    pub backups: BackupContext,
}

impl AppState {
    pub fn new(backups: BackupContext) -> Self {
        Self { backups }
    }
}

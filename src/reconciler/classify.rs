use crate::transfer::TransferFile;

/// Aggregate state of one watched directory for a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryVerdict {
    /// Something is still moving, or nothing is reported yet.
    Pending,
    /// Every file completed successfully.
    Succeeded,
    /// Every file is terminal and at least one did not succeed.
    Failed,
}

impl DirectoryVerdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DirectoryVerdict::Pending)
    }
}

/// Classify a directory from the files currently reported for it.
///
/// Partial success is a failure: a directory is only usable when every file
/// arrived.
pub fn classify(files: &[TransferFile]) -> DirectoryVerdict {
    if files.is_empty() || files.iter().any(|f| !f.state.is_terminal()) {
        return DirectoryVerdict::Pending;
    }
    if files.iter().all(|f| f.state.is_success()) {
        DirectoryVerdict::Succeeded
    } else {
        DirectoryVerdict::Failed
    }
}

//! Shared constants for end-to-end tests
//!
//! When test data changes (album labels, peers, remote paths), update only
//! this file.

// ============================================================================
// Albums
// ============================================================================

/// Album with a year
pub const ALBUM_1: &str = "Bowel Erosion - Death Is the Orgasm of Life (2023)";

/// Canonical directory of ALBUM_1, relative to the downloads root
pub const ALBUM_1_TARGET: &str = "Bowel Erosion/Death Is the Orgasm of Life (2023)";

/// Album used by the end-to-end organize scenario
pub const ALBUM_2: &str = "Artist - Some Album (2020)";

/// Canonical directory of ALBUM_2, relative to the downloads root
pub const ALBUM_2_TARGET: &str = "Artist/Some Album (2020)";

/// Album without a year
pub const ALBUM_3: &str = "Organ Failure - Demo";

// ============================================================================
// Peers and remote directories
// ============================================================================

pub const PEER_1: &str = "fknkb";
pub const PEER_2: &str = "grindlover";
pub const PEER_3: &str = "slowpeer";

/// ALBUM_1 as shared by PEER_1, Windows separators
pub const ALBUM_1_REMOTE_1: &str =
    "@@fknkb\\Library\\Bowel Erosion\\Death Is the Orgasm of Life (2023)";

/// ALBUM_1 as shared by PEER_2, under a different local folder name
pub const ALBUM_1_REMOTE_2: &str = "Music\\Bowel Erosion\\Death Is the Orgasm of Life";

/// ALBUM_2 as shared by PEER_1
pub const ALBUM_2_REMOTE: &str = "Library\\Artist\\Some Album (2020)";

/// ALBUM_3 as shared by PEER_3, POSIX separators
pub const ALBUM_3_REMOTE: &str = "Music/grind/Organ Failure/Demo";

// ============================================================================
// Transfer states
// ============================================================================

pub const SUCCEEDED: &str = "Completed, Succeeded";
pub const ERRORED: &str = "Completed, Errored";
pub const REJECTED: &str = "Completed, Rejected";
pub const IN_PROGRESS: &str = "InProgress";

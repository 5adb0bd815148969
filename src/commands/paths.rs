use std::path::{Path, PathBuf};

/// Steam app id of the game, used by the Proton prefix on Linux.
const STEAM_APP_ID: &str = "306130";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    MacOs,
    Other,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else {
            TargetOs::Other
        }
    }
}

/// Default add-on directory of the live game client.
pub fn default_install_dir(os: TargetOs, home: &Path) -> PathBuf {
    let documents = match os {
        TargetOs::Windows => home.join("My Documents"),
        TargetOs::MacOs => home.join("Documents"),
        // Proton keeps a Windows profile inside the Steam prefix
        TargetOs::Other => home
            .join(".steam")
            .join("steamapps")
            .join("compatdata")
            .join(STEAM_APP_ID)
            .join("pfx")
            .join("drive_c")
            .join("users")
            .join("steamuser")
            .join("My Documents"),
    };

    documents
        .join("Elder Scrolls Online")
        .join("live")
        .join("AddOns")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_install_dir_windows() {
        let dir = default_install_dir(TargetOs::Windows, Path::new("C:/Users/user"));
        assert_eq!(
            dir,
            Path::new("C:/Users/user")
                .join("My Documents")
                .join("Elder Scrolls Online")
                .join("live")
                .join("AddOns")
        );
    }

    #[test]
    fn test_default_install_dir_macos() {
        let dir = default_install_dir(TargetOs::MacOs, Path::new("/Users/user"));
        assert_eq!(
            dir,
            PathBuf::from("/Users/user/Documents/Elder Scrolls Online/live/AddOns")
        );
    }

    #[test]
    fn test_default_install_dir_proton() {
        let dir = default_install_dir(TargetOs::Other, Path::new("/home/user"));
        assert_eq!(
            dir,
            PathBuf::from(
                "/home/user/.steam/steamapps/compatdata/306130/pfx/drive_c/users/steamuser/My Documents/Elder Scrolls Online/live/AddOns"
            )
        );
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_current_os() {
        assert_eq!(TargetOs::current(), TargetOs::Other);
    }
}

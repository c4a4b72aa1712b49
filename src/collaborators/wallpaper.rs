use log::{debug, info};
use std::{
    error::Error,
    ffi::OsStr,
    fmt::{self, Display},
    io,
    path::Path,
    process::{Command, ExitStatus},
};

/// The reasons setting the desktop background can fail.
#[derive(Debug)]
pub enum SetWallpaperError {
    /// The operating system or desktop environment is not supported.
    UnsupportedEnvironment(String),
    /// A command could not be started, or the image path could not be resolved.
    Io(io::Error),
    /// A command exited unsuccessfully.
    CommandFailed {
        /// The program that failed.
        program: String,
        /// Its exit status.
        status: ExitStatus,
    },
}

impl Display for SetWallpaperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedEnvironment(env) => write!(f, "unsupported environment: {env}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::CommandFailed { program, status } => write!(f, "`{program}` failed with {status}"),
        }
    }
}

impl Error for SetWallpaperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SetWallpaperError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Something that can make an image file the desktop background.
pub trait WallpaperSetter {
    /// Sets the image at `path` as the desktop background.
    ///
    /// # Errors
    /// [`SetWallpaperError::UnsupportedEnvironment`] if the current desktop cannot be handled,
    /// otherwise implementation specific.
    fn apply(&self, path: &Path) -> Result<(), SetWallpaperError>;
}

/// A desktop whose background can be set through its command line tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Desktop {
    /// macOS, through the Finder.
    MacOs,
    /// Windows, through the registry.
    Windows,
    /// GNOME, through `gsettings`.
    Gnome,
    /// KDE Plasma, through `qdbus`.
    Kde,
    /// XFCE, through `xfconf-query`.
    Xfce,
    /// MATE, through `gsettings`.
    Mate,
}

impl Desktop {
    /// Detects the desktop of the running process.
    ///
    /// # Errors
    /// Returns [`SetWallpaperError::UnsupportedEnvironment`] if no supported desktop is found.
    pub fn detect() -> Result<Self, SetWallpaperError> {
        Self::from_env(std::env::consts::OS, |key| std::env::var(key).ok())
    }

    /// Detects the desktop from the name of the operating system
    /// (as in [`std::env::consts::OS`]) and an environment variable lookup.
    ///
    /// On Linux and the BSDs, `XDG_CURRENT_DESKTOP`, `GNOME_DESKTOP_SESSION_ID`
    /// and `DESKTOP_SESSION` are consulted.
    ///
    /// # Errors
    /// Returns [`SetWallpaperError::UnsupportedEnvironment`] if no supported desktop is found.
    pub fn from_env(
        os: &str,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SetWallpaperError> {
        match os {
            "macos" => return Ok(Self::MacOs),
            "windows" => return Ok(Self::Windows),
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => (),
            _ => return Err(SetWallpaperError::UnsupportedEnvironment(format!("platform {os}"))),
        }

        let current = var("XDG_CURRENT_DESKTOP").unwrap_or_default();
        // e.g. `ubuntu:GNOME`
        let is_current = |name: &str| current.split(':').any(|desktop| desktop == name);
        let session = var("DESKTOP_SESSION").unwrap_or_default();

        if is_current("GNOME") || var("GNOME_DESKTOP_SESSION_ID").is_some() {
            Ok(Self::Gnome)
        } else if is_current("KDE") {
            Ok(Self::Kde)
        } else if session == "xfce" {
            Ok(Self::Xfce)
        } else if session == "mate" {
            Ok(Self::Mate)
        } else {
            Err(SetWallpaperError::UnsupportedEnvironment(format!(
                "desktop session `{session}`"
            )))
        }
    }

    /// Builds the commands that set `path` as the background, to be run in order.
    ///
    /// `path` should be absolute.
    #[must_use]
    pub fn commands(self, path: &Path) -> Vec<Command> {
        let path = path.display();
        match self {
            Self::MacOs => vec![command(
                "osascript",
                [
                    "-e".to_owned(),
                    format!(
                        "tell application \"Finder\" to set desktop picture to POSIX file \"{path}\""
                    ),
                ],
            )],
            Self::Windows => vec![command(
                "reg",
                [
                    "add".to_owned(),
                    r"HKEY_CURRENT_USER\Control Panel\Desktop".to_owned(),
                    "/v".to_owned(),
                    "Wallpaper".to_owned(),
                    "/t".to_owned(),
                    "REG_SZ".to_owned(),
                    "/d".to_owned(),
                    path.to_string(),
                    "/f".to_owned(),
                ],
            )],
            Self::Gnome => {
                let uri = format!("file://{path}");
                let gsettings = |key: &str, value: &str| {
                    command("gsettings", ["set", "org.gnome.desktop.background", key, value])
                };
                vec![
                    gsettings("picture-uri", &uri),
                    gsettings("picture-uri-dark", &uri),
                    gsettings("picture-options", "zoom"),
                ]
            }
            Self::Kde => vec![command(
                "qdbus",
                [
                    "org.kde.plasmashell".to_owned(),
                    "/PlasmaShell".to_owned(),
                    "org.kde.PlasmaShell.evaluateScript".to_owned(),
                    format!(
                        "var Desktops = desktops(); \
                         for (i = 0; i < Desktops.length; i++) {{ \
                         d = Desktops[i]; \
                         d.wallpaperPlugin = \"org.kde.image\"; \
                         d.currentConfigGroup = Array(\"Wallpaper\", \"org.kde.image\", \"General\"); \
                         d.writeConfig(\"Image\", \"file://{path}\") }}"
                    ),
                ],
            )],
            Self::Xfce => vec![command(
                "xfconf-query",
                [
                    "-c".to_owned(),
                    "xfce4-desktop".to_owned(),
                    "-p".to_owned(),
                    "/backdrop/screen0/monitor0/image-path".to_owned(),
                    "-s".to_owned(),
                    path.to_string(),
                ],
            )],
            Self::Mate => vec![command(
                "gsettings",
                [
                    "set".to_owned(),
                    "org.mate.background".to_owned(),
                    "picture-filename".to_owned(),
                    path.to_string(),
                ],
            )],
        }
    }
}

impl Display for Desktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
            Self::Gnome => "GNOME",
            Self::Kde => "KDE",
            Self::Xfce => "XFCE",
            Self::Mate => "MATE",
        };
        f.write_str(name)
    }
}

/// Creates a [`Command`] for `program` with `args`.
fn command<S: AsRef<OsStr>>(program: &str, args: impl IntoIterator<Item = S>) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    command
}

/// A [`WallpaperSetter`] that runs the command line tools of a [`Desktop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandSetter {
    /// The targeted desktop.
    desktop: Desktop,
}

impl CommandSetter {
    /// Creates a new [`CommandSetter`] for `desktop`.
    #[must_use]
    pub const fn new(desktop: Desktop) -> Self {
        Self { desktop }
    }

    /// Creates a new [`CommandSetter`] for the desktop of the running process.
    ///
    /// # Errors
    /// Same as [`Desktop::detect`].
    pub fn detect() -> Result<Self, SetWallpaperError> {
        Desktop::detect().map(Self::new)
    }

    /// The targeted desktop.
    #[must_use]
    pub const fn desktop(&self) -> Desktop {
        self.desktop
    }
}

impl WallpaperSetter for CommandSetter {
    fn apply(&self, path: &Path) -> Result<(), SetWallpaperError> {
        let path = std::path::absolute(path)?;
        info!("setting {} as the {} background", path.display(), self.desktop);

        for mut command in self.desktop.commands(&path) {
            debug!("running {}", command.get_program().to_string_lossy());
            let status = command.status()?;
            if !status.success() {
                return Err(SetWallpaperError::CommandFailed {
                    program: command.get_program().to_string_lossy().into_owned(),
                    status,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn linux(vars: &[(&str, &str)]) -> Result<Desktop, SetWallpaperError> {
        let vars = vars
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect::<HashMap<_, _>>();
        Desktop::from_env("linux", |key| vars.get(key).cloned())
    }

    fn args(command: &Command) -> Vec<String> {
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn detect_platforms() {
        let none = |_: &str| None;
        assert_eq!(Desktop::from_env("macos", none).unwrap(), Desktop::MacOs);
        assert_eq!(Desktop::from_env("windows", none).unwrap(), Desktop::Windows);
        assert!(matches!(
            Desktop::from_env("ios", none),
            Err(SetWallpaperError::UnsupportedEnvironment(_))
        ));
    }

    #[test]
    fn detect_linux_desktops() {
        assert_eq!(linux(&[("XDG_CURRENT_DESKTOP", "GNOME")]).unwrap(), Desktop::Gnome);
        assert_eq!(linux(&[("XDG_CURRENT_DESKTOP", "ubuntu:GNOME")]).unwrap(), Desktop::Gnome);
        assert_eq!(
            linux(&[("GNOME_DESKTOP_SESSION_ID", "this-is-deprecated")]).unwrap(),
            Desktop::Gnome
        );
        assert_eq!(linux(&[("XDG_CURRENT_DESKTOP", "KDE")]).unwrap(), Desktop::Kde);
        assert_eq!(linux(&[("DESKTOP_SESSION", "xfce")]).unwrap(), Desktop::Xfce);
        assert_eq!(linux(&[("DESKTOP_SESSION", "mate")]).unwrap(), Desktop::Mate);
        assert_eq!(
            linux(&[("XDG_CURRENT_DESKTOP", "KDE"), ("GNOME_DESKTOP_SESSION_ID", "1")]).unwrap(),
            Desktop::Gnome
        );

        let err = linux(&[("DESKTOP_SESSION", "sway")]).unwrap_err();
        assert_eq!(err.to_string(), "unsupported environment: desktop session `sway`");
        assert!(linux(&[]).is_err());
    }

    #[test]
    fn gnome_commands() {
        let commands = Desktop::Gnome.commands(Path::new("/tmp/wall.png"));
        let commands = commands.iter().map(args).collect::<Vec<_>>();
        let gsettings = |key, value| ["gsettings", "set", "org.gnome.desktop.background", key, value];
        assert_eq!(
            commands,
            [
                gsettings("picture-uri", "file:///tmp/wall.png"),
                gsettings("picture-uri-dark", "file:///tmp/wall.png"),
                gsettings("picture-options", "zoom"),
            ]
        );
    }

    #[test]
    fn single_commands() {
        let path = Path::new("/tmp/wall.png");
        let single = |desktop: Desktop| {
            let commands = desktop.commands(path);
            assert_eq!(commands.len(), 1);
            args(&commands[0])
        };

        assert_eq!(
            single(Desktop::MacOs),
            [
                "osascript",
                "-e",
                "tell application \"Finder\" to set desktop picture to POSIX file \"/tmp/wall.png\""
            ]
        );
        assert_eq!(
            single(Desktop::Xfce),
            [
                "xfconf-query",
                "-c",
                "xfce4-desktop",
                "-p",
                "/backdrop/screen0/monitor0/image-path",
                "-s",
                "/tmp/wall.png"
            ]
        );
        assert_eq!(
            single(Desktop::Mate),
            ["gsettings", "set", "org.mate.background", "picture-filename", "/tmp/wall.png"]
        );
        assert_eq!(
            single(Desktop::Windows),
            [
                "reg",
                "add",
                r"HKEY_CURRENT_USER\Control Panel\Desktop",
                "/v",
                "Wallpaper",
                "/t",
                "REG_SZ",
                "/d",
                "/tmp/wall.png",
                "/f"
            ]
        );

        let kde = single(Desktop::Kde);
        assert_eq!(
            kde[..4],
            ["qdbus", "org.kde.plasmashell", "/PlasmaShell", "org.kde.PlasmaShell.evaluateScript"]
        );
        assert!(kde[4].contains("d.writeConfig(\"Image\", \"file:///tmp/wall.png\")"));
    }
}

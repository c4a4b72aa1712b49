use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};
use rand::Rng;
use std::{
    error::Error,
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

/// The `chrono` format of a [`DayCode`].
const FORMAT: &str = "%y%m%d";

/// A calendar day in the `yymmdd` form used to name the daily images, e.g., `180626`.
///
/// Two digit years below `69` are in the 2000s, the rest in the 1900s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayCode(NaiveDate);

/// The error returned when a string is not a valid [`DayCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDayCode(pub String);

impl Display for InvalidDayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a yymmdd day code", self.0)
    }
}

impl Error for InvalidDayCode {}

impl DayCode {
    /// The day the daily illustrations start.
    pub const FIRST: Self = match NaiveDate::from_ymd_opt(2013, 1, 1) {
        Some(date) => Self(date),
        None => panic!("invalid first day"),
    };

    /// Creates a [`DayCode`] from its parts.
    ///
    /// # Errors
    /// Returns an error if the year is above `99` or the parts do not name a real calendar day,
    /// e.g., February 30th.
    pub fn new(year: u8, month: u8, day: u8) -> Result<Self, InvalidDayCode> {
        format!("{year:02}{month:02}{day:02}").parse()
    }

    /// The current day in the local time zone.
    #[must_use]
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Picks a uniformly random day from [`DayCode::FIRST`] up to and including today.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::random_between(rng, Self::FIRST, Self::today())
    }

    /// Picks a uniformly random day between `first` and `last`, both included.
    #[must_use]
    pub fn random_between<R: Rng + ?Sized>(rng: &mut R, first: Self, last: Self) -> Self {
        let (first, last) = (first.min(last), first.max(last));
        let day = rng.gen_range(first.0.num_days_from_ce()..=last.0.num_days_from_ce());
        NaiveDate::from_num_days_from_ce_opt(day).map_or(first, Self)
    }

    /// The calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// The two digit year.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn year(&self) -> u8 {
        self.0.year().rem_euclid(100) as u8
    }

    /// The month, starting at `1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn month(&self) -> u8 {
        self.0.month() as u8
    }

    /// The day of the month, starting at `1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn day(&self) -> u8 {
        self.0.day() as u8
    }
}

impl FromStr for DayCode {
    type Err = InvalidDayCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDayCode(s.to_owned());
        // chrono also accepts signs and shorter fields
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(s, FORMAT).map(Self).map_err(|_| invalid())
    }
}

impl Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

/// Something that can provide the encoded images published for a day.
pub trait ImageSource {
    /// The error type returned when fetching fails.
    type Error;

    /// Returns the encoded bytes of every image for `day`, in a stable order.
    ///
    /// An empty `Vec` means nothing was published for that day.
    ///
    /// # Errors
    /// Implementation specific.
    fn fetch(&self, day: DayCode) -> Result<Vec<Vec<u8>>, Self::Error>;
}

/// Image file extensions considered by [`DirectorySource`].
const EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

/// A marker in the name of the small preview images that sit next to the full size ones.
const PREVIEW_MARKER: &str = "250x250";

/// An [`ImageSource`] reading from a local cache directory.
///
/// A file belongs to a day if its name starts with the [`DayCode`]
/// and ends in `.jpg`, `.png` or `.gif`. Preview images containing `250x250` are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    /// The cache directory.
    dir: PathBuf,
}

impl DirectorySource {
    /// Creates a new [`DirectorySource`] over `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the paths of the images for `day`, sorted by file name.
    ///
    /// A missing directory counts as empty.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be read.
    pub fn paths(&self, day: DayCode) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("cache directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let prefix = day.to_string();
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if is_day_image(&path, &prefix) {
                paths.push(path);
            }
        }
        paths.sort_unstable();

        info!("found {} images for {day} in {}", paths.len(), self.dir.display());
        Ok(paths)
    }
}

/// Whether the file name at `path` marks it as a full size image of the day named by `prefix`.
fn is_day_image(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)));

    has_extension && name.starts_with(prefix) && !name.contains(PREVIEW_MARKER)
}

impl ImageSource for DirectorySource {
    type Error = io::Error;

    fn fetch(&self, day: DayCode) -> Result<Vec<Vec<u8>>, Self::Error> {
        self.paths(day)?.iter().map(fs::read).collect()
    }
}

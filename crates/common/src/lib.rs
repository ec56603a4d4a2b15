use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four play counters kept on every song.
///
/// `Weekly`, `Monthly` and `Yearly` are labels tied to an external reset
/// cadence; nothing here checks calendar boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayWindow {
    Total,
    Weekly,
    Monthly,
    Yearly,
}

impl PlayWindow {
    pub const ALL: [PlayWindow; 4] = [
        PlayWindow::Total,
        PlayWindow::Weekly,
        PlayWindow::Monthly,
        PlayWindow::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlayWindow::Total => "total",
            PlayWindow::Weekly => "weekly",
            PlayWindow::Monthly => "monthly",
            PlayWindow::Yearly => "yearly",
        }
    }

    /// `Total` only ever grows; the other three can be zeroed.
    pub fn is_resettable(self) -> bool {
        !matches!(self, PlayWindow::Total)
    }
}

impl fmt::Display for PlayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownWindow(pub String);

impl fmt::Display for UnknownWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown play window: {:?}", self.0)
    }
}

impl std::error::Error for UnknownWindow {}

impl FromStr for PlayWindow {
    type Err = UnknownWindow;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        let name = lower.strip_suffix("plays").unwrap_or(&lower);
        match name {
            "total" | "all" => Ok(PlayWindow::Total),
            "weekly" => Ok(PlayWindow::Weekly),
            "monthly" => Ok(PlayWindow::Monthly),
            "yearly" => Ok(PlayWindow::Yearly),
            _ => Err(UnknownWindow(trimmed.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCounters {
    pub total: u64,
    pub weekly: u64,
    pub monthly: u64,
    pub yearly: u64,
}

impl PlayCounters {
    pub fn get(&self, window: PlayWindow) -> u64 {
        match window {
            PlayWindow::Total => self.total,
            PlayWindow::Weekly => self.weekly,
            PlayWindow::Monthly => self.monthly,
            PlayWindow::Yearly => self.yearly,
        }
    }

    /// Count one play in every window.
    pub fn bump(&mut self) {
        self.total = self.total.saturating_add(1);
        self.weekly = self.weekly.saturating_add(1);
        self.monthly = self.monthly.saturating_add(1);
        self.yearly = self.yearly.saturating_add(1);
    }

    /// Zero a single window. Returns whether the value changed.
    /// `Total` is left untouched.
    pub fn reset(&mut self, window: PlayWindow) -> bool {
        let slot = match window {
            PlayWindow::Total => return false,
            PlayWindow::Weekly => &mut self.weekly,
            PlayWindow::Monthly => &mut self.monthly,
            PlayWindow::Yearly => &mut self.yearly,
        };
        let changed = *slot != 0;
        *slot = 0;
        changed
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    /// Insertion order within the catalog, used to break ranking ties.
    pub seq: u64,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub audio_url: String,
    pub duration_secs: u32,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub plays: PlayCounters,
    /// Unix milliseconds of the most recent play.
    #[serde(default)]
    pub last_played: Option<u64>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Song {
    pub fn summary(&self, window: PlayWindow) -> SongSummary {
        SongSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            image_url: self.image_url.clone(),
            plays: self.plays.get(window),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub audio_url: String,
    pub duration_secs: u32,
    #[serde(default)]
    pub album_id: Option<String>,
}

impl NewSong {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("title", &self.title),
            ("artist", &self.artist),
            ("image_url", &self.image_url),
            ("audio_url", &self.audio_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is required", field));
            }
        }
        if self.duration_secs == 0 {
            return Err("duration_secs is required".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub plays: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub last_played: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTotals {
    pub total_plays: u64,
    pub weekly_plays: u64,
    pub monthly_plays: u64,
    pub yearly_plays: u64,
}

impl PlayTotals {
    pub fn add(&mut self, plays: &PlayCounters) {
        self.total_plays = self.total_plays.saturating_add(plays.total);
        self.weekly_plays = self.weekly_plays.saturating_add(plays.weekly);
        self.monthly_plays = self.monthly_plays.saturating_add(plays.monthly);
        self.yearly_plays = self.yearly_plays.saturating_add(plays.yearly);
    }

    pub fn get(&self, window: PlayWindow) -> u64 {
        match window {
            PlayWindow::Total => self.total_plays,
            PlayWindow::Weekly => self.weekly_plays,
            PlayWindow::Monthly => self.monthly_plays,
            PlayWindow::Yearly => self.yearly_plays,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayDashboard {
    pub top_songs: Vec<SongSummary>,
    pub weekly_top_songs: Vec<SongSummary>,
    pub monthly_top_songs: Vec<SongSummary>,
    pub yearly_top_songs: Vec<SongSummary>,
    pub totals: PlayTotals,
    pub recently_played: Vec<RecentSong>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub window: PlayWindow,
    pub matched: u64,
    pub modified: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub song: Song,
    pub score: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub songs: u64,
    pub artists: u64,
}

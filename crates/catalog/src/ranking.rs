use common::{PlayDashboard, PlayTotals, PlayWindow, RecentSong, Song, SongSummary};
use redb::ReadableTable;

use crate::{decode_value, Catalog, CatalogError, SONGS_TABLE};

pub const DEFAULT_DASHBOARD_LIMIT: usize = 5;

impl Catalog {
    /// The `limit` most played songs in `window`; ties keep insertion order.
    pub fn top_by_window(
        &self,
        window: PlayWindow,
        limit: usize,
    ) -> Result<Vec<SongSummary>, CatalogError> {
        if limit == 0 {
            return Err(CatalogError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        let mut songs = self.all_songs()?;
        songs.sort_by(|a, b| {
            b.plays
                .get(window)
                .cmp(&a.plays.get(window))
                .then_with(|| a.seq.cmp(&b.seq))
        });
        Ok(songs
            .iter()
            .take(limit)
            .map(|song| song.summary(window))
            .collect())
    }

    pub fn global_totals(&self) -> Result<PlayTotals, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SONGS_TABLE)?;
        let mut totals = PlayTotals::default();
        for entry in table.iter()? {
            let entry = entry?;
            let song: Song = decode_value(entry.1.value())?;
            totals.add(&song.plays);
        }
        Ok(totals)
    }

    /// Songs that have been played at least once, most recent first.
    pub fn recently_played(&self, limit: usize) -> Result<Vec<RecentSong>, CatalogError> {
        if limit == 0 {
            return Err(CatalogError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        let mut played: Vec<(u64, Song)> = self
            .all_songs()?
            .into_iter()
            .filter_map(|song| song.last_played.map(|at| (at, song)))
            .collect();
        played.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.seq.cmp(&b.1.seq)));
        Ok(played
            .into_iter()
            .take(limit)
            .map(|(last_played, song)| RecentSong {
                id: song.id,
                title: song.title,
                artist: song.artist,
                image_url: song.image_url,
                last_played,
            })
            .collect())
    }

    /// Top lists for every window, the global totals and the recent plays.
    ///
    /// Each part reads its own snapshot; a play landing between two parts
    /// may show up in one and not the other.
    pub fn dashboard(&self, limit: usize) -> Result<PlayDashboard, CatalogError> {
        Ok(PlayDashboard {
            top_songs: self.top_by_window(PlayWindow::Total, limit)?,
            weekly_top_songs: self.top_by_window(PlayWindow::Weekly, limit)?,
            monthly_top_songs: self.top_by_window(PlayWindow::Monthly, limit)?,
            yearly_top_songs: self.top_by_window(PlayWindow::Yearly, limit)?,
            totals: self.global_totals()?,
            recently_played: self.recently_played(limit)?,
        })
    }
}

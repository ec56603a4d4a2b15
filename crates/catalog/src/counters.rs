use common::{PlayWindow, ResetOutcome, Song};
use redb::ReadableTable;
use tracing::{debug, info};

use crate::{decode_value, encode_value, now_millis, Catalog, CatalogError, SONGS_TABLE};

impl Catalog {
    /// Record one play of `song_id` now.
    pub fn increment_play(&self, song_id: &str) -> Result<Song, CatalogError> {
        self.increment_play_at(song_id, now_millis())
    }

    /// Record one play at `played_at` (unix millis).
    ///
    /// The read and the write happen inside a single write transaction and
    /// redb admits one writer at a time, so concurrent plays are never lost.
    /// `last_played` never moves backwards.
    pub fn increment_play_at(&self, song_id: &str, played_at: u64) -> Result<Song, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let song = {
            let mut table = write_txn.open_table(SONGS_TABLE)?;
            let mut song: Song = match table.get(song_id)? {
                Some(value) => decode_value(value.value())?,
                None => return Err(CatalogError::NotFound(song_id.to_string())),
            };
            song.plays.bump();
            song.last_played = Some(song.last_played.map_or(played_at, |prev| prev.max(played_at)));
            song.updated_at = played_at;
            let bytes = encode_value(&song)?;
            table.insert(song_id, bytes.as_slice())?;
            song
        };
        write_txn.commit()?;
        debug!("Play recorded for {} (total {})", song_id, song.plays.total);
        Ok(song)
    }

    /// Zero one resettable window on every song in the catalog.
    ///
    /// Runs as one write transaction; running it again yields the same state.
    pub fn reset_window(&self, window: PlayWindow) -> Result<ResetOutcome, CatalogError> {
        if !window.is_resettable() {
            return Err(CatalogError::InvalidArgument(format!(
                "{} plays cannot be reset",
                window
            )));
        }
        let now = now_millis();
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(SONGS_TABLE)?;
            let mut matched = 0u64;
            let mut changed = Vec::new();
            for entry in table.iter()? {
                let entry = entry?;
                matched += 1;
                let mut song: Song = decode_value(entry.1.value())?;
                if song.plays.reset(window) {
                    song.updated_at = now;
                    changed.push(song);
                }
            }
            for song in &changed {
                let bytes = encode_value(song)?;
                table.insert(song.id.as_str(), bytes.as_slice())?;
            }
            ResetOutcome {
                window,
                matched,
                modified: changed.len() as u64,
            }
        };
        write_txn.commit()?;
        info!(
            "Reset {} plays: {} songs matched, {} modified",
            window, outcome.matched, outcome.modified
        );
        Ok(outcome)
    }

    /// Like [`Catalog::reset_window`], taking the window by name.
    pub fn reset_window_named(&self, window: &str) -> Result<ResetOutcome, CatalogError> {
        let window: PlayWindow = window.parse()?;
        self.reset_window(window)
    }
}

mod counters;
mod ranking;
mod search;

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use common::{CatalogCounts, NewSong, PlayCounters, Song, UnknownWindow};
use rand::seq::IndexedRandom;
use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use ranking::DEFAULT_DASHBOARD_LIMIT;
pub use search::{score_song, tokenize};

const SONGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("songs");
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const META_NEXT_SEQ_KEY: &str = "next_seq";

/// Song catalog backed by a redb database.
///
/// Cloning is cheap and shares the underlying database handle.
#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let db = open_or_create_db(path)?;
        let catalog = Self::with_db(Arc::new(db));
        catalog.init_tables()?;
        Ok(catalog)
    }

    pub fn with_db(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn open_db(path: &Path) -> Result<Arc<Database>, CatalogError> {
        Ok(Arc::new(open_or_create_db(path)?))
    }

    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    pub fn init_tables(&self) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SONGS_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn create_song(&self, new_song: NewSong) -> Result<Song, CatalogError> {
        new_song.validate().map_err(CatalogError::InvalidArgument)?;
        let now = now_millis();
        let write_txn = self.db.begin_write()?;
        let song = {
            let mut meta = write_txn.open_table(META_TABLE)?;
            let seq: u64 = match meta.get(META_NEXT_SEQ_KEY)? {
                Some(value) => decode_value(value.value())?,
                None => 0,
            };
            let next = encode_value(&(seq + 1))?;
            meta.insert(META_NEXT_SEQ_KEY, next.as_slice())?;

            let song = Song {
                id: uuid::Uuid::new_v4().to_string(),
                seq,
                title: new_song.title.trim().to_string(),
                artist: new_song.artist.trim().to_string(),
                image_url: new_song.image_url.trim().to_string(),
                audio_url: new_song.audio_url.trim().to_string(),
                duration_secs: new_song.duration_secs,
                album_id: new_song
                    .album_id
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty()),
                plays: PlayCounters::default(),
                last_played: None,
                created_at: now,
                updated_at: now,
            };
            let mut songs = write_txn.open_table(SONGS_TABLE)?;
            let bytes = encode_value(&song)?;
            songs.insert(song.id.as_str(), bytes.as_slice())?;
            song
        };
        write_txn.commit()?;
        info!("Added song {} ({} - {})", song.id, song.artist, song.title);
        Ok(song)
    }

    pub fn get_song(&self, song_id: &str) -> Result<Option<Song>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SONGS_TABLE)?;
        let song = match table.get(song_id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(song)
    }

    pub fn delete_song(&self, song_id: &str) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SONGS_TABLE)?;
            let removed = table.remove(song_id)?.is_some();
            removed
        };
        write_txn.commit()?;
        if removed {
            info!("Deleted song {}", song_id);
        }
        Ok(removed)
    }

    /// Every song, newest first.
    pub fn list_songs(&self) -> Result<Vec<Song>, CatalogError> {
        let mut songs = self.all_songs()?;
        songs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(songs)
    }

    /// Up to `limit` distinct songs picked at random.
    pub fn sample_songs(&self, limit: usize) -> Result<Vec<Song>, CatalogError> {
        let songs = self.all_songs()?;
        let mut rng = rand::rng();
        Ok(songs
            .choose_multiple(&mut rng, limit)
            .cloned()
            .collect())
    }

    pub fn counts(&self) -> Result<CatalogCounts, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SONGS_TABLE)?;
        let songs = table.len()?;
        let mut artists = HashSet::new();
        for entry in table.iter()? {
            let entry = entry?;
            let song: Song = decode_value(entry.1.value())?;
            artists.insert(song.artist.trim().to_lowercase());
        }
        Ok(CatalogCounts {
            songs,
            artists: artists.len() as u64,
        })
    }

    /// Snapshot of the whole catalog from one read transaction, in key order.
    pub(crate) fn all_songs(&self) -> Result<Vec<Song>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SONGS_TABLE)?;
        let mut songs = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            songs.push(decode_value(entry.1.value())?);
        }
        Ok(songs)
    }
}

#[derive(Debug)]
pub enum CatalogError {
    NotFound(String),
    InvalidArgument(String),
    Io(std::io::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
}

impl CatalogError {
    /// Failures of the backing store rather than of the request.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            CatalogError::Io(_) | CatalogError::Redb(_) | CatalogError::Bincode(_)
        )
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "song not found: {}", id),
            CatalogError::InvalidArgument(message) => write!(f, "invalid argument: {}", message),
            CatalogError::Io(err) => write!(f, "io error: {}", err),
            CatalogError::Redb(err) => write!(f, "db error: {}", err),
            CatalogError::Bincode(err) => write!(f, "bincode error: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<UnknownWindow> for CatalogError {
    fn from(err: UnknownWindow) -> Self {
        CatalogError::InvalidArgument(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<redb::Error> for CatalogError {
    fn from(err: redb::Error) -> Self {
        CatalogError::Redb(err)
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TableError> for CatalogError {
    fn from(err: TableError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TransactionError> for CatalogError {
    fn from(err: TransactionError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<CommitError> for CatalogError {
    fn from(err: CommitError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for CatalogError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        CatalogError::Bincode(err)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as u64)
        .unwrap_or(0)
}

use crate::voice::VoiceTone;
use chrono::{DateTime, Local, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use uuid::Uuid;

/// One persisted journal entry, mirroring the `journal_entries` table.
#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub emotion: String,
    pub confidence: f32,
    pub prompt: Option<String>,
    pub entry_text: String,
    pub ai_response: Option<String>,
    pub voice_tone: Option<VoiceTone>,
    pub readable_time: String,
}

impl JournalEntry {
    pub fn new<E: Into<String>, T: Into<String>>(emotion: E, confidence: f32, entry_text: T) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            timestamp: now,
            emotion: emotion.into(),
            confidence,
            prompt: None,
            entry_text: entry_text.into(),
            ai_response: None,
            voice_tone: None,
            readable_time: now
                .with_timezone(&Local)
                .format("%I:%M %p on %B %d, %Y")
                .to_string(),
        }
    }

    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_ai_response<S: Into<String>>(mut self, response: S) -> Self {
        self.ai_response = Some(response.into());
        self
    }

    pub fn with_voice_tone(mut self, tone: VoiceTone) -> Self {
        self.voice_tone = Some(tone);
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid stored id '{0}'")]
    InvalidId(String),

    #[error("invalid stored timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid stored voice tone: {0}")]
    InvalidVoiceTone(#[from] serde_json::Error),
}

/// Single-table wrapper around the journal database. Opens the connection
/// once and owns it; callers needing cross-thread access confine the store to
/// one thread the same way they confine the detector.
pub struct JournalStore {
    conn: Connection,
}

struct RawEntry {
    id: String,
    timestamp: String,
    emotion: String,
    confidence: f64,
    prompt: Option<String>,
    entry_text: String,
    ai_response: Option<String>,
    voice_tone: Option<String>,
    readable_time: String,
}

fn parse_entry(raw: RawEntry) -> Result<JournalEntry, StoreError> {
    let id = Uuid::parse_str(&raw.id).map_err(|_| StoreError::InvalidId(raw.id.clone()))?;
    let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(raw.timestamp.clone()))?;
    let voice_tone = match raw.voice_tone {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    };
    Ok(JournalEntry {
        id,
        timestamp,
        emotion: raw.emotion,
        confidence: raw.confidence as f32,
        prompt: raw.prompt,
        entry_text: raw.entry_text,
        ai_response: raw.ai_response,
        voice_tone,
        readable_time: raw.readable_time,
    })
}

impl JournalStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    fn ensure_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS journal_entries (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                emotion TEXT NOT NULL,
                confidence REAL NOT NULL,
                prompt TEXT,
                entry_text TEXT NOT NULL,
                ai_response TEXT,
                voice_tone TEXT,
                readable_time TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let voice_tone = match &entry.voice_tone {
            Some(tone) => Some(serde_json::to_string(tone)?),
            None => None,
        };
        self.conn.execute(
            "INSERT INTO journal_entries (
                id, timestamp, emotion, confidence, prompt, entry_text, ai_response, voice_tone, readable_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id.to_string(),
                entry.timestamp.to_rfc3339(),
                entry.emotion,
                entry.confidence as f64,
                entry.prompt,
                entry.entry_text,
                entry.ai_response,
                voice_tone,
                entry.readable_time,
            ],
        )?;
        tracing::debug!(id = %entry.id, emotion = %entry.emotion, "journal entry inserted");
        Ok(())
    }

    /// All entries, oldest first.
    pub fn all_entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, emotion, confidence, prompt, entry_text, ai_response, voice_tone, readable_time
             FROM journal_entries ORDER BY timestamp ASC",
        )?;
        let raw_rows = stmt.query_map([], |row| {
            Ok(RawEntry {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                emotion: row.get(2)?,
                confidence: row.get(3)?,
                prompt: row.get(4)?,
                entry_text: row.get(5)?,
                ai_response: row.get(6)?,
                voice_tone: row.get(7)?,
                readable_time: row.get(8)?,
            })
        })?;

        let mut entries = Vec::new();
        for raw in raw_rows {
            entries.push(parse_entry(raw?)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_read_back_round_trips() {
        let store = JournalStore::open_in_memory().expect("open");
        let entry = JournalEntry::new("happy", 92.5, "a good day at the lake")
            .with_prompt("What's bringing you joy today?")
            .with_ai_response("It sounds like a restorative day.")
            .with_voice_tone(VoiceTone {
                tone: "energetic".to_owned(),
                pace: "fast".to_owned(),
                intensity: "high".to_owned(),
                confidence: 0.8,
            });
        store.insert(&entry).expect("insert");

        let entries = store.all_entries().expect("select");
        assert_eq!(entries.len(), 1);
        let read = &entries[0];
        assert_eq!(read.id, entry.id);
        assert_eq!(read.emotion, "happy");
        assert_eq!(read.entry_text, "a good day at the lake");
        assert_eq!(read.voice_tone, entry.voice_tone);
        // rfc3339 keeps sub-second precision; timestamps survive the trip.
        assert_eq!(read.timestamp, entry.timestamp);
    }

    #[test]
    fn entries_come_back_in_timestamp_order() {
        let store = JournalStore::open_in_memory().expect("open");
        let mut first = JournalEntry::new("sad", 60.0, "earlier");
        first.timestamp = first.timestamp - chrono::Duration::seconds(60);
        let second = JournalEntry::new("neutral", 55.0, "later");
        store.insert(&second).expect("insert");
        store.insert(&first).expect("insert");

        let entries = store.all_entries().expect("select");
        assert_eq!(entries[0].entry_text, "earlier");
        assert_eq!(entries[1].entry_text, "later");
    }

    #[test]
    fn optional_fields_survive_as_none() {
        let store = JournalStore::open_in_memory().expect("open");
        let entry = JournalEntry::new("neutral", 40.0, "plain entry");
        store.insert(&entry).expect("insert");

        let read = &store.all_entries().expect("select")[0];
        assert!(read.prompt.is_none());
        assert!(read.ai_response.is_none());
        assert!(read.voice_tone.is_none());
    }
}

use crate::{
    model::structures::scouting_grade::ScoutingGrade,
    scouting::parser::{parse_hitter_scouting, parse_pitcher_scouting, ScoutingError},
    store::{get_json, set_json, KeyValueStore}
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};

/// Which report layout an upload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoutingKind {
    Pitchers,
    Hitters
}

/// The raw text of one source's uploads for one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoutingUpload {
    pub pitchers: Option<String>,
    pub hitters: Option<String>
}

/// Parsed reports from one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutingSet {
    pub date: NaiveDate,
    pub pitchers: Vec<ScoutingGrade>,
    pub hitters: Vec<ScoutingGrade>
}

impl ScoutingSet {
    /// Reports by player. A player in both lists keeps the pitching report.
    pub fn by_player(&self) -> HashMap<i32, ScoutingGrade> {
        let mut map: HashMap<i32, ScoutingGrade> = self.hitters.iter().map(|g| (g.player_id, g.clone())).collect();
        map.extend(self.pitchers.iter().map(|g| (g.player_id, g.clone())));
        map
    }
}

/// Scouting uploads kept verbatim and re-parsed on read, so parser fixes apply
/// to old uploads too.
pub struct ScoutingRepository {
    store: Arc<dyn KeyValueStore>
}

impl ScoutingRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> ScoutingRepository {
        ScoutingRepository { store }
    }

    pub fn upload_key(source: &str, date: NaiveDate) -> String {
        format!("scouting:{}:{}", source, date.format("%Y-%m-%d"))
    }

    pub fn latest_key(source: &str) -> String {
        format!("scouting:{}:latest", source)
    }

    /// Validates and stores an upload. Nothing is written if any line is rejected.
    pub async fn save(
        &self,
        source: &str,
        date: NaiveDate,
        kind: ScoutingKind,
        text: &str
    ) -> Result<Vec<ScoutingGrade>, ScoutingError> {
        let grades = match kind {
            ScoutingKind::Pitchers => parse_pitcher_scouting(text)?,
            ScoutingKind::Hitters => parse_hitter_scouting(text)?
        };

        let key = Self::upload_key(source, date);
        let mut upload = self.read_upload(&key).await.unwrap_or_default();
        match kind {
            ScoutingKind::Pitchers => upload.pitchers = Some(text.to_string()),
            ScoutingKind::Hitters => upload.hitters = Some(text.to_string())
        }

        set_json(self.store.as_ref(), &key, &upload).await?;

        let latest = self.latest_date(source).await;
        if latest.map(|d| d <= date).unwrap_or(true) {
            set_json(self.store.as_ref(), &Self::latest_key(source), &date).await?;
        }

        info!("Stored {} {:?} reports from {} for {}", grades.len(), kind, source, date);
        Ok(grades)
    }

    async fn read_upload(&self, key: &str) -> Option<ScoutingUpload> {
        match get_json(self.store.as_ref(), key).await {
            Ok(upload) => upload,
            Err(e) => {
                warn!("Clearing unreadable scouting upload {}: {}", key, e);
                let _ = self.store.remove(key).await;
                None
            }
        }
    }

    async fn latest_date(&self, source: &str) -> Option<NaiveDate> {
        let key = Self::latest_key(source);
        match get_json(self.store.as_ref(), &key).await {
            Ok(date) => date,
            Err(e) => {
                warn!("Clearing unreadable scouting pointer {}: {}", key, e);
                let _ = self.store.remove(&key).await;
                None
            }
        }
    }

    /// Reports from the upload on `date`.
    pub async fn on_date(&self, source: &str, date: NaiveDate) -> Result<Option<ScoutingSet>, ScoutingError> {
        let Some(upload) = self.read_upload(&Self::upload_key(source, date)).await else {
            return Ok(None);
        };

        let pitchers = match &upload.pitchers {
            Some(text) => parse_pitcher_scouting(text)?,
            None => Vec::new()
        };
        let hitters = match &upload.hitters {
            Some(text) => parse_hitter_scouting(text)?,
            None => Vec::new()
        };

        Ok(Some(ScoutingSet { date, pitchers, hitters }))
    }

    /// Reports from the most recent upload of `source`.
    pub async fn latest(&self, source: &str) -> Result<Option<ScoutingSet>, ScoutingError> {
        match self.latest_date(source).await {
            Some(date) => self.on_date(source, date).await,
            None => Ok(None)
        }
    }

    /// Drops every upload of `source`.
    pub async fn clear(&self, source: &str) -> Result<usize, ScoutingError> {
        Ok(self.store.clear_prefix(&format!("scouting:{}:", source)).await?)
    }
}

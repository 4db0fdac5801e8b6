use crate::{model::structures::stat_kind::StatKind, utils::delimited::ParseError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("feed is malformed: {0}")]
    Parse(#[from] ParseError),

    #[error("no data for {0}")]
    NotFound(String)
}

/// Source of the raw delimited stats documents.
#[async_trait]
pub trait StatsFeed: Send + Sync {
    async fn fetch_stats(&self, year: i32, kind: StatKind) -> Result<String, FeedError>;

    async fn fetch_players(&self) -> Result<String, FeedError>;

    async fn fetch_teams(&self) -> Result<String, FeedError>;
}

/// Feed served over HTTP as `{root}/{year}/{kind}.csv`, `{root}/players.csv`
/// and `{root}/teams.csv`.
pub struct HttpStatsFeed {
    client: Client,
    root: String
}

impl HttpStatsFeed {
    pub fn new(root: impl Into<String>) -> Result<HttpStatsFeed, FeedError> {
        let client = ClientBuilder::new().timeout(Duration::from_secs(30)).build()?;

        Ok(HttpStatsFeed {
            client,
            root: root.into().trim_end_matches('/').to_string()
        })
    }

    pub fn stats_url(&self, year: i32, kind: StatKind) -> String {
        format!("{}/{}/{}.csv", self.root, year, kind.as_str())
    }

    async fn get_text(&self, url: String) -> Result<String, FeedError> {
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16()
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl StatsFeed for HttpStatsFeed {
    async fn fetch_stats(&self, year: i32, kind: StatKind) -> Result<String, FeedError> {
        self.get_text(self.stats_url(year, kind)).await
    }

    async fn fetch_players(&self) -> Result<String, FeedError> {
        self.get_text(format!("{}/players.csv", self.root)).await
    }

    async fn fetch_teams(&self) -> Result<String, FeedError> {
        self.get_text(format!("{}/teams.csv", self.root)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{model::structures::stat_kind::StatKind, stats::feed::HttpStatsFeed};

    #[test]
    fn test_stats_url() {
        let feed = HttpStatsFeed::new("https://stats.example.org/league/").unwrap();

        assert_eq!(
            feed.stats_url(2021, StatKind::Pitching),
            "https://stats.example.org/league/2021/pitching.csv"
        );
        assert_eq!(
            feed.stats_url(2019, StatKind::Batting),
            "https://stats.example.org/league/2019/batting.csv"
        );
    }
}

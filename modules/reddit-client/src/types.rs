use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response from the OAuth2 client-credentials token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Generic Reddit "Thing" envelope: `{"kind": "t3", "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

/// Listing envelope: `{"kind": "Listing", "data": {"children": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub children: Vec<Thing<T>>,
    pub after: Option<String>,
}

/// A link (t3) from a subreddit listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`. Unique across the platform.
    pub name: String,
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub score: i64,
    pub subreddit: String,
    /// Epoch seconds as a float, per the Reddit API.
    pub created_utc: f64,
    #[serde(default)]
    pub num_comments: i64,
}

/// A comment (t1) from a subreddit comment feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditComment {
    pub id: String,
    /// Fullname, e.g. `t1_def456`.
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub body: String,
    pub score: i64,
    pub subreddit: String,
    pub created_utc: f64,
}

/// An account (t2) from the user about endpoint.
///
/// `has_verified_email` is absent for accounts that hide it; callers treat
/// absence as unverified.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditUser {
    pub name: String,
    pub created_utc: f64,
    pub comment_karma: i64,
    pub link_karma: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub has_verified_email: Option<bool>,
    #[serde(default)]
    pub is_gold: bool,
}

/// Convert Reddit's float epoch seconds into a UTC timestamp.
/// Sub-second precision is discarded; pre-epoch values clamp to the epoch.
pub fn epoch_to_datetime(epoch_secs: f64) -> DateTime<Utc> {
    let secs = if epoch_secs.is_finite() && epoch_secs > 0.0 {
        epoch_secs as i64
    } else {
        0
    };
    DateTime::from_timestamp(secs, 0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_conversion_handles_bad_input() {
        assert_eq!(epoch_to_datetime(0.0).timestamp(), 0);
        assert_eq!(epoch_to_datetime(-100.0).timestamp(), 0);
        assert_eq!(epoch_to_datetime(f64::NAN).timestamp(), 0);
        assert_eq!(epoch_to_datetime(1700000000.9).timestamp(), 1700000000);
    }

    #[test]
    fn listing_envelope_parses() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {
                        "id": "abc", "name": "t3_abc", "author": "alice",
                        "title": "hello", "score": 5, "subreddit": "rust",
                        "created_utc": 1700000000.0
                    }}
                ],
                "after": null
            }
        }"#;
        let thing: Thing<Listing<RedditPost>> = serde_json::from_str(json).unwrap();
        assert_eq!(thing.data.children.len(), 1);
        assert_eq!(thing.data.children[0].data.author, "alice");
        assert_eq!(thing.data.children[0].data.selftext, "");
    }

    #[test]
    fn user_parses_without_verified_email() {
        let json = r#"{
            "name": "bob", "created_utc": 1600000000.0,
            "comment_karma": 10, "link_karma": 2
        }"#;
        let user: RedditUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.has_verified_email, None);
        assert!(!user.verified);
        assert!(!user.is_gold);
    }
}

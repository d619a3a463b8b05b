//! Request and response bodies

use super::ApiError;
use crate::model::{AuthorRef, ContentItem};
use crate::template::LayoutVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EMBED_INPUT_ERROR: &str = "Invalid input: tweetUrls must be a non-empty array";
pub const IMAGES_INPUT_ERROR: &str = "Invalid input: requires tweets array and user object";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEmbedsRequest {
    #[serde(default)]
    pub tweet_urls: Option<Vec<String>>,
}

impl CaptureEmbedsRequest {
    pub fn into_items(self) -> Result<Vec<ContentItem>, ApiError> {
        match self.tweet_urls {
            Some(urls) if !urls.is_empty() => Ok(urls.into_iter().map(ContentItem::embed).collect()),
            _ => Err(ApiError::Validation(EMBED_INPUT_ERROR.into())),
        }
    }
}

/// A post given either as bare text or with its own timestamp
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TweetInput {
    Text(String),
    Post {
        text: String,
        #[serde(rename = "createdAt", default)]
        created_at: Option<PostTime>,
    },
}

/// `createdAt` as an RFC 3339 string or as Unix epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PostTime {
    Rfc3339(DateTime<Utc>),
    EpochMillis(i64),
}

impl PostTime {
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        match self {
            PostTime::Rfc3339(at) => Some(at),
            PostTime::EpochMillis(ms) => DateTime::from_timestamp_millis(ms),
        }
    }
}

/// Shape of a successful `createTweetImages` response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseFormat {
    /// Raw base64 images plus the bundled PDF
    #[default]
    Bundle,
    /// `data:image/png;base64,...` URIs only, no PDF
    DataUri,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImagesQuery {
    #[serde(default)]
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub twitter_name: String,
    pub twitter_user_name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl From<UserInput> for AuthorRef {
    fn from(user: UserInput) -> Self {
        AuthorRef {
            display_name: user.twitter_name,
            handle: user.twitter_user_name,
            avatar_url: user.profile_image_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImagesRequest {
    #[serde(default)]
    pub tweets: Option<Vec<TweetInput>>,
    #[serde(default)]
    pub user: Option<UserInput>,
    #[serde(default)]
    pub layout: Option<LayoutVariant>,
}

impl CreateImagesRequest {
    /// Validate and expand into content items. Posts without a timestamp are
    /// stamped with `now`.
    pub fn into_items(self, now: DateTime<Utc>) -> Result<(Vec<ContentItem>, LayoutVariant), ApiError> {
        let tweets = self.tweets.filter(|t| !t.is_empty());
        let (tweets, user) = match (tweets, self.user) {
            (Some(tweets), Some(user)) => (tweets, user),
            _ => return Err(ApiError::Validation(IMAGES_INPUT_ERROR.into())),
        };

        let variant = self.layout.unwrap_or_default();
        if variant == LayoutVariant::Embed {
            return Err(ApiError::Validation(
                "Invalid input: layout must be square or compact".into(),
            ));
        }

        let author = AuthorRef::from(user);
        let items = tweets
            .into_iter()
            .map(|tweet| {
                let (text, created_at) = match tweet {
                    TweetInput::Text(text) => (text, None),
                    TweetInput::Post { text, created_at } => (text, created_at),
                };
                let at = match created_at {
                    Some(time) => time.to_utc().ok_or_else(|| {
                        ApiError::Validation("Invalid input: createdAt is out of range".into())
                    })?,
                    None => now,
                };
                Ok(ContentItem::new(text, author.clone()).created_at(at))
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok((items, variant))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedImage {
    pub base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureEmbedsResponse {
    pub images: Vec<EmbedImage>,
    pub pdf: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImagesResponse {
    pub base64_images: Vec<String>,
    pub base64_pdf: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataUriResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreateImagesBody {
    Bundle(CreateImagesResponse),
    DataUri(DataUriResponse),
}

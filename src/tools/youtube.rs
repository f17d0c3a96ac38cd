//! YouTube video tools.
//!
//! Video metadata comes from the public oEmbed endpoint; captions are located
//! with yt-dlp and downloaded in YouTube's json3 timed-text format.

use super::{required_str, ToolDefinition, Toolkit};
use crate::config::YoutubeSettings;
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// One caption cue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionLine {
    pub start_seconds: f64,
    pub text: String,
}

/// YouTube toolkit exposed to agents.
pub struct YouTubeTools {
    client: reqwest::Client,
    video_id_regex: Regex,
    language: String,
}

impl YouTubeTools {
    pub fn new(settings: &YoutubeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        // Watch, short-link, embed and shorts URLs, or a bare 11-character ID
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Ok(Self {
            client,
            video_id_regex,
            language: settings.captions_language.clone(),
        })
    }

    /// Extract the video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    fn video_id_arg(&self, tool: &str, args: &serde_json::Value) -> Result<String> {
        let url = required_str(tool, args, "url")?;
        self.extract_video_id(url)
            .ok_or_else(|| SamtaleError::tool_argument(tool, format!("not a YouTube video URL: {}", url)))
    }

    #[instrument(skip(self))]
    async fn video_data(&self, video_id: &str) -> Result<String> {
        let tool = "get_youtube_video_data";
        let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);

        let response = self
            .client
            .get(OEMBED_URL)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SamtaleError::tool(
                tool,
                format!("video {} unavailable (status {})", video_id, response.status()),
            ));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("invalid response: {}", e)))?;

        Ok(serde_json::to_string_pretty(&oembed_summary(&data))?)
    }

    #[instrument(skip(self))]
    async fn captions(&self, tool: &str, video_id: &str) -> Result<Vec<CaptionLine>> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SamtaleError::tool(tool, "yt-dlp is not installed")
                } else {
                    SamtaleError::tool(tool, format!("failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SamtaleError::tool(
                tool,
                format!("video {} unavailable: {}", video_id, stderr.trim()),
            ));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| SamtaleError::tool(tool, format!("failed to parse yt-dlp output: {}", e)))?;

        let track_url = select_caption_track(&info, &self.language)
            .ok_or_else(|| SamtaleError::tool(tool, format!("no captions available for {}", video_id)))?;

        debug!("Fetching captions from {}", track_url);
        let track: serde_json::Value = self
            .client
            .get(&track_url)
            .send()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("caption download failed: {}", e)))?
            .json()
            .await
            .map_err(|e| SamtaleError::tool(tool, format!("invalid caption track: {}", e)))?;

        let lines = parse_json3(&track);
        info!("Loaded {} caption lines for {}", lines.len(), video_id);
        Ok(lines)
    }
}

#[async_trait]
impl Toolkit for YouTubeTools {
    fn name(&self) -> &str {
        "youtube"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let url_schema = serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The YouTube video URL"
                }
            },
            "required": ["url"]
        });

        vec![
            ToolDefinition::new(
                "get_youtube_video_data",
                "Get metadata of a YouTube video: title, channel and thumbnail.",
                url_schema.clone(),
            ),
            ToolDefinition::new(
                "get_youtube_video_captions",
                "Get the captions (transcript text) of a YouTube video.",
                url_schema.clone(),
            ),
            ToolDefinition::new(
                "get_video_timestamps",
                "Get the captions of a YouTube video with a timestamp for each line.",
                url_schema,
            ),
        ]
    }

    async fn invoke(&self, function: &str, arguments: &serde_json::Value) -> Result<String> {
        let video_id = self.video_id_arg(function, arguments)?;

        match function {
            "get_youtube_video_data" => self.video_data(&video_id).await,
            "get_youtube_video_captions" => {
                let lines = self.captions(function, &video_id).await?;
                Ok(lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join(" "))
            }
            "get_video_timestamps" => {
                let lines = self.captions(function, &video_id).await?;
                Ok(lines
                    .iter()
                    .map(|l| format!("{} - {}", format_timestamp(l.start_seconds), l.text))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            other => Err(SamtaleError::tool_argument(other, "not provided by youtube")),
        }
    }
}

/// Keep the oEmbed fields that are useful to a model.
fn oembed_summary(data: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "title": data["title"],
        "author_name": data["author_name"],
        "author_url": data["author_url"],
        "type": data["type"],
        "provider_name": data["provider_name"],
        "thumbnail_url": data["thumbnail_url"],
    })
}

/// Pick a json3 caption URL from yt-dlp's info JSON. Manual subtitles win
/// over automatic captions; an exact language match wins over a regional
/// variant (`en` matches `en-US`).
fn select_caption_track(info: &serde_json::Value, language: &str) -> Option<String> {
    ["subtitles", "automatic_captions"].iter().find_map(|kind| {
        let tracks = info[*kind].as_object()?;

        let exact = tracks.get(language);
        let regional = || {
            tracks
                .iter()
                .filter(|(code, _)| code.starts_with(&format!("{}-", language)))
                .map(|(_, formats)| formats)
                .next()
        };

        exact.or_else(regional)?.as_array()?.iter().find_map(|format| {
            if format["ext"].as_str() == Some("json3") {
                format["url"].as_str().map(str::to_string)
            } else {
                None
            }
        })
    })
}

/// Parse a json3 timed-text document into caption lines.
fn parse_json3(track: &serde_json::Value) -> Vec<CaptionLine> {
    track["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|event| {
                    let text: String = event["segs"]
                        .as_array()?
                        .iter()
                        .filter_map(|seg| seg["utf8"].as_str())
                        .collect::<String>()
                        .replace('\n', " ");
                    let text = text.trim();
                    if text.is_empty() {
                        return None;
                    }
                    Some(CaptionLine {
                        start_seconds: event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0,
                        text: text.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Format seconds as MM:SS or HH:MM:SS.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds as u32;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> YouTubeTools {
        YouTubeTools::new(&YoutubeSettings::default()).unwrap()
    }

    #[test]
    fn test_extract_video_id() {
        let tools = tools();

        assert_eq!(
            tools.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            tools.extract_video_id("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            tools.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            tools.extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(tools.extract_video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));

        assert_eq!(tools.extract_video_id("not-a-video-id"), None);
        assert_eq!(tools.extract_video_id(""), None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_argument_error() {
        let err = tools()
            .invoke("get_youtube_video_data", &serde_json::json!({"url": "https://vimeo.com/1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));
    }

    #[test]
    fn test_select_caption_track_prefers_manual() {
        let info = serde_json::json!({
            "subtitles": {
                "en": [
                    { "ext": "vtt", "url": "https://captions/manual.vtt" },
                    { "ext": "json3", "url": "https://captions/manual.json3" }
                ]
            },
            "automatic_captions": {
                "en": [{ "ext": "json3", "url": "https://captions/auto.json3" }]
            }
        });

        assert_eq!(
            select_caption_track(&info, "en").as_deref(),
            Some("https://captions/manual.json3")
        );
    }

    #[test]
    fn test_select_caption_track_falls_back() {
        let info = serde_json::json!({
            "subtitles": {},
            "automatic_captions": {
                "en-US": [{ "ext": "json3", "url": "https://captions/auto-us.json3" }]
            }
        });

        assert_eq!(
            select_caption_track(&info, "en").as_deref(),
            Some("https://captions/auto-us.json3")
        );
        assert_eq!(select_caption_track(&info, "de"), None);
    }

    #[test]
    fn test_parse_json3() {
        let track = serde_json::json!({
            "events": [
                { "tStartMs": 0, "segs": [{ "utf8": "Never gonna " }, { "utf8": "give you up" }] },
                { "tStartMs": 1500, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 65000, "segs": [{ "utf8": "never gonna\nlet you down" }] },
                { "tStartMs": 70000 }
            ]
        });

        let lines = parse_json3(&track);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Never gonna give you up");
        assert_eq!(lines[1].text, "never gonna let you down");
        assert_eq!(format_timestamp(lines[1].start_seconds), "01:05");
    }

    #[test]
    fn test_oembed_summary() {
        let data = serde_json::json!({
            "title": "Talk",
            "author_name": "Channel",
            "html": "<iframe ...>",
            "thumbnail_url": "https://i.ytimg.com/x.jpg"
        });
        let summary = oembed_summary(&data);
        assert_eq!(summary["title"], "Talk");
        assert!(summary.get("html").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
        assert_eq!(format_timestamp(0.0), "00:00");
    }
}

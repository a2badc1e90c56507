//! Request and intermediate report types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::keywords::KeywordSignal;

/// Language of the encyclopedia summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    It,
    En,
    Fr,
    Es,
    De,
}

impl Language {
    /// ISO 639-1 code, also the Wikipedia subdomain.
    pub fn code(&self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::De => "de",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code().to_uppercase())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "it" | "italiano" | "italian" => Ok(Language::It),
            "en" | "english" => Ok(Language::En),
            "fr" | "français" | "francais" | "french" => Ok(Language::Fr),
            "es" | "español" | "espanol" | "spanish" => Ok(Language::Es),
            "de" | "deutsch" | "german" => Ok(Language::De),
            other => Err(format!(
                "unknown language '{other}' (expected one of: it, en, fr, es, de)"
            )),
        }
    }
}

/// Effort tier controlling summary length and number of web sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    #[default]
    Normal,
    Deep,
}

/// The two values a [`Depth`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthParams {
    pub summary_sentences: usize,
    pub web_results: usize,
}

impl Depth {
    pub fn params(&self) -> DepthParams {
        match self {
            Depth::Quick => DepthParams {
                summary_sentences: 5,
                web_results: 1,
            },
            Depth::Normal => DepthParams {
                summary_sentences: 10,
                web_results: 3,
            },
            Depth::Deep => DepthParams {
                summary_sentences: 20,
                web_results: 5,
            },
        }
    }

    /// Quick runs take the search engine's own snippets and skip the keyword chart.
    pub fn is_quick(&self) -> bool {
        matches!(self, Depth::Quick)
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" | "veloce" => Ok(Depth::Quick),
            "normal" | "normale" => Ok(Depth::Normal),
            "deep" | "approfondita" => Ok(Depth::Deep),
            other => Err(format!(
                "unknown depth '{other}' (expected one of: quick, normal, deep)"
            )),
        }
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Pdf => f.write_str("PDF"),
            ReportFormat::Docx => f.write_str("DOCX"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "docx" | "doc" | "word" => Ok(ReportFormat::Docx),
            other => Err(format!(
                "unknown format '{other}' (expected one of: pdf, docx)"
            )),
        }
    }
}

/// One report invocation as submitted by the interactive surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub topic: String,
    pub language: Language,
    pub depth: Depth,
    pub format: ReportFormat,
    /// Where the finished document is written.
    pub destination: PathBuf,
}

impl ReportRequest {
    pub fn new(
        topic: impl Into<String>,
        language: Language,
        depth: Depth,
        format: ReportFormat,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            topic: topic.into(),
            language,
            depth,
            format,
            destination: destination.into(),
        }
    }
}

/// A single web source as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    /// Engine snippet (quick depth) or scraped excerpt (normal/deep).
    pub snippet: String,
    pub url: String,
}

/// Everything a renderer needs; built once per invocation and never persisted.
#[derive(Debug, Clone)]
pub struct ReportModel {
    pub topic: String,
    pub language: Language,
    pub depth: Depth,
    pub cover_image: Option<PathBuf>,
    pub summary: String,
    pub web_results: Vec<WebResult>,
    pub keywords: KeywordSignal,
    /// Bar chart of `keywords`, present only when the chart renderer succeeded.
    pub chart_image: Option<PathBuf>,
    pub generated_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_params_table() {
        assert_eq!(
            Depth::Quick.params(),
            DepthParams {
                summary_sentences: 5,
                web_results: 1
            }
        );
        assert_eq!(
            Depth::Normal.params(),
            DepthParams {
                summary_sentences: 10,
                web_results: 3
            }
        );
        assert_eq!(
            Depth::Deep.params(),
            DepthParams {
                summary_sentences: 20,
                web_results: 5
            }
        );
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("Deutsch".parse::<Language>().unwrap(), Language::De);
        assert!("klingon".parse::<Language>().is_err());
        assert_eq!(Language::Fr.code(), "fr");
        assert_eq!(Language::Es.to_string(), "ES");
    }

    #[test]
    fn test_depth_and_format_parsing() {
        assert_eq!("veloce".parse::<Depth>().unwrap(), Depth::Quick);
        assert_eq!("Deep".parse::<Depth>().unwrap(), Depth::Deep);
        assert_eq!("word".parse::<ReportFormat>().unwrap(), ReportFormat::Docx);
        assert_eq!(ReportFormat::Docx.extension(), "docx");
        assert!("odt".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Language::default(), Language::It);
        assert_eq!(Depth::default(), Depth::Normal);
        assert_eq!(ReportFormat::default(), ReportFormat::Pdf);
    }
}

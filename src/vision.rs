//! Face-box feed from an external detector.
//!
//! The detector writes one JSON document per line, either a bare array of
//! boxes or an object with a `faces` array. Each line becomes one
//! [`FaceEvent`], including empty ones, so the core sees when a face is lost.

use crate::core::Core;
use crate::error::{InputError, Result};
use crate::events::{FaceBox, FaceEvent};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedLine {
    Bare(Vec<FaceBox>),
    Wrapped { faces: Vec<FaceBox> },
}

/// Parse one feed line. Blank lines yield `None`.
pub fn parse_line(line: &str, max_faces: usize) -> std::result::Result<Option<FaceEvent>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parsed: FeedLine = serde_json::from_str(line).map_err(|e| InputError::Parse {
        details: e.to_string(),
    })?;
    let mut faces = match parsed {
        FeedLine::Bare(faces) | FeedLine::Wrapped { faces } => faces,
    };

    let received = faces.len();
    faces.retain(FaceBox::has_valid_size);
    if faces.len() < received {
        warn!("Skipping {} faces with a negative size", received - faces.len());
    }

    if faces.len() > max_faces {
        debug!("Dropping {} faces beyond the limit of {}", faces.len() - max_faces, max_faces);
        faces.truncate(max_faces);
    }
    Ok(Some(FaceEvent::new(faces)))
}

/// Line-oriented reader feeding face events into the core
pub struct FaceFeed<R> {
    reader: R,
    source: String,
    max_faces: usize,
}

impl<R: BufRead> FaceFeed<R> {
    pub fn new(reader: R, source: impl Into<String>, max_faces: usize) -> Self {
        Self {
            reader,
            source: source.into(),
            max_faces,
        }
    }

    /// Read until EOF or cancellation, returning how many events were dispatched
    pub fn run(mut self, core: &Core, cancellation_token: &CancellationToken) -> Result<usize> {
        info!("Reading face boxes from {}", self.source);
        let mut dispatched = 0;
        let mut line_number = 0;
        let mut line = String::new();

        while !cancellation_token.is_cancelled() {
            line.clear();
            let read = self.reader.read_line(&mut line).map_err(|e| InputError::DeviceRead {
                details: format!("{}: {}", self.source, e),
            })?;
            if read == 0 {
                info!("Face feed {} reached end of input", self.source);
                break;
            }
            line_number += 1;

            match parse_line(&line, self.max_faces) {
                Ok(Some(event)) => {
                    core.dispatch(event);
                    dispatched += 1;
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping line {} of {}: {}", line_number, self.source, e),
            }
        }

        Ok(dispatched)
    }
}

impl FaceFeed<Box<dyn BufRead + Send>> {
    /// Open a feed from a path, or from stdin when the source is `-`
    pub fn open(source: &str, max_faces: usize) -> Result<Self> {
        let reader: Box<dyn BufRead + Send> = if source == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(source).map_err(|e| InputError::DeviceOpen {
                device: source.to_string(),
                details: e.to_string(),
            })?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader, source, max_faces))
    }
}

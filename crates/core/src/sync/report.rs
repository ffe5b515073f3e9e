use serde::Serialize;

use crate::media::{
    Album, Artist, Collection, Episode, MediaType, Movie, Playlist, Season, Series, Track,
};
use crate::reconcile::{ReconcileReport, ReconcileSummary};

/// A reconciliation report for any media type.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SyncReport {
    Movie(ReconcileReport<Movie>),
    Series(ReconcileReport<Series>),
    Season(ReconcileReport<Season>),
    Episode(ReconcileReport<Episode>),
    Track(ReconcileReport<Track>),
    Album(ReconcileReport<Album>),
    Artist(ReconcileReport<Artist>),
    Playlist(ReconcileReport<Playlist>),
    Collection(ReconcileReport<Collection>),
}

macro_rules! with_report {
    ($report:expr, $r:ident => $body:expr) => {
        match $report {
            SyncReport::Movie($r) => $body,
            SyncReport::Series($r) => $body,
            SyncReport::Season($r) => $body,
            SyncReport::Episode($r) => $body,
            SyncReport::Track($r) => $body,
            SyncReport::Album($r) => $body,
            SyncReport::Artist($r) => $body,
            SyncReport::Playlist($r) => $body,
            SyncReport::Collection($r) => $body,
        }
    };
}

impl SyncReport {
    pub fn summary(&self) -> &ReconcileSummary {
        with_report!(self, r => &r.summary)
    }

    pub fn media_type(&self) -> MediaType {
        with_report!(self, r => r.media_type)
    }
}

macro_rules! impl_from_report {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<ReconcileReport<$variant>> for SyncReport {
                fn from(report: ReconcileReport<$variant>) -> Self {
                    SyncReport::$variant(report)
                }
            }
        )*
    };
}

impl_from_report!(Movie, Series, Season, Episode, Track, Album, Artist, Playlist, Collection);

use std::sync::Arc;

use crate::{classifier::Classifiers, spotify::SpotifyApi};

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub classifiers: Arc<Classifiers>,
    pub spotify: Arc<dyn SpotifyApi>,
}

impl AppState {
    pub fn new(classifiers: Classifiers, spotify: Arc<dyn SpotifyApi>) -> Self {
        AppState {
            classifiers: Arc::new(classifiers),
            spotify,
        }
    }
}

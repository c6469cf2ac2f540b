use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, store::SocialStore, utils::media::MediaStorage};

pub type DynStore = Arc<dyn SocialStore>;
pub type DynMedia = Arc<dyn MediaStorage>;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub media: DynMedia,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for DynMedia {
    fn from_ref(state: &AppState) -> Self {
        state.media.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

use std::sync::Arc;

use crate::application::{
    auto_feature::AutoFeatureService, home::HomeFeedService, repos::StoreHealth,
};

/// Shared handles for every route. Cloned per request.
#[derive(Clone)]
pub struct HttpState {
    pub home: Arc<HomeFeedService>,
    pub auto_feature: Arc<AutoFeatureService>,
    pub health: Arc<dyn StoreHealth>,
    /// Bearer token for `/api/admin/*`; when unset every admin call is rejected.
    pub admin_token: Option<Arc<str>>,
}

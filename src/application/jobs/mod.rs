mod auto_feature;

pub use auto_feature::{
    AutoFeatureJob, AutoFeatureJobContext, auto_feature_schedule, process_auto_feature_job,
};

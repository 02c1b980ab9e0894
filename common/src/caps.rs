/// The log-export service refuses requests spanning more than 90 minutes.
pub const DEFAULT_WINDOW_CAPACITY_MS: u64 = 90 * 60 * 1000;

/// Key under which the auth token lives in the session store.
pub const TOKEN_CACHE_KEY: &str = "_console_token";

/// Process tag carrying the project a traced process belongs to.
pub const PROJECT_ID_TAG: &str = "rioProjectId";

/// Process tag carrying the deployment a traced process runs in.
pub const DEPLOYMENT_ID_TAG: &str = "rioDeploymentId";

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Edge functions called by the desk front end
    pub const HANDLE_MESSAGE: &'static str = "/functions/v1/handle-message";
    pub const HANDLE_MANAGER_PROMPT: &'static str = "/functions/v1/handle-manager-prompt";

    // Reasoning backend, relative to BACKEND_URL
    pub const BACKEND_USER_MESSAGE: &'static str = "/api/v1/user-message";
    pub const BACKEND_MANAGER_PROMPT: &'static str = "/api/v1/manager-prompt";

    pub const HEALTH: &'static str = "/health";
}

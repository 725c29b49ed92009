use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
}

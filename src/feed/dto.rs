use serde::Serialize;

use super::services::HomeView;
use crate::messages::dto::MessageResponse;

/// `{"view":"landing"}` or `{"view":"feed","messages":[..]}`.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum HomeResponse {
    Landing,
    Feed { messages: Vec<MessageResponse> },
}

impl From<HomeView> for HomeResponse {
    fn from(view: HomeView) -> Self {
        match view {
            HomeView::Landing => HomeResponse::Landing,
            HomeView::Feed { messages } => HomeResponse::Feed {
                messages: messages.into_iter().map(MessageResponse::from).collect(),
            },
        }
    }
}

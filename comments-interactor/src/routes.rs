use std::sync::Arc;

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::Html,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    dashboard::{Submission, render_page},
    server::InteractorState,
};

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

pub async fn dashboard_handler(State(state): State<Arc<InteractorState>>) -> Html<String> {
    let latest = state.engine.latest().await;
    Html(render_page(None, &latest))
}

/// Forwards the submission to the engine, then renders the dashboard so the
/// new comment shows up on the same page.
pub async fn submit_handler(
    State(state): State<Arc<InteractorState>>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Html<String> {
    state.metrics.comment_received();

    let submission = match form {
        Ok(Form(CommentForm { comment })) if !comment.is_empty() => {
            match state.engine.post_comment(&comment).await {
                Ok(stored) => {
                    state.metrics.comment_posted();
                    info!(index = ?stored.index, "comment posted");
                    Submission::Posted
                }
                Err(err) => Submission::Failed(err),
            }
        }
        Ok(_) => Submission::Rejected,
        Err(rejection) => {
            debug!(%rejection, "unreadable form");
            Submission::Rejected
        }
    };

    let latest = state.engine.latest().await;
    Html(render_page(Some(&submission), &latest))
}

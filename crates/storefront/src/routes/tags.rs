//! Tag page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use delicious_core::StoreId;
use delicious_core::rules::TagCount;

use super::{Flash, PageContext, StoreCard};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::StoreService;
use crate::state::AppState;

/// A tag link with its listing count.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub name: String,
    pub count: usize,
    pub active: bool,
}

/// Tag page template.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub page: PageContext,
    pub tags: Vec<TagLink>,
    pub cards: Vec<StoreCard>,
}

/// Display all tags and every store that has at least one.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> Result<impl IntoResponse> {
    render(&state, user, None, flash).await
}

/// Display all tags and the stores carrying `tag`.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(tag): Path<String>,
    flash: Flash,
) -> Result<impl IntoResponse> {
    render(&state, user, Some(tag), flash).await
}

async fn render(
    state: &AppState,
    user: Option<CurrentUser>,
    tag: Option<String>,
    flash: Flash,
) -> Result<TagsTemplate> {
    let service = StoreService::new(state.pool());
    let (counts, stores) = service.by_tag(tag.as_deref()).await?;

    let hearts: Vec<StoreId> = match &user {
        Some(user) => service.heart_ids(user.id).await?,
        None => Vec::new(),
    };
    let viewer = user.as_ref().map(|u| u.id);

    Ok(TagsTemplate {
        tags: tag_links(counts, tag.as_deref()),
        cards: StoreCard::many(stores, &hearts, viewer),
        page: PageContext::new(tag.unwrap_or_else(|| "Tags".to_string()), user, flash),
    })
}

fn tag_links(counts: Vec<TagCount>, selected: Option<&str>) -> Vec<TagLink> {
    counts
        .into_iter()
        .map(|c| TagLink {
            active: selected == Some(c.tag.as_str()),
            name: c.tag,
            count: c.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_links_mark_selection() {
        let counts = vec![
            TagCount {
                tag: "Wifi".to_string(),
                count: 3,
            },
            TagCount {
                tag: "Licensed".to_string(),
                count: 1,
            },
        ];

        let links = tag_links(counts, Some("Licensed"));
        assert!(!links[0].active);
        assert!(links[1].active);
        assert_eq!(links[0].count, 3);
    }
}

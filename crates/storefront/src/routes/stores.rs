//! Store listing route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use delicious_core::rules::TopStore;
use delicious_core::{Store, StoreDraft, StoreId, ValidationError};

use super::{
    Flash, FlashKind, PageContext, StoreCard, photo_url, redirect_with,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::CurrentUser;
use crate::models::user::gravatar_url;
use crate::services::{PhotoError, ReviewService, StoreService};
use crate::state::AppState;

/// Reviewer avatar size in pixels.
const REVIEW_AVATAR_SIZE: u32 = 60;

/// Largest accepted store form, photo included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Tags offered on the store form.
pub const TAG_CHOICES: [&str; 5] = [
    "Wifi",
    "Open Late",
    "Family Friendly",
    "Vegetarian",
    "Licensed",
];

// =============================================================================
// Form Types
// =============================================================================

/// Raw store form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct StoreForm {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub photo: Option<PhotoUpload>,
}

/// The `photo` file field.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl StoreForm {
    /// Read every field of a multipart store form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read form field: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "photo" {
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read photo: {e}")))?;
                form.photo = Some(PhotoUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;

            match name.as_str() {
                "name" => form.name = value,
                "description" => form.description = value,
                "tags" => form.tags.push(value),
                "address" => form.address = value,
                "lng" => form.lng = value,
                "lat" => form.lat = value,
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate the text fields into a draft. The photo is handled separately.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or address and for missing
    /// or out-of-range coordinates.
    pub fn draft(&self) -> std::result::Result<StoreDraft, ValidationError> {
        let lng = parse_coordinate(&self.lng)?;
        let lat = parse_coordinate(&self.lat)?;
        StoreDraft::new(
            &self.name,
            &self.description,
            &self.tags,
            lng,
            lat,
            &self.address,
        )
    }

    fn from_store(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            address: store.location.address.clone(),
            lng: store.location.lng().to_string(),
            lat: store.location.lat().to_string(),
            photo: None,
        }
    }
}

fn parse_coordinate(raw: &str) -> std::result::Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required("You must supply coordinates!"));
    }
    raw.parse::<f64>()
        .map_err(|_| ValidationError::Coordinates(format!("{raw} is not a number")))
}

// =============================================================================
// Templates
// =============================================================================

/// One checkbox on the store form.
#[derive(Debug, Clone)]
pub struct TagChoice {
    pub name: String,
    pub checked: bool,
}

fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    TAG_CHOICES
        .iter()
        .map(|name| TagChoice {
            name: (*name).to_string(),
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}

/// Store listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub page: PageContext,
    pub cards: Vec<StoreCard>,
    pub pagination: Option<Pagination>,
}

/// Pager state for the listing page.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub count: i64,
}

impl Pagination {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// A review as shown on the store page.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author_name: String,
    pub gravatar: String,
    pub text: String,
    pub rating: i16,
    /// Relative age, e.g. "3 days ago".
    pub posted: String,
}

/// Store detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub page: PageContext,
    pub store: Store,
    pub photo: String,
    pub static_map: Option<String>,
    pub reviews: Vec<ReviewView>,
    pub hearted: bool,
    pub editable: bool,
}

/// Add/edit store form template.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub page: PageContext,
    pub action: String,
    pub form: StoreForm,
    pub choices: Vec<TagChoice>,
    pub current_photo: Option<String>,
    /// Enables address autocomplete when set.
    pub map_key: Option<String>,
}

/// A ranked store on the top stores page.
#[derive(Debug, Clone)]
pub struct TopStoreView {
    pub rank: usize,
    pub name: String,
    pub slug: String,
    pub photo: String,
    pub average_rating: f64,
    pub review_count: usize,
}

impl TopStoreView {
    fn ranked(stores: Vec<TopStore>) -> Vec<Self> {
        stores
            .into_iter()
            .enumerate()
            .map(|(i, store)| Self {
                rank: i + 1,
                photo: photo_url(store.photo.as_deref()),
                review_count: store.review_count(),
                average_rating: store.average_rating,
                name: store.name,
                slug: store.slug,
            })
            .collect()
    }
}

/// Top stores page template.
#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopTemplate {
    pub page: PageContext,
    pub stores: Vec<TopStoreView>,
}

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub page: PageContext,
    pub map_key: Option<String>,
}

// =============================================================================
// Listing Routes
// =============================================================================

/// Display the first page of stores.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    flash: Flash,
) -> Result<Response> {
    render_page(&state, &session, user, 1, flash).await
}

/// Display page N of stores.
pub async fn page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(page): Path<u32>,
    flash: Flash,
) -> Result<Response> {
    render_page(&state, &session, user, page, flash).await
}

async fn render_page(
    state: &AppState,
    session: &Session,
    user: Option<CurrentUser>,
    requested: u32,
    flash: Flash,
) -> Result<Response> {
    let service = StoreService::new(state.pool());
    let page = service.page(requested).await?;

    if page.is_past_end() {
        let message = format!(
            "Hey! You asked for page {requested}. But that doesn't exist. So I put you on page {}",
            page.pages
        );
        let last = format!("/stores/page/{}", page.pages);
        return Ok(
            redirect_with(session, &last, FlashKind::Info, &message)
                .await
                .into_response(),
        );
    }

    let hearts = viewer_hearts(&service, user.as_ref()).await?;
    let viewer = user.as_ref().map(|u| u.id);

    Ok(StoresTemplate {
        cards: StoreCard::many(page.stores, &hearts, viewer),
        pagination: Some(Pagination {
            page: page.page,
            pages: page.pages,
            count: page.count,
        }),
        page: PageContext::new("Stores", user, flash),
    }
    .into_response())
}

/// Display the stores the current user has hearted.
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
) -> Result<impl IntoResponse> {
    let service = StoreService::new(state.pool());
    let stores = service.hearted(user.id).await?;
    let hearts: Vec<StoreId> = stores.iter().map(|s| s.id).collect();

    Ok(StoresTemplate {
        cards: StoreCard::many(stores, &hearts, Some(user.id)),
        pagination: None,
        page: PageContext::new("Hearted Stores", Some(user), flash),
    })
}

/// Display the top-rated stores.
pub async fn top(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> Result<impl IntoResponse> {
    let stores = StoreService::new(state.pool()).top().await?;

    Ok(TopTemplate {
        page: PageContext::new("★ Top Stores!", user, flash),
        stores: TopStoreView::ranked(stores),
    })
}

/// Display the map page.
pub async fn map(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    flash: Flash,
) -> impl IntoResponse {
    MapTemplate {
        page: PageContext::new("Map", user, flash),
        map_key: state.config().map_key.clone(),
    }
}

// =============================================================================
// Detail Route
// =============================================================================

/// Display one store with its reviews.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    flash: Flash,
) -> Result<impl IntoResponse> {
    let service = StoreService::new(state.pool());
    let store = service.get_by_slug(&slug).await?;

    let now = Utc::now();
    let reviews = ReviewService::new(state.pool())
        .for_store(store.id)
        .await?
        .into_iter()
        .map(|r| ReviewView {
            gravatar: gravatar_url(&r.author_email, REVIEW_AVATAR_SIZE),
            author_name: r.author_name,
            text: r.review.text,
            rating: r.review.rating.get(),
            posted: filters::relative_age(r.review.created_at, now),
        })
        .collect();

    let hearts = viewer_hearts(&service, user.as_ref()).await?;
    let static_map = state
        .config()
        .map_key
        .as_deref()
        .map(|key| static_map_url(&store, key));

    Ok(StoreTemplate {
        photo: photo_url(store.photo.as_deref()),
        hearted: hearts.contains(&store.id),
        editable: user.as_ref().is_some_and(|u| store.is_authored_by(u.id)),
        static_map,
        reviews,
        page: PageContext::new(store.name.clone(), user, flash),
        store,
    })
}

fn static_map_url(store: &Store, key: &str) -> String {
    let (lat, lng) = (store.location.lat(), store.location.lng());
    format!(
        "https://maps.googleapis.com/maps/api/staticmap?center={lat},{lng}&zoom=14&size=800x150&markers={lat},{lng}&scale=2&key={}",
        urlencoding::encode(key)
    )
}

// =============================================================================
// Write Routes
// =============================================================================

/// Display the empty store form.
pub async fn add_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
) -> impl IntoResponse {
    EditStoreTemplate {
        page: PageContext::new("Add Store", Some(user), flash),
        action: "/add".to_string(),
        choices: tag_choices(&[]),
        form: StoreForm::default(),
        current_photo: None,
        map_key: state.config().map_key.clone(),
    }
}

/// Display the edit form. Only the author may see it.
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    flash: Flash,
) -> Result<impl IntoResponse> {
    let store = StoreService::new(state.pool())
        .get_for_edit(user.id, StoreId::new(id))
        .await?;

    Ok(EditStoreTemplate {
        page: PageContext::new(format!("Edit {}", store.name), Some(user), flash),
        action: format!("/add/{}", store.id),
        choices: tag_choices(&store.tags),
        form: StoreForm::from_store(&store),
        current_photo: store.photo.as_deref().map(|p| photo_url(Some(p))),
        map_key: state.config().map_key.clone(),
    })
}

/// Create a store from the submitted form.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let form = StoreForm::from_multipart(multipart).await?;

    let draft = match prepare_draft(&state, &form).await {
        Ok(draft) => draft,
        Err(message) => {
            return Ok(form_error(
                &state,
                user,
                "Add Store",
                "/add".to_string(),
                form,
                None,
                message,
            ));
        }
    };

    let store = match StoreService::new(state.pool()).create(user.id, &draft).await {
        Ok(store) => store,
        Err(e) => {
            discard_upload(&state, &draft).await;
            return Err(e.into());
        }
    };

    Ok(redirect_with(
        &session,
        &format!("/store/{}", store.slug),
        FlashKind::Success,
        &format!("Successfully Created {}. Care to leave a review?", store.name),
    )
    .await
    .into_response())
}

/// Update a store from the submitted form. Only the author may do this.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let id = StoreId::new(id);
    let service = StoreService::new(state.pool());

    // Ownership is checked before the photo is written to disk.
    let current = service.get_for_edit(user.id, id).await?;
    let form = StoreForm::from_multipart(multipart).await?;

    let draft = match prepare_draft(&state, &form).await {
        Ok(draft) => draft,
        Err(message) => {
            let current_photo = current.photo.as_deref().map(|p| photo_url(Some(p)));
            return Ok(form_error(
                &state,
                user,
                &format!("Edit {}", current.name),
                format!("/add/{id}"),
                form,
                current_photo,
                message,
            ));
        }
    };

    let store = match service.update(user.id, id, &draft).await {
        Ok(store) => store,
        Err(e) => {
            discard_upload(&state, &draft).await;
            return Err(e.into());
        }
    };

    Ok(redirect_with(
        &session,
        &format!("/stores/{}/edit", store.id),
        FlashKind::Success,
        &format!("Successfully updated {}.", store.name),
    )
    .await
    .into_response())
}

/// Remove a freshly uploaded photo whose listing was never saved.
async fn discard_upload(state: &AppState, draft: &StoreDraft) {
    if let Some(photo) = &draft.photo {
        state.photos().discard(photo).await;
    }
}

/// Validate the form and store its photo. Errors come back as a user message.
async fn prepare_draft(state: &AppState, form: &StoreForm) -> std::result::Result<StoreDraft, String> {
    let draft = form.draft().map_err(|e| e.to_string())?;

    let photo = match &form.photo {
        Some(upload) => state
            .photos()
            .save(upload.content_type.as_deref(), &upload.bytes)
            .await
            .map_err(|e| match e {
                PhotoError::NotAnImage(_) => e.to_string(),
                PhotoError::Io(err) => {
                    tracing::error!(error = %err, "Failed to store photo");
                    "Sorry, the photo could not be saved.".to_string()
                }
            })?,
        None => None,
    };

    Ok(draft.with_photo(photo))
}

fn form_error(
    state: &AppState,
    user: CurrentUser,
    title: &str,
    action: String,
    form: StoreForm,
    current_photo: Option<String>,
    message: String,
) -> Response {
    let template = EditStoreTemplate {
        page: PageContext::new(title, Some(user), Flash::error(message)),
        action,
        choices: tag_choices(&form.tags),
        form: StoreForm { photo: None, ..form },
        current_photo,
        map_key: state.config().map_key.clone(),
    };
    (StatusCode::BAD_REQUEST, template).into_response()
}

async fn viewer_hearts(
    service: &StoreService<'_>,
    user: Option<&CurrentUser>,
) -> Result<Vec<StoreId>> {
    match user {
        Some(user) => Ok(service.heart_ids(user.id).await?),
        None => Ok(Vec::new()),
    }
}

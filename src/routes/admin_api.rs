use chrono::{NaiveDate, NaiveDateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::content::block::ContentBlock;
use crate::content::editor::{BlockListEditor, BlogPostDraft, EditorCommand};
use crate::content::markup::Selection;
use crate::content::{reading_time, render};
use crate::dashboard::range::{self, DatePreset, DateRange};
use crate::dashboard::search::{SearchHit, SearchIndex, ViewCommand, ViewState};
use crate::dashboard::unread::{self, RecentItem, TabBadge, UnreadCounts};
use crate::dashboard::{Overview, Snapshot, Tab};
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::comment::Comment;
use crate::models::consultation::Consultation;
use crate::models::contact::Contact;
use crate::models::cta_inquiry::CtaInquiry;
use crate::models::parse_timestamp;
use crate::models::post::BlogPost;
use crate::models::settings::Setting;
use crate::models::subscriber::Subscriber;
use crate::models::LeadStatus;
use crate::uploads::{self, UploadConfig, UploadRequest};

// ── Record collections ─────────────────────────────────

#[get("/contacts")]
pub fn contacts(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<Contact>> {
    Json(Contact::list(pool))
}

#[get("/consultations")]
pub fn consultations(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<Consultation>> {
    Json(Consultation::list(pool))
}

#[get("/cta-inquiries")]
pub fn cta_inquiries(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<CtaInquiry>> {
    Json(CtaInquiry::list(pool))
}

#[get("/comments")]
pub fn comments(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<Comment>> {
    Json(Comment::list(pool))
}

#[get("/subscribers")]
pub fn subscribers(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<Subscriber>> {
    Json(Subscriber::list(pool))
}

// ── Mark read / status ─────────────────────────────────

/// Body of the collection `PUT` routes. Records can only be marked read.
#[derive(Debug, Deserialize)]
pub struct RecordUpdate {
    pub id: i64,
    pub is_read: Option<bool>,
    pub status: Option<String>,
}

impl RecordUpdate {
    fn wants_read(&self) -> ApiResult<bool> {
        match self.is_read {
            Some(false) => Err(ApiError::bad_request("Records cannot be marked unread")),
            Some(true) => Ok(true),
            None => Ok(false),
        }
    }

    fn status(&self) -> ApiResult<Option<LeadStatus>> {
        self.status
            .as_deref()
            .map(|s| s.parse::<LeadStatus>().map_err(ApiError::BadRequest))
            .transpose()
    }

    fn reject_status(&self) -> ApiResult<()> {
        match self.status {
            Some(_) => Err(ApiError::bad_request("This record type has no status")),
            None => Ok(()),
        }
    }
}

fn found(changed: bool, what: &'static str) -> ApiResult<()> {
    if changed {
        Ok(())
    } else {
        Err(ApiError::NotFound(what))
    }
}

#[put("/contacts", format = "json", data = "<update>")]
pub fn contact_update(_admin: AdminUser, pool: &State<DbPool>, update: Json<RecordUpdate>) -> ApiResult<Json<Contact>> {
    update.reject_status()?;
    if update.wants_read()? {
        found(Contact::mark_read(pool, update.id)?, "Contact")?;
    }
    Contact::find_by_id(pool, update.id)
        .map(Json)
        .ok_or(ApiError::NotFound("Contact"))
}

#[put("/comments", format = "json", data = "<update>")]
pub fn comment_update(_admin: AdminUser, pool: &State<DbPool>, update: Json<RecordUpdate>) -> ApiResult<Json<Comment>> {
    update.reject_status()?;
    if update.wants_read()? {
        found(Comment::mark_read(pool, update.id)?, "Comment")?;
    }
    Comment::find_by_id(pool, update.id)
        .map(Json)
        .ok_or(ApiError::NotFound("Comment"))
}

#[put("/consultations", format = "json", data = "<update>")]
pub fn consultation_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    update: Json<RecordUpdate>,
) -> ApiResult<Json<Consultation>> {
    let status = update.status()?;
    if update.wants_read()? {
        found(Consultation::mark_read(pool, update.id)?, "Consultation")?;
    }
    if let Some(status) = status {
        found(Consultation::update_status(pool, update.id, status)?, "Consultation")?;
    }
    Consultation::find_by_id(pool, update.id)
        .map(Json)
        .ok_or(ApiError::NotFound("Consultation"))
}

#[put("/cta-inquiries", format = "json", data = "<update>")]
pub fn cta_inquiry_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    update: Json<RecordUpdate>,
) -> ApiResult<Json<CtaInquiry>> {
    let status = update.status()?;
    if update.wants_read()? {
        found(CtaInquiry::mark_read(pool, update.id)?, "Inquiry")?;
    }
    if let Some(status) = status {
        found(CtaInquiry::update_status(pool, update.id, status)?, "Inquiry")?;
    }
    CtaInquiry::find_by_id(pool, update.id)
        .map(Json)
        .ok_or(ApiError::NotFound("Inquiry"))
}

#[delete("/<collection>/<id>")]
pub fn record_delete(_admin: AdminUser, pool: &State<DbPool>, collection: &str, id: i64) -> ApiResult<Json<Value>> {
    let (deleted, what) = match Tab::parse(collection) {
        Some(Tab::Contacts) => (Contact::delete(pool, id)?, "Contact"),
        Some(Tab::Consultations) => (Consultation::delete(pool, id)?, "Consultation"),
        Some(Tab::CtaInquiries) => (CtaInquiry::delete(pool, id)?, "Inquiry"),
        Some(Tab::Comments) => (Comment::delete(pool, id)?, "Comment"),
        Some(Tab::Subscribers) => (Subscriber::delete(pool, id)?, "Subscriber"),
        Some(Tab::Blogs) => (BlogPost::delete(pool, id)?, "Blog post"),
        Some(Tab::Overview) | None => return Err(ApiError::NotFound("Collection")),
    };
    found(deleted, what)?;
    log::info!("Deleted {} {}", collection, id);
    Ok(Json(json!({ "success": true })))
}

// ── Dashboard ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub preset: DatePreset,
    #[serde(flatten)]
    pub overview: Overview,
}

/// Resolve the requested range. `from`/`to` without a preset imply `custom`.
fn resolve_range(
    preset: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    now: NaiveDateTime,
    history_start: NaiveDate,
) -> ApiResult<(DatePreset, DateRange)> {
    let preset = match preset {
        Some(p) => p.parse::<DatePreset>().map_err(ApiError::BadRequest)?,
        None if from.is_some() || to.is_some() => DatePreset::Custom,
        None => DatePreset::default(),
    };

    if let Some(range) = range::preset_to_range(preset, now, history_start) {
        return Ok((preset, range));
    }

    let (Some(from), Some(to)) = (from, to) else {
        return Err(ApiError::bad_request("Custom ranges need both 'from' and 'to'"));
    };
    let day = |s: &str| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok();
    if let (Some(from), Some(to)) = (day(from), day(to)) {
        return Ok((preset, range::custom_range(from, to, now)));
    }
    match (parse_timestamp(from), parse_timestamp(to)) {
        (Some(from), Some(to)) => Ok((preset, range::exact_range(from, to, now))),
        _ => Err(ApiError::bad_request("Invalid 'from' or 'to' date")),
    }
}

#[get("/dashboard?<preset>&<from>&<to>")]
pub fn dashboard(
    _admin: AdminUser,
    pool: &State<DbPool>,
    preset: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> ApiResult<Json<DashboardResponse>> {
    let snapshot = Snapshot::load(pool);
    let history_start = snapshot.history_start(Setting::history_start(pool));
    let now = Utc::now().naive_utc();
    let (preset, range) = resolve_range(preset, from, to, now, history_start)?;
    Ok(Json(DashboardResponse {
        preset,
        overview: Overview::build(&snapshot, range),
    }))
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub unread: UnreadCounts,
    pub badges: Vec<TabBadge>,
    pub items: Vec<RecentItem>,
}

#[get("/dashboard/notifications")]
pub fn notifications(_admin: AdminUser, pool: &State<DbPool>) -> Json<NotificationsResponse> {
    let snapshot = Snapshot::load(pool);
    let counts = unread::unread_counts(&snapshot);
    Json(NotificationsResponse {
        unread: counts,
        badges: unread::tab_badges(&counts),
        items: unread::notifications(&snapshot),
    })
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

#[get("/dashboard/search?<q>")]
pub fn search(_admin: AdminUser, pool: &State<DbPool>, q: Option<&str>) -> Json<SearchResponse> {
    let query = q.unwrap_or("").to_string();
    let index = SearchIndex::build(&Snapshot::load(pool));
    let results = index.search(&query).into_iter().map(SearchHit::new).collect();
    Json(SearchResponse { query, results })
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub state: ViewState,
    pub command: ViewCommand,
}

/// Dashboard navigation: tab switches and record expansion.
#[post("/dashboard/view", format = "json", data = "<req>")]
pub fn dashboard_view(_admin: AdminUser, req: Json<ViewRequest>) -> Json<ViewState> {
    let ViewRequest { mut state, command } = req.into_inner();
    state.apply(command);
    Json(state)
}

// ── Blog posts ─────────────────────────────────────────

#[get("/blogs")]
pub fn blogs(_admin: AdminUser, pool: &State<DbPool>) -> Json<Vec<BlogPost>> {
    Json(BlogPost::list(pool))
}

#[get("/blogs/<id>")]
pub fn blog_get(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> ApiResult<Json<BlogPost>> {
    BlogPost::find_by_id(pool, id)
        .map(Json)
        .ok_or(ApiError::NotFound("Blog post"))
}

#[post("/blogs", format = "json", data = "<draft>")]
pub fn blog_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    draft: Json<BlogPostDraft>,
) -> ApiResult<(Status, Json<BlogPost>)> {
    let mut draft = draft.into_inner();
    draft.prepare().map_err(ApiError::BadRequest)?;
    let id = BlogPost::create(pool, &draft)?;
    log::info!("Created blog post {} ({})", id, draft.slug);
    let post = BlogPost::find_by_id(pool, id).ok_or(ApiError::NotFound("Blog post"))?;
    Ok((Status::Created, Json(post)))
}

#[put("/blogs/<id>", format = "json", data = "<draft>")]
pub fn blog_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    draft: Json<BlogPostDraft>,
) -> ApiResult<Json<BlogPost>> {
    let mut draft = draft.into_inner();
    draft.prepare().map_err(ApiError::BadRequest)?;
    found(BlogPost::update(pool, id, &draft)?, "Blog post")?;
    BlogPost::find_by_id(pool, id)
        .map(Json)
        .ok_or(ApiError::NotFound("Blog post"))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub html: String,
    pub read_time: String,
}

#[post("/blogs/preview", format = "json", data = "<req>")]
pub fn blog_preview(_admin: AdminUser, req: Json<PreviewRequest>) -> Json<PreviewResponse> {
    let editor = BlockListEditor::from_blocks(req.into_inner().content);
    Json(PreviewResponse {
        html: render::preview_html(editor.blocks()),
        read_time: reading_time(editor.blocks()),
    })
}

#[derive(Debug, Deserialize)]
pub struct BlockEditRequest {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub expanded: Option<usize>,
    pub command: EditorCommand,
}

#[derive(Debug, Serialize)]
pub struct BlockEditResponse {
    pub applied: bool,
    pub content: Vec<ContentBlock>,
    pub expanded: Option<usize>,
    /// Set after a highlight toggle so the client can restore the selection.
    pub selection: Option<Selection>,
    pub preview: String,
}

/// Apply one editor command server-side and return the new block list.
#[post("/blogs/blocks", format = "json", data = "<req>")]
pub fn blog_blocks(_admin: AdminUser, req: Json<BlockEditRequest>) -> Json<BlockEditResponse> {
    let req = req.into_inner();
    let mut editor = BlockListEditor::from_blocks(req.content).with_expanded(req.expanded);
    let applied = editor.apply(&req.command);
    let expanded = editor.expanded();
    let selection = editor.selection();
    let preview = render::preview_html(editor.blocks());
    Json(BlockEditResponse {
        applied,
        content: editor.into_blocks(),
        expanded,
        selection,
        preview,
    })
}

// ── Uploads ────────────────────────────────────────────

#[post("/upload", format = "json", data = "<req>")]
pub fn upload(_admin: AdminUser, pool: &State<DbPool>, req: Json<UploadRequest>) -> ApiResult<Json<Value>> {
    let url = uploads::save_upload(&UploadConfig::from_settings(pool), &req)?;
    Ok(Json(json!({ "url": url })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        contacts,
        consultations,
        cta_inquiries,
        comments,
        subscribers,
        contact_update,
        comment_update,
        consultation_update,
        cta_inquiry_update,
        record_delete,
        dashboard,
        notifications,
        search,
        dashboard_view,
        blogs,
        blog_get,
        blog_create,
        blog_update,
        blog_preview,
        blog_blocks,
        upload,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn defaults_to_this_month() {
        let (preset, range) = resolve_range(None, None, None, now(), start()).unwrap();
        assert_eq!(preset, DatePreset::ThisMonth);
        assert_eq!(range.from.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn dates_without_preset_are_custom() {
        let (preset, range) =
            resolve_range(None, Some("2024-02-01"), Some("2024-02-03"), now(), start()).unwrap();
        assert_eq!(preset, DatePreset::Custom);
        assert_eq!(range.span_days(), 3);
    }

    #[test]
    fn exact_instants_are_honoured() {
        let (_, range) = resolve_range(
            Some("custom"),
            Some("2024-02-01T08:00:00"),
            Some("2024-02-01T12:00:00"),
            now(),
            start(),
        )
        .unwrap();
        assert_eq!(range.from.format("%H:%M").to_string(), "08:00");
        assert_eq!(range.to.format("%H:%M").to_string(), "12:00");
    }

    #[test]
    fn equal_instants_cover_the_whole_day() {
        let (_, range) = resolve_range(
            Some("custom"),
            Some("2024-02-01T00:00:00"),
            Some("2024-02-01T00:00:00"),
            now(),
            start(),
        )
        .unwrap();
        assert_eq!(range.from.format("%F %T").to_string(), "2024-02-01 00:00:00");
        assert_eq!(range.to.format("%F %T%.3f").to_string(), "2024-02-01 23:59:59.999");
    }

    #[test]
    fn far_out_dates_are_clamped() {
        let (_, range) =
            resolve_range(None, Some("2024-01-01"), Some("+262142-12-31"), now(), start()).unwrap();
        assert_eq!(range.to, now());

        let (_, range) =
            resolve_range(None, Some("0001-01-01"), Some("2024-01-31"), now(), start()).unwrap();
        assert_eq!(range.from.date(), NaiveDate::from_ymd_opt(1924, 3, 10).unwrap());
        assert!(range.span_days() <= 100 * 366);
    }

    #[test]
    fn bad_range_input_is_rejected() {
        assert!(resolve_range(Some("custom"), Some("2024-02-01"), None, now(), start()).is_err());
        assert!(resolve_range(Some("fortnight"), None, None, now(), start()).is_err());
        assert!(resolve_range(None, Some("soon"), Some("later"), now(), start()).is_err());
    }
}
